//! Builds the engine's view of a directory on disk.
//!
//! The scanner walks a vault root, turns every file and folder into an
//! [`Entry`] with a `/`-joined relative path, and pre-computes the
//! front matter and tags of Markdown notes so that resolution never has to
//! touch the filesystem.

use super::error::CoreError;
use super::paths;
use super::{Entry, EntryKind, PathLookup};
use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fs;

const NOTE_EXTENSIONS: &[&str] = &["md", "markdown"];
const TAG_KEYS: &[&str] = &["tags", "tag"];

pub struct VaultScanner {
    root: Utf8PathBuf,
}

impl VaultScanner {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Walks the vault root. Dotfiles and dot-folders are skipped; unreadable
    /// entries and non-UTF-8 names are logged and left out.
    pub fn scan(&self) -> Result<Vault, CoreError> {
        if !self.root.is_dir() {
            return Err(CoreError::NotADirectory(self.root.clone().into_std_path_buf()));
        }

        let mut entries = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .follow_links(false)
            .build();

        for result in walker {
            let dent = match result {
                Ok(dent) => dent,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry during scan: {}", e);
                    continue;
                }
            };
            if dent.depth() == 0 {
                continue;
            }

            let Some(abs_path) = Utf8Path::from_path(dent.path()) else {
                tracing::warn!("Skipping non UTF-8 path: {}", dent.path().display());
                continue;
            };
            let Ok(relative) = abs_path.strip_prefix(&self.root) else {
                continue;
            };
            let path = relative
                .components()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join("/");

            let is_dir = dent.file_type().is_some_and(|ft| ft.is_dir());
            let entry = if is_dir {
                Entry::folder(path)
            } else {
                self.load_file_entry(path, abs_path)
            };
            entries.push(entry);
        }

        tracing::info!("Scanned {} entries under {}", entries.len(), self.root);
        Ok(Vault::new(entries))
    }

    fn load_file_entry(&self, path: String, abs_path: &Utf8Path) -> Entry {
        let mut entry = Entry::file(path);
        let is_note = abs_path
            .extension()
            .is_some_and(|ext| NOTE_EXTENSIONS.iter().any(|n| ext.eq_ignore_ascii_case(n)));
        if !is_note {
            return entry;
        }

        match read_front_matter(abs_path) {
            Ok(front_matter) => {
                entry.tags = tags_from_front_matter(&front_matter);
                entry.front_matter = front_matter;
            }
            Err(e) => {
                tracing::warn!("Ignoring front matter of {}: {}", abs_path, e);
            }
        }
        entry
    }
}

/// Reads and parses the YAML front matter block of a note.
pub fn read_front_matter(path: &Utf8Path) -> Result<Map<String, Value>, CoreError> {
    let content = fs::read_to_string(path)
        .map_err(|e| CoreError::Io(e, path.to_path_buf().into_std_path_buf()))?;
    parse_front_matter(&content)
}

/// Parses the front matter of note `content`. A note without a block, or
/// with a block that is not a mapping, has empty front matter.
pub fn parse_front_matter(content: &str) -> Result<Map<String, Value>, CoreError> {
    let Some(block) = extract_front_matter(content) else {
        return Ok(Map::new());
    };
    if block.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_yaml::from_str::<Value>(block)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn extract_front_matter(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "---" || trimmed == "..." {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

/// Collects tags from the `tags`/`tag` keys. Accepts a list or a comma or
/// space separated string; a leading `#` is dropped.
pub fn tags_from_front_matter(front_matter: &Map<String, Value>) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    for key in TAG_KEYS {
        match front_matter.get(*key) {
            Some(Value::String(s)) => {
                tags.extend(s.split([',', ' ']).filter_map(clean_tag));
            }
            Some(Value::Array(items)) => {
                tags.extend(items.iter().filter_map(Value::as_str).filter_map(clean_tag));
            }
            _ => {}
        }
    }
    tags
}

fn clean_tag(raw: &str) -> Option<String> {
    let tag = raw.trim();
    let tag = tag.strip_prefix('#').unwrap_or(tag);
    (!tag.is_empty()).then(|| tag.to_string())
}

/// The scanned entries of a vault, indexed by path.
#[derive(Debug, Clone, Default)]
pub struct Vault {
    entries: Vec<Entry>,
    by_path: HashMap<String, usize>,
}

impl Vault {
    pub fn new(entries: Vec<Entry>) -> Self {
        let by_path = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.path.clone(), idx))
            .collect();
        Self { entries, by_path }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.by_path.get(path).map(|idx| &self.entries[*idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Direct children of `folder` (`""` for the vault root), in native
    /// explorer order: folders first, then case-insensitive name.
    pub fn children_of(&self, folder: &str) -> Vec<Entry> {
        let mut children: Vec<Entry> = self
            .entries
            .iter()
            .filter(|entry| paths::parent(&entry.path).unwrap_or("") == folder)
            .cloned()
            .collect();

        children.sort_by(|a, b| {
            b.is_folder().cmp(&a.is_folder()).then_with(|| {
                let a_name = paths::file_name(&a.path);
                let b_name = paths::file_name(&b.path);
                a_name
                    .to_lowercase()
                    .cmp(&b_name.to_lowercase())
                    .then_with(|| a_name.cmp(b_name))
            })
        });
        children
    }
}

impl PathLookup for Vault {
    fn kind_of(&self, path: &str) -> Option<EntryKind> {
        self.get(path).map(|entry| entry.kind)
    }
}
