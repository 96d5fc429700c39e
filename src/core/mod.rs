pub mod error;
pub mod paths;
pub mod pattern;
pub mod rules;
pub mod scanner;
pub mod workspace;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// Discriminates leaves from containers in the file hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// A node in the host's file hierarchy, as seen by one resolution pass.
///
/// `tags` and `front_matter` are pre-computed by the host; the engine never
/// reads storage while resolving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique, `/`-segmented, no leading or trailing separator.
    pub path: String,
    pub kind: EntryKind,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub front_matter: Map<String, Value>,
}

impl Entry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            tags: BTreeSet::new(),
            front_matter: Map::new(),
        }
    }

    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Folder,
            tags: BTreeSet::new(),
            front_matter: Map::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_front_matter(mut self, front_matter: Value) -> Self {
        if let Value::Object(map) = front_matter {
            self.front_matter = map;
        }
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// Resolves a dotted key path (`"project.status"`) against the front matter.
    ///
    /// A literal top-level key containing dots wins over nested traversal.
    pub fn front_matter_value(&self, key_path: &str) -> Option<&Value> {
        let key_path = key_path.trim();
        if key_path.is_empty() {
            return None;
        }
        if let Some(value) = self.front_matter.get(key_path) {
            return Some(value);
        }

        let mut segments = key_path.split('.');
        let mut current = self.front_matter.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// Existence and type lookup by path, supplied by the host tree.
pub trait PathLookup {
    fn kind_of(&self, path: &str) -> Option<EntryKind>;
}

impl<F> PathLookup for F
where
    F: Fn(&str) -> Option<EntryKind>,
{
    fn kind_of(&self, path: &str) -> Option<EntryKind> {
        self(path)
    }
}

/// A `PathLookup` over an in-memory list of entries.
#[derive(Debug, Clone, Default)]
pub struct EntryIndex {
    kinds: HashMap<String, EntryKind>,
}

impl EntryIndex {
    pub fn new<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        let kinds = entries
            .into_iter()
            .map(|entry| (entry.path.clone(), entry.kind))
            .collect();
        Self { kinds }
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl PathLookup for EntryIndex {
    fn kind_of(&self, path: &str) -> Option<EntryKind> {
        self.kinds.get(path).copied()
    }
}

pub use error::CoreError;
pub use pattern::{Pattern, PatternType};
pub use rules::{
    FilterRule, FrontMatterRule, PathRule, RuleBase, RuleBundle, RuleSetMatcher, TagRule,
    TargetType,
};
pub use scanner::{Vault, VaultScanner};
pub use workspace::{MatcherCache, WorkspaceGroup, WorkspaceMatcher};
