//! The visibility and pin resolution pipeline.
//!
//! Takes one folder's children in the host's native order and applies the
//! configured rules in a fixed sequence of stages:
//!
//! 1. reset transient flags,
//! 2. hide rules (if the hide bundle is active),
//! 3. workspace restriction (if a workspace group is active),
//! 4. pin partition (if the pin bundle is active; otherwise everything is unpinned),
//! 5. focus mode (if active).
//!
//! Each stage only sees the survivors of the previous one. Hide runs before
//! pin, so an entry matched by both is hidden. Partitioning is stable, and the
//! whole pass is a pure function of the entries, the configuration and the lookup.

use crate::config::{ExplorerConfig, FocusMode};
use crate::core::paths::{self, is_same_or_descendant};
use crate::core::workspace::MatcherCache;
use crate::core::{Entry, EntryKind, PathLookup};
use std::collections::HashSet;

/// Transient per-entry flags produced by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFlags {
    pub hidden: bool,
    pub pinned: bool,
}

/// The stage that removed an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenBy {
    HideRule,
    Workspace,
    Focus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub entry: &'a Entry,
    pub flags: EntryFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HiddenEntry<'a> {
    pub entry: &'a Entry,
    pub reason: HiddenBy,
}

/// The outcome of resolving one folder's children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution<'a> {
    /// Surviving entries: the pinned block first, then the rest.
    pub visible: Vec<Resolved<'a>>,
    /// Removed entries in the order they were removed.
    pub hidden: Vec<HiddenEntry<'a>>,
    pub pinned_count: usize,
}

impl<'a> Resolution<'a> {
    pub fn visible_paths(&self) -> Vec<&'a str> {
        self.visible.iter().map(|r| r.entry.path.as_str()).collect()
    }

    pub fn visible_entries(&self) -> Vec<&'a Entry> {
        self.visible.iter().map(|r| r.entry).collect()
    }

    pub fn hidden_paths(&self) -> Vec<&'a str> {
        self.hidden.iter().map(|h| h.entry.path.as_str()).collect()
    }

    pub fn is_pinned(&self, path: &str) -> bool {
        self.visible
            .iter()
            .any(|r| r.flags.pinned && r.entry.path == path)
    }

    pub fn is_hidden(&self, path: &str) -> bool {
        self.hidden.iter().any(|h| h.entry.path == path)
    }

    /// Flags for `path`, or `None` if it was not part of the input.
    pub fn flags_of(&self, path: &str) -> Option<EntryFlags> {
        if let Some(resolved) = self.visible.iter().find(|r| r.entry.path == path) {
            return Some(resolved.flags);
        }
        self.hidden
            .iter()
            .any(|h| h.entry.path == path)
            .then_some(EntryFlags {
                hidden: true,
                pinned: false,
            })
    }
}

/// Resolves `entries` (already in native order) against `config`.
///
/// `lookup` classifies workspace members and focus paths; `cache` keeps the
/// workspace matcher between passes.
pub fn resolve<'a>(
    entries: &'a [Entry],
    config: &ExplorerConfig,
    lookup: &dyn PathLookup,
    cache: &mut MatcherCache,
) -> Resolution<'a> {
    // Stage 1: every pass starts from cleared flags.
    let mut working: Vec<Resolved<'a>> = entries
        .iter()
        .map(|entry| Resolved {
            entry,
            flags: EntryFlags::default(),
        })
        .collect();
    let mut hidden: Vec<HiddenEntry<'a>> = Vec::new();

    // Stage 2: hide rules.
    if config.hide_filters.active {
        let matcher = config.hide_filters.matcher();
        if !matcher.is_empty() {
            working = remove_where(working, &mut hidden, HiddenBy::HideRule, |entry| {
                matcher.is_activated(entry)
            });
        }
    }

    // Stage 3: workspace restriction.
    if let Some(group) = config.active_workspace() {
        let matcher = cache.matcher_for(group, lookup);
        working = remove_where(working, &mut hidden, HiddenBy::Workspace, |entry| {
            !matcher.is_visible(&entry.path)
        });
    }

    // Stage 4: pin partition.
    let mut pinned_count = 0;
    if config.pin_filters.active {
        let matcher = config.pin_filters.matcher();
        let (mut pinned, unpinned): (Vec<_>, Vec<_>) = working
            .into_iter()
            .map(|mut resolved| {
                resolved.flags.pinned = matcher.is_activated(resolved.entry);
                resolved
            })
            .partition(|resolved| resolved.flags.pinned);
        pinned_count = pinned.len();
        pinned.extend(unpinned);
        working = pinned;
    } else {
        for resolved in &mut working {
            resolved.flags.pinned = false;
        }
    }

    // Stage 5: focus mode.
    if config.focus_mode.active {
        let focus = FocusMatcher::new(&config.focus_mode, lookup);
        if focus.is_empty() {
            tracing::debug!("Focus mode is active without focused paths; nothing to restrict");
        } else {
            working = remove_where(working, &mut hidden, HiddenBy::Focus, |entry| {
                !focus.is_visible(&entry.path)
            });
            pinned_count = working.iter().filter(|r| r.flags.pinned).count();
        }
    }

    tracing::debug!(
        "Resolved {} entries: {} visible ({} pinned), {} hidden",
        entries.len(),
        working.len(),
        pinned_count,
        hidden.len()
    );

    Resolution {
        visible: working,
        hidden,
        pinned_count,
    }
}

/// Splits off every entry matching `should_remove`, flagging it hidden, and
/// returns the survivors in their original order.
fn remove_where<'a, F>(
    working: Vec<Resolved<'a>>,
    hidden: &mut Vec<HiddenEntry<'a>>,
    reason: HiddenBy,
    should_remove: F,
) -> Vec<Resolved<'a>>
where
    F: Fn(&Entry) -> bool,
{
    let mut survivors = Vec::with_capacity(working.len());
    for mut resolved in working {
        if should_remove(resolved.entry) {
            resolved.flags.hidden = true;
            hidden.push(HiddenEntry {
                entry: resolved.entry,
                reason,
            });
        } else {
            resolved.flags.hidden = false;
            survivors.push(resolved);
        }
    }
    survivors
}

/// Decides visibility under focus mode.
///
/// A focused folder (stored with a trailing `/`, or known to the lookup as a
/// folder) reveals itself and all descendants; a focused file only itself.
#[derive(Debug, Default)]
pub struct FocusMatcher {
    files: HashSet<String>,
    folders: Vec<String>,
}

impl FocusMatcher {
    pub fn new(focus: &FocusMode, lookup: &dyn PathLookup) -> Self {
        let mut matcher = Self::default();
        for raw in &focus.focused_paths {
            let marked_folder = raw.trim().ends_with(paths::SEPARATOR);
            let path = paths::normalize(raw);
            if path.is_empty() {
                continue;
            }

            if marked_folder || lookup.kind_of(&path) == Some(EntryKind::Folder) {
                if !matcher.folders.contains(&path) {
                    matcher.folders.push(path);
                }
            } else {
                matcher.files.insert(path);
            }
        }
        matcher
    }

    pub fn is_visible(&self, path: &str) -> bool {
        self.files.contains(path)
            || self
                .folders
                .iter()
                .any(|folder| is_same_or_descendant(path, folder))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::{PathRule, TagRule, TargetType};
    use crate::core::workspace::WorkspaceGroup;
    use crate::core::{EntryIndex, PatternType};
    use tracing_test::traced_test;

    /// A config with no rules, no focus and no active workspace.
    fn create_test_config() -> ExplorerConfig {
        let mut config = ExplorerConfig::default();
        config.pin_filters.paths.clear();
        config.pin_filters.tags.clear();
        config.pin_filters.front_matter.clear();
        config.hide_filters = config.pin_filters.clone();
        config
    }

    fn files(paths: &[&str]) -> Vec<Entry> {
        paths.iter().map(|p| Entry::file(*p)).collect()
    }

    fn run<'a>(entries: &'a [Entry], config: &ExplorerConfig) -> Resolution<'a> {
        let index = EntryIndex::new(entries);
        resolve(entries, config, &index, &mut MatcherCache::new())
    }

    #[test]
    #[traced_test]
    fn test_no_rules_keeps_native_order() {
        let entries = files(&["a.md", "b.md", "c.md"]);
        let resolution = run(&entries, &create_test_config());
        assert_eq!(resolution.visible_paths(), vec!["a.md", "b.md", "c.md"]);
        assert_eq!(resolution.pinned_count, 0);
        assert!(resolution.hidden.is_empty());
    }

    #[test]
    fn test_hand_entered_folder_rule_with_trailing_slash_hides_folder() {
        let mut config = create_test_config();
        config.hide_filters.paths.push(PathRule::new(
            "archive/",
            PatternType::Strict,
            TargetType::Directories,
        ));
        let entries = vec![Entry::folder("archive"), Entry::file("a.md")];

        let resolution = run(&entries, &config);
        assert_eq!(resolution.visible_paths(), vec!["a.md"]);
        assert_eq!(resolution.hidden_paths(), vec!["archive"]);
    }

    #[test]
    fn test_wildcard_pin_moves_match_to_front() {
        let mut config = create_test_config();
        config.pin_filters.paths.push(PathRule::new(
            "*.important.md",
            PatternType::Wildcard,
            TargetType::FilesAndDirectories,
        ));
        config.hide_filters.active = false;

        let entries = files(&["a.md", "x.important.md", "z.md"]);
        let resolution = run(&entries, &config);

        assert_eq!(resolution.visible_paths(), vec!["x.important.md", "a.md", "z.md"]);
        assert!(resolution.is_pinned("x.important.md"));
        assert!(!resolution.is_pinned("a.md"));
        assert_eq!(resolution.pinned_count, 1);
    }

    #[test]
    fn test_pin_partition_is_stable() {
        let mut config = create_test_config();
        config
            .pin_filters
            .tags
            .push(TagRule::new("star", PatternType::Strict));

        let entries = vec![
            Entry::file("a.md"),
            Entry::file("b.md").with_tags(["star"]),
            Entry::file("c.md"),
            Entry::file("d.md").with_tags(["star"]),
            Entry::file("e.md"),
        ];
        let resolution = run(&entries, &config);
        assert_eq!(
            resolution.visible_paths(),
            vec!["b.md", "d.md", "a.md", "c.md", "e.md"]
        );
        assert_eq!(resolution.pinned_count, 2);
    }

    #[test]
    fn test_hide_rule_removes_and_flags() {
        let mut config = create_test_config();
        config.hide_filters.paths.push(PathRule::new(
            "^archive",
            PatternType::Regex,
            TargetType::FilesAndDirectories,
        ));

        let entries = vec![Entry::folder("archive"), Entry::file("notes.md")];
        let resolution = run(&entries, &config);

        assert_eq!(resolution.visible_paths(), vec!["notes.md"]);
        assert_eq!(resolution.hidden_paths(), vec!["archive"]);
        assert_eq!(resolution.hidden[0].reason, HiddenBy::HideRule);
        assert_eq!(
            resolution.flags_of("archive"),
            Some(EntryFlags { hidden: true, pinned: false })
        );
    }

    #[test]
    fn test_inactive_hide_bundle_hides_nothing() {
        let mut config = create_test_config();
        config
            .hide_filters
            .paths
            .push(PathRule::new("*", PatternType::Wildcard, TargetType::FilesAndDirectories));
        config.hide_filters.active = false;

        let entries = files(&["a.md", "b.md"]);
        assert_eq!(run(&entries, &config).visible.len(), 2);
    }

    #[test]
    fn test_hide_wins_over_pin() {
        let mut config = create_test_config();
        let rule = PathRule::new("both.md", PatternType::Strict, TargetType::Files);
        config.pin_filters.paths.push(rule.clone());
        config.hide_filters.paths.push(rule);

        let entries = files(&["a.md", "both.md"]);
        let resolution = run(&entries, &config);
        assert_eq!(resolution.visible_paths(), vec!["a.md"]);
        assert!(resolution.is_hidden("both.md"));
        assert_eq!(resolution.pinned_count, 0);
    }

    #[test]
    fn test_inactive_pin_bundle_unpins_everything() {
        let mut config = create_test_config();
        config
            .pin_filters
            .paths
            .push(PathRule::new("b.md", PatternType::Strict, TargetType::Files));
        config.pin_filters.active = false;

        let entries = files(&["a.md", "b.md"]);
        let resolution = run(&entries, &config);
        assert_eq!(resolution.visible_paths(), vec!["a.md", "b.md"]);
        assert!(resolution.visible.iter().all(|r| !r.flags.pinned));
    }

    #[test]
    fn test_workspace_restricts_to_members_and_ancestors() {
        let mut config = create_test_config();
        config.workspace_focus.groups[0] =
            WorkspaceGroup::new("workspace-1", "!", "W").with_members(["a/b/c.md"]);
        config.workspace_focus.active_group_id = Some("workspace-1".into());

        let all = vec![
            Entry::folder("a"),
            Entry::folder("a/b"),
            Entry::file("a/b/c.md"),
            Entry::file("a/b/d.md"),
            Entry::folder("x"),
        ];
        let index = EntryIndex::new(&all);
        let mut cache = MatcherCache::new();

        let root = vec![all[0].clone(), all[4].clone()];
        let resolution = resolve(&root, &config, &index, &mut cache);
        assert_eq!(resolution.visible_paths(), vec!["a"]);
        assert_eq!(resolution.hidden[0].reason, HiddenBy::Workspace);

        let inner = vec![all[2].clone(), all[3].clone()];
        let resolution = resolve(&inner, &config, &index, &mut cache);
        assert_eq!(resolution.visible_paths(), vec!["a/b/c.md"]);
    }

    #[test]
    fn test_empty_active_workspace_hides_everything() {
        let mut config = create_test_config();
        config.workspace_focus.active_group_id = Some("workspace-2".into());

        let entries = files(&["a.md", "b.md"]);
        let resolution = run(&entries, &config);
        assert!(resolution.visible.is_empty());
        assert_eq!(resolution.hidden.len(), 2);
    }

    #[test]
    fn test_dangling_active_workspace_restricts_nothing() {
        let mut config = create_test_config();
        config.workspace_focus.active_group_id = Some("deleted".into());

        let entries = files(&["a.md"]);
        assert_eq!(run(&entries, &config).visible_paths(), vec!["a.md"]);
    }

    #[test]
    fn test_focus_mode_keeps_focused_subtree() {
        let mut config = create_test_config();
        config.focus_mode.active = true;
        config.focus_mode.focused_paths = vec!["notes/".into()];

        let entries = files(&["notes/a.md", "other/b.md"]);
        let resolution = run(&entries, &config);
        assert_eq!(resolution.visible_paths(), vec!["notes/a.md"]);
        assert_eq!(resolution.hidden[0].reason, HiddenBy::Focus);
    }

    #[test]
    fn test_focus_on_file_matches_only_itself() {
        let mut config = create_test_config();
        config.focus_mode.active = true;
        config.focus_mode.focused_paths = vec!["notes/a.md".into()];

        let entries = vec![
            Entry::folder("notes"),
            Entry::file("notes/a.md"),
            Entry::file("notes/a.md.bak"),
        ];
        let resolution = run(&entries, &config);
        assert_eq!(resolution.visible_paths(), vec!["notes/a.md"]);
    }

    #[test]
    fn test_focus_uses_lookup_for_unmarked_folders() {
        let mut config = create_test_config();
        config.focus_mode.active = true;
        config.focus_mode.focused_paths = vec!["notes".into()];

        let entries = vec![
            Entry::folder("notes"),
            Entry::file("notes/a.md"),
            Entry::file("notes2.md"),
        ];
        let resolution = run(&entries, &config);
        assert_eq!(resolution.visible_paths(), vec!["notes", "notes/a.md"]);
    }

    #[test]
    fn test_focus_recounts_pins_after_filtering() {
        let mut config = create_test_config();
        config
            .pin_filters
            .paths
            .push(PathRule::new("*", PatternType::Wildcard, TargetType::Files));
        config.focus_mode.active = true;
        config.focus_mode.focused_paths = vec!["keep.md".into()];

        let entries = files(&["drop.md", "keep.md"]);
        let resolution = run(&entries, &config);
        assert_eq!(resolution.visible_paths(), vec!["keep.md"]);
        assert_eq!(resolution.pinned_count, 1);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mut config = create_test_config();
        config
            .pin_filters
            .tags
            .push(TagRule::new("p", PatternType::Strict));
        let entries = vec![
            Entry::file("a").with_tags(["p"]),
            Entry::file("b"),
            Entry::file("c").with_tags(["p"]),
        ];
        let first = run(&entries, &config);
        let second = run(&entries, &config);
        assert_eq!(first, second);
    }
}
