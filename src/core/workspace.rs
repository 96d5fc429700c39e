//! Workspace groups and the membership matcher that decides which paths a
//! group reveals.

use super::paths::{self, normalize_all};
use super::{EntryKind, PathLookup};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// A named, persistent inclusion set with a stable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub tooltip: String,
    #[serde(default)]
    pub members: Vec<String>,
    /// Migrated entries that could not be resolved to real paths.
    #[serde(default)]
    pub legacy_bindings: Vec<String>,
}

/// How one member path resolves against the live tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStatus {
    pub path: String,
    /// `None` when the path no longer exists.
    pub kind: Option<EntryKind>,
}

impl MemberStatus {
    pub fn is_missing(&self) -> bool {
        self.kind.is_none()
    }
}

impl WorkspaceGroup {
    pub fn new(id: impl Into<String>, emoji: impl Into<String>, tooltip: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            emoji: emoji.into(),
            tooltip: tooltip.into(),
            members: Vec::new(),
            legacy_bindings: Vec::new(),
        }
    }

    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.members = normalize_all(members);
        self
    }

    /// Re-normalizes and deduplicates members and legacy bindings.
    pub fn normalize(&mut self) {
        self.members = normalize_all(&self.members);
        self.legacy_bindings = normalize_all(&self.legacy_bindings);
    }

    /// Adds paths to the member set, keeping it normalized.
    pub fn add_members<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let added: Vec<String> = paths.into_iter().map(|p| p.as_ref().to_string()).collect();
        self.members = normalize_all(self.members.iter().chain(added.iter()));
    }

    /// Removes members equal (after normalization) to any of `paths`.
    pub fn remove_members<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let removed: HashSet<String> = normalize_all(paths).into_iter().collect();
        self.members = normalize_all(self.members.iter().filter(|m| !removed.contains(m.as_str())));
    }

    /// Classifies each member as file, folder, or missing.
    pub fn member_report(&self, lookup: &dyn PathLookup) -> Vec<MemberStatus> {
        normalize_all(&self.members)
            .into_iter()
            .map(|path| {
                let kind = lookup.kind_of(&path);
                MemberStatus { path, kind }
            })
            .collect()
    }

    /// Promotes legacy bindings that now name an existing path into members.
    ///
    /// Returns how many bindings were promoted.
    pub fn resolve_legacy_bindings(&mut self, lookup: &dyn PathLookup) -> usize {
        let (resolved, unresolved): (Vec<String>, Vec<String>) = normalize_all(&self.legacy_bindings)
            .into_iter()
            .partition(|binding| lookup.kind_of(binding).is_some());

        let promoted = resolved.len();
        if promoted > 0 {
            self.add_members(&resolved);
            tracing::info!(
                "Workspace '{}': promoted {} legacy binding(s) to members",
                self.id,
                promoted
            );
        }
        self.legacy_bindings = unresolved;
        promoted
    }

    /// The text shown on a toolbar shortcut, falling back to the position.
    pub fn display_emoji(&self, position: usize) -> String {
        let emoji = self.emoji.trim();
        if emoji.is_empty() {
            (position + 1).to_string()
        } else {
            emoji.to_string()
        }
    }

    pub fn display_tooltip(&self, position: usize) -> String {
        let tooltip = self.tooltip.trim();
        if tooltip.is_empty() {
            format!("Workspace {}", position + 1)
        } else {
            tooltip.to_string()
        }
    }
}

/// Decides whether a path is visible inside one workspace.
///
/// A path is visible when it is a member, an ancestor folder of a member
/// (so the tree can be navigated down to it), or lies under a folder member.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceMatcher {
    include_files: HashSet<String>,
    include_folders: HashSet<String>,
    ancestor_folders: HashSet<String>,
}

impl WorkspaceMatcher {
    /// Builds the matcher from already normalized member paths. Members the
    /// lookup cannot resolve are dropped and never match.
    pub fn new(members: &[String], lookup: &dyn PathLookup) -> Self {
        let mut matcher = Self::default();

        for member in members {
            match lookup.kind_of(member) {
                Some(EntryKind::File) => {
                    matcher.include_files.insert(member.clone());
                }
                Some(EntryKind::Folder) => {
                    matcher.include_folders.insert(member.clone());
                }
                None => {
                    tracing::debug!("Workspace member '{}' does not resolve; ignoring", member);
                    continue;
                }
            }

            matcher
                .ancestor_folders
                .extend(paths::ancestors(member).map(str::to_string));
        }

        matcher
    }

    pub fn is_visible(&self, path: &str) -> bool {
        if self.include_files.contains(path)
            || self.include_folders.contains(path)
            || self.ancestor_folders.contains(path)
        {
            return true;
        }

        paths::ancestors(path).any(|ancestor| self.include_folders.contains(ancestor))
    }

    /// `true` when no member resolved; such a matcher hides everything.
    pub fn is_empty(&self) -> bool {
        self.include_files.is_empty() && self.include_folders.is_empty()
    }
}

/// Holds the most recently built [`WorkspaceMatcher`], keyed by its member list.
///
/// Any change to the (normalized, ordered) member list rebuilds the matcher;
/// an unchanged list reuses it without consulting the tree again.
#[derive(Debug, Default)]
pub struct MatcherCache {
    entry: Option<(String, Arc<WorkspaceMatcher>)>,
}

impl MatcherCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the matcher for `group`, building it if the member list changed.
    pub fn matcher_for(&mut self, group: &WorkspaceGroup, lookup: &dyn PathLookup) -> Arc<WorkspaceMatcher> {
        let members = normalize_all(&group.members);
        let key = members.join("\n");

        if let Some((cached_key, matcher)) = &self.entry {
            if *cached_key == key {
                return Arc::clone(matcher);
            }
        }

        tracing::debug!(
            "Building workspace matcher for '{}' ({} member(s))",
            group.id,
            members.len()
        );
        let matcher = Arc::new(WorkspaceMatcher::new(&members, lookup));
        self.entry = Some((key, Arc::clone(&matcher)));
        matcher
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_cached(&self, group: &WorkspaceGroup) -> bool {
        let key = normalize_all(&group.members).join("\n");
        matches!(&self.entry, Some((cached_key, _)) if *cached_key == key)
    }
}

/// Standalone membership query, independent of a resolution pass.
pub fn is_path_visible_in_workspace(
    group: &WorkspaceGroup,
    path: &str,
    lookup: &dyn PathLookup,
    cache: &mut MatcherCache,
) -> bool {
    cache.matcher_for(group, lookup).is_visible(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Entry, EntryIndex};
    use std::cell::Cell;

    fn tree() -> EntryIndex {
        let entries = vec![
            Entry::folder("a"),
            Entry::folder("a/b"),
            Entry::file("a/b/c.md"),
            Entry::file("a/b/d.md"),
            Entry::folder("projects"),
            Entry::folder("projects/alpha"),
            Entry::file("projects/alpha/plan.md"),
            Entry::file("projects2.md"),
            Entry::folder("x"),
        ];
        EntryIndex::new(&entries)
    }

    #[test]
    fn test_member_file_reveals_its_ancestors_only() {
        let members = vec!["a/b/c.md".to_string()];
        let matcher = WorkspaceMatcher::new(&members, &tree());

        assert!(matcher.is_visible("a"));
        assert!(matcher.is_visible("a/b"));
        assert!(matcher.is_visible("a/b/c.md"));
        assert!(!matcher.is_visible("a/b/d.md"));
        assert!(!matcher.is_visible("x"));
    }

    #[test]
    fn test_folder_member_reveals_descendants() {
        let members = vec!["projects".to_string()];
        let matcher = WorkspaceMatcher::new(&members, &tree());

        assert!(matcher.is_visible("projects"));
        assert!(matcher.is_visible("projects/alpha"));
        assert!(matcher.is_visible("projects/alpha/plan.md"));
        assert!(!matcher.is_visible("projects2.md"));
    }

    #[test]
    fn test_empty_workspace_hides_everything() {
        let matcher = WorkspaceMatcher::new(&[], &tree());
        assert!(matcher.is_empty());
        assert!(!matcher.is_visible("a"));
        assert!(!matcher.is_visible("a/b/c.md"));
    }

    #[test]
    fn test_unresolved_members_never_match() {
        let members = vec!["gone/old.md".to_string()];
        let matcher = WorkspaceMatcher::new(&members, &tree());
        assert!(matcher.is_empty());
        assert!(!matcher.is_visible("gone"));
        assert!(!matcher.is_visible("gone/old.md"));
    }

    #[test]
    fn test_cache_reuses_matcher_for_unchanged_members() {
        let calls = Cell::new(0);
        let lookup = |path: &str| {
            calls.set(calls.get() + 1);
            (path == "a").then_some(EntryKind::Folder)
        };
        let group = WorkspaceGroup::new("w", "!", "W").with_members(["a"]);
        let mut cache = MatcherCache::new();

        assert!(is_path_visible_in_workspace(&group, "a/z.md", &lookup, &mut cache));
        assert!(cache.is_cached(&group));
        let after_first = calls.get();

        assert!(!is_path_visible_in_workspace(&group, "b", &lookup, &mut cache));
        assert_eq!(calls.get(), after_first, "cached matcher must not re-walk the tree");

        let changed = group.clone().with_members(["a", "b"]);
        assert!(!cache.is_cached(&changed));
        is_path_visible_in_workspace(&changed, "b", &lookup, &mut cache);
        assert!(calls.get() > after_first);
        assert!(!cache.is_cached(&group), "cache holds only the latest entry");
    }

    #[test]
    fn test_cache_key_ignores_unnormalized_noise() {
        let lookup = |_: &str| Some(EntryKind::Folder);
        let mut cache = MatcherCache::new();
        let group = WorkspaceGroup::new("w", "", "").with_members(["a"]);
        cache.matcher_for(&group, &lookup);

        let mut noisy = group.clone();
        noisy.members = vec!["a/".to_string(), " a".to_string()];
        assert!(cache.is_cached(&noisy));

        cache.invalidate();
        assert!(!cache.is_cached(&group));
    }

    #[test]
    fn test_member_mutations_stay_normalized() {
        let mut group = WorkspaceGroup::new("w", "", "").with_members(["a/", "a", "b"]);
        assert_eq!(group.members, vec!["a", "b"]);

        group.add_members(["c/", "b"]);
        assert_eq!(group.members, vec!["a", "b", "c"]);

        group.remove_members(["b/"]);
        assert_eq!(group.members, vec!["a", "c"]);
    }

    #[test]
    fn test_member_report_flags_missing() {
        let group = WorkspaceGroup::new("w", "", "").with_members(["a/b", "a/b/c.md", "gone"]);
        let report = group.member_report(&tree());
        assert_eq!(report[0].kind, Some(EntryKind::Folder));
        assert_eq!(report[1].kind, Some(EntryKind::File));
        assert!(report[2].is_missing());
    }

    #[test]
    fn test_resolve_legacy_bindings_promotes_existing_paths() {
        let mut group = WorkspaceGroup::new("w", "", "");
        group.legacy_bindings = vec!["projects/".into(), "Old filter".into()];

        assert_eq!(group.resolve_legacy_bindings(&tree()), 1);
        assert_eq!(group.members, vec!["projects"]);
        assert_eq!(group.legacy_bindings, vec!["Old filter"]);
    }

    #[test]
    fn test_display_fallbacks() {
        let group = WorkspaceGroup::new("w", "  ", "");
        assert_eq!(group.display_emoji(1), "2");
        assert_eq!(group.display_tooltip(1), "Workspace 2");
    }
}
