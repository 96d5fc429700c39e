//! Keeps rules, workspace members and focus paths pointing at the right
//! entries when the host renames or deletes something.
//!
//! STRICT path rules reference exactly one entry and are rewritten or removed
//! on exact equality only. Workspace members, legacy bindings and focus paths
//! can reference a folder, so they follow the entry and all its descendants.

use crate::config::ExplorerConfig;
use crate::core::paths::{self, is_same_or_descendant, normalize_all, rebase};
use crate::core::rules::{PathRule, RuleBundle};

/// What one rename or delete changed in the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceOutcome {
    /// STRICT path rules rewritten (rename) or removed (delete).
    pub rules_changed: usize,
    /// Workspace members and legacy bindings rewritten or removed, over all groups.
    pub members_changed: usize,
    pub focus_paths_changed: usize,
    /// `true` when the visible set of the current configuration may differ.
    pub requires_resolve: bool,
}

impl MaintenanceOutcome {
    pub fn is_noop(&self) -> bool {
        self.rules_changed == 0 && self.members_changed == 0 && self.focus_paths_changed == 0
    }
}

/// Rewrites every reference to `old_path` (and, for membership sets, to its
/// descendants) so that it points at `new_path`.
pub fn on_rename(config: &mut ExplorerConfig, old_path: &str, new_path: &str) -> MaintenanceOutcome {
    let old = paths::normalize(old_path);
    let new = paths::normalize(new_path);
    let mut outcome = MaintenanceOutcome::default();
    if old.is_empty() || new.is_empty() || old == new {
        return outcome;
    }
    outcome.requires_resolve = touches_active_set(config, &[old.as_str(), new.as_str()]);

    for bundle in [&mut config.pin_filters, &mut config.hide_filters] {
        let (changed, affects_visibility) = rename_strict_rules(bundle, &old, &new);
        outcome.rules_changed += changed;
        outcome.requires_resolve |= affects_visibility;
    }

    let active_id = config.active_workspace().map(|g| g.id.clone());
    for group in &mut config.workspace_focus.groups {
        let follow = |p: &str| Some(rebase(p, &old, &new).unwrap_or_else(|| p.to_string()));
        let (members, members_changed) = rewrite_all(&group.members, follow);
        let (bindings, bindings_changed) = rewrite_all(&group.legacy_bindings, follow);
        group.members = members;
        group.legacy_bindings = bindings;

        outcome.members_changed += members_changed + bindings_changed;
        if members_changed > 0 && active_id.as_deref() == Some(group.id.as_str()) {
            outcome.requires_resolve = true;
        }
    }

    let focus_changed = rewrite_focus_paths(&mut config.focus_mode.focused_paths, |p| {
        Some(rebase(p, &old, &new).unwrap_or_else(|| p.to_string()))
    });
    outcome.focus_paths_changed = focus_changed;
    if focus_changed > 0 && config.focus_mode.active {
        outcome.requires_resolve = true;
    }

    if !outcome.is_noop() {
        tracing::info!(
            "Rename {} -> {}: {} rule(s), {} member(s), {} focus path(s) updated",
            old,
            new,
            outcome.rules_changed,
            outcome.members_changed,
            outcome.focus_paths_changed
        );
    }
    outcome
}

/// Drops every reference to `path`: STRICT rules naming it, and members,
/// legacy bindings and focus paths equal to it or below it.
pub fn on_delete(config: &mut ExplorerConfig, path: &str) -> MaintenanceOutcome {
    let target = paths::normalize(path);
    let mut outcome = MaintenanceOutcome::default();
    if target.is_empty() {
        return outcome;
    }
    outcome.requires_resolve = touches_active_set(config, &[target.as_str()]);

    for bundle in [&mut config.pin_filters, &mut config.hide_filters] {
        let (removed, affects_visibility) = remove_strict_rules(bundle, &target);
        outcome.rules_changed += removed;
        outcome.requires_resolve |= affects_visibility;
    }

    let active_id = config.active_workspace().map(|g| g.id.clone());
    for group in &mut config.workspace_focus.groups {
        let keep = |p: &str| (!is_same_or_descendant(p, &target)).then(|| p.to_string());
        let (members, members_changed) = rewrite_all(&group.members, keep);
        let (bindings, bindings_changed) = rewrite_all(&group.legacy_bindings, keep);
        group.members = members;
        group.legacy_bindings = bindings;

        outcome.members_changed += members_changed + bindings_changed;
        if members_changed > 0 && active_id.as_deref() == Some(group.id.as_str()) {
            outcome.requires_resolve = true;
        }
    }

    let focus_changed = rewrite_focus_paths(&mut config.focus_mode.focused_paths, |p| {
        (!is_same_or_descendant(p, &target)).then(|| p.to_string())
    });
    outcome.focus_paths_changed = focus_changed;
    if focus_changed > 0 && config.focus_mode.active {
        outcome.requires_resolve = true;
    }

    if !outcome.is_noop() {
        tracing::info!(
            "Delete {}: {} rule(s), {} member(s), {} focus path(s) removed",
            target,
            outcome.rules_changed,
            outcome.members_changed,
            outcome.focus_paths_changed
        );
    }
    outcome
}

/// `true` if any of `touched` lies at or below a member of the active
/// workspace or a path of the active focus set.
fn touches_active_set(config: &ExplorerConfig, touched: &[&str]) -> bool {
    let members = config
        .active_workspace()
        .map(|group| group.members.as_slice())
        .unwrap_or_default();
    let focused: &[String] = if config.focus_mode.active {
        &config.focus_mode.focused_paths
    } else {
        &[]
    };

    members
        .iter()
        .chain(focused)
        .map(|raw| paths::normalize(raw))
        .filter(|scope| !scope.is_empty())
        .any(|scope| touched.iter().any(|path| is_same_or_descendant(path, &scope)))
}

fn counts_for_visibility(bundle_active: bool, rule: &PathRule) -> bool {
    bundle_active && rule.base.active
}

fn rename_strict_rules(bundle: &mut RuleBundle, old: &str, new: &str) -> (usize, bool) {
    let mut changed = 0;
    let mut affects_visibility = false;
    for rule in bundle.paths.iter_mut() {
        if rule.is_strict() && paths::normalize(&rule.base.pattern) == old {
            rule.base.pattern = new.to_string();
            changed += 1;
            affects_visibility |= counts_for_visibility(bundle.active, rule);
        }
    }
    (changed, affects_visibility)
}

fn remove_strict_rules(bundle: &mut RuleBundle, target: &str) -> (usize, bool) {
    let bundle_active = bundle.active;
    let mut affects_visibility = false;
    let before = bundle.paths.len();
    bundle.paths.retain(|rule| {
        let doomed = rule.is_strict() && paths::normalize(&rule.base.pattern) == target;
        if doomed {
            affects_visibility |= counts_for_visibility(bundle_active, rule);
        }
        !doomed
    });
    (before - bundle.paths.len(), affects_visibility)
}

/// Applies `rewrite` to every normalized value (`None` drops it), then
/// re-normalizes. Returns the new list and how many values were changed or dropped.
fn rewrite_all<F>(values: &[String], rewrite: F) -> (Vec<String>, usize)
where
    F: Fn(&str) -> Option<String>,
{
    let mut changed = 0;
    let mut rewritten = Vec::with_capacity(values.len());
    for value in normalize_all(values) {
        match rewrite(&value) {
            Some(updated) if updated == value => rewritten.push(updated),
            Some(updated) => {
                changed += 1;
                rewritten.push(updated);
            }
            None => changed += 1,
        }
    }
    (normalize_all(rewritten), changed)
}

/// Like [`rewrite_all`], but keeps the trailing `/` that marks a focused folder.
fn rewrite_focus_paths<F>(focused: &mut Vec<String>, rewrite: F) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    let mut changed = 0;
    let mut updated: Vec<String> = Vec::with_capacity(focused.len());
    for raw in focused.iter() {
        let is_folder = raw.trim().ends_with(paths::SEPARATOR);
        let path = paths::normalize(raw);
        if path.is_empty() {
            continue;
        }

        match rewrite(&path) {
            Some(new_path) => {
                if new_path != path {
                    changed += 1;
                }
                let stored = if is_folder {
                    format!("{new_path}{}", paths::SEPARATOR)
                } else {
                    new_path
                };
                if !updated.contains(&stored) {
                    updated.push(stored);
                }
            }
            None => changed += 1,
        }
    }
    *focused = updated;
    changed
}
