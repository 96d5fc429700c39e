//! User actions that mutate the rule configuration.
//!
//! Each command takes the configuration explicitly, applies one change and
//! reports what happened. Persisting the result and triggering a new
//! resolution pass is left to the caller.

use crate::config::{ExplorerConfig, FilterAction};
use crate::core::error::CoreError;
use crate::core::rules::{self, PathRule, Rule, TargetType};
use crate::core::workspace::WorkspaceGroup;
use crate::core::{paths, Entry, EntryKind, PathLookup};

/// Flips every rule named `name` in the `action` bundle. Returns the toggled
/// rules in their new state; an unknown or empty name toggles nothing.
pub fn toggle_named_filter(config: &mut ExplorerConfig, action: FilterAction, name: &str) -> Vec<Rule> {
    let toggled = config.bundle_mut(action).toggle_named(name);
    if toggled.is_empty() {
        tracing::debug!("No {} filter named '{}'", action, name);
    } else {
        tracing::info!("Toggled {} {} filter(s) named '{}'", toggled.len(), action, name);
    }
    toggled
}

/// `None` when no rule in the bundle carries `name`.
pub fn is_named_filter_active(config: &ExplorerConfig, action: FilterAction, name: &str) -> Option<bool> {
    config.bundle(action).is_named_active(name)
}

/// Flips the bundle-level switch of all pin or all hide filters. Returns the new state.
pub fn toggle_bundle(config: &mut ExplorerConfig, action: FilterAction) -> bool {
    let bundle = config.bundle_mut(action);
    bundle.active = !bundle.active;
    tracing::info!("All {} filters are now {}", action, if bundle.active { "on" } else { "off" });
    bundle.active
}

/// The "pin/hide this file or folder" shortcut.
///
/// Adds an active STRICT rule for `path` if none exists, activates an
/// inactive one, or removes an active one. Returns whether the entry is now
/// pinned (or hidden) by such a rule.
pub fn toggle_strict_path_rule(
    config: &mut ExplorerConfig,
    action: FilterAction,
    path: &str,
    kind: EntryKind,
) -> bool {
    let path = paths::normalize(path);
    if path.is_empty() {
        return false;
    }

    let target = TargetType::for_kind(kind);
    let bundle = config.bundle_mut(action);
    let existing = bundle
        .paths
        .iter()
        .position(|rule| rule.is_strict() && rule.target == target && rule.base.pattern == path);

    match existing {
        None => {
            bundle.paths.push(PathRule::strict(path.clone(), kind));
            tracing::info!("Added {} rule for {}", action, path);
            true
        }
        Some(idx) if !bundle.paths[idx].base.active => {
            bundle.paths[idx].base.active = true;
            tracing::info!("Re-activated {} rule for {}", action, path);
            true
        }
        Some(idx) => {
            bundle.paths.remove(idx);
            tracing::info!("Removed {} rule for {}", action, path);
            false
        }
    }
}

/// Activates workspace `id`, or deactivates it if it is already active.
///
/// Activating a group turns focus mode off. With `promote_recent` the group
/// moves to the front of the recently used list. Does nothing while
/// workspace focus is disabled. Returns the active group id afterwards.
pub fn toggle_workspace(
    config: &mut ExplorerConfig,
    id: &str,
    promote_recent: bool,
) -> Result<Option<String>, CoreError> {
    if config.workspace(id).is_none() {
        return Err(CoreError::UnknownWorkspace(id.to_string()));
    }

    let focus = &mut config.workspace_focus;
    if !focus.enabled {
        tracing::debug!("Workspace focus is disabled; ignoring toggle of '{}'", id);
        return Ok(focus.active_group_id.clone());
    }

    if focus.active_group_id.as_deref() == Some(id) {
        focus.active_group_id = None;
        tracing::info!("Deactivated workspace '{}'", id);
        return Ok(None);
    }

    focus.active_group_id = Some(id.to_string());
    if promote_recent {
        focus.recent_group_ids.retain(|recent| recent != id);
        focus.recent_group_ids.insert(0, id.to_string());
    }
    if config.focus_mode.active {
        config.focus_mode.active = false;
        config.focus_mode.focused_paths.clear();
    }

    tracing::info!("Activated workspace '{}'", id);
    Ok(Some(id.to_string()))
}

/// Toggles workspace `id` from its toolbar shortcut, promoting it in the
/// toolbar order when `reorderOnShortcutClick` is set.
pub fn toggle_workspace_shortcut(
    config: &mut ExplorerConfig,
    id: &str,
) -> Result<Option<String>, CoreError> {
    let promote = config.workspace_focus.reorder_on_shortcut_click;
    toggle_workspace(config, id, promote)
}

/// Turning workspace focus off also clears the active group.
pub fn set_workspace_focus_enabled(config: &mut ExplorerConfig, enabled: bool) {
    config.workspace_focus.enabled = enabled;
    if !enabled {
        config.workspace_focus.active_group_id = None;
    }
}

/// Groups in toolbar order: recently used first, then the rest as stored.
pub fn display_groups(config: &ExplorerConfig) -> Vec<&WorkspaceGroup> {
    let focus = &config.workspace_focus;
    let mut ordered: Vec<&WorkspaceGroup> = focus
        .recent_group_ids
        .iter()
        .filter_map(|id| config.workspace(id))
        .collect();

    for group in &focus.groups {
        if !ordered.iter().any(|g| g.id == group.id) {
            ordered.push(group);
        }
    }
    ordered
}

/// Restricts the view to `targets`. Folders are stored with a trailing `/`.
/// Any active workspace is cleared.
pub fn focus_on<'a, I>(config: &mut ExplorerConfig, targets: I, lookup: &dyn PathLookup)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut focused: Vec<String> = Vec::new();
    for target in targets {
        let path = paths::normalize(target);
        if path.is_empty() {
            continue;
        }
        let is_folder = target.trim().ends_with(paths::SEPARATOR)
            || lookup.kind_of(&path) == Some(EntryKind::Folder);
        let stored = if is_folder {
            format!("{path}{}", paths::SEPARATOR)
        } else {
            path
        };
        if !focused.contains(&stored) {
            focused.push(stored);
        }
    }

    tracing::info!("Focusing on {} path(s)", focused.len());
    config.focus_mode.active = true;
    config.focus_mode.focused_paths = focused;
    config.workspace_focus.active_group_id = None;
}

pub fn focus_off(config: &mut ExplorerConfig) {
    config.focus_mode.active = false;
    config.focus_mode.focused_paths.clear();
}

/// Decides whether a change to `entry`'s tags warrants a new resolution pass,
/// given its pinned and hidden flags from the last pass.
pub fn metadata_change_requires_resort(
    config: &ExplorerConfig,
    entry: &Entry,
    was_pinned: bool,
    was_hidden: bool,
) -> bool {
    let tag_matches = |action: FilterAction| {
        let bundle = config.bundle(action);
        bundle.active && rules::any_matches(&bundle.tags, entry)
    };
    let should_be_pinned = tag_matches(FilterAction::Pin);
    let should_be_hidden = tag_matches(FilterAction::Hide);

    (was_pinned != should_be_pinned && !should_be_hidden) || was_hidden != should_be_hidden
}
