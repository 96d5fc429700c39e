pub mod settings;

use crate::core::rules::RuleBundle;
use crate::core::workspace::WorkspaceGroup;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

fn default_true() -> bool {
    true
}

/// Which of the two rule bundles an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterAction {
    Pin,
    Hide,
}

impl fmt::Display for FilterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterAction::Pin => write!(f, "pin"),
            FilterAction::Hide => write!(f, "hide"),
        }
    }
}

/// A single, unnamed inclusion set. Folder paths carry a trailing `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusMode {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub focused_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceFocus {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub reorder_on_shortcut_click: bool,
    /// The active group, tracked by id so it survives reordering.
    #[serde(default)]
    pub active_group_id: Option<String>,
    #[serde(default)]
    pub recent_group_ids: Vec<String>,
    #[serde(default = "default_groups")]
    pub groups: Vec<WorkspaceGroup>,
}

impl Default for WorkspaceFocus {
    fn default() -> Self {
        Self {
            enabled: true,
            reorder_on_shortcut_click: false,
            active_group_id: None,
            recent_group_ids: Vec::new(),
            groups: default_groups(),
        }
    }
}

pub fn default_groups() -> Vec<WorkspaceGroup> {
    ["!", "?", "x"]
        .iter()
        .enumerate()
        .map(|(idx, emoji)| {
            WorkspaceGroup::new(
                format!("workspace-{}", idx + 1),
                *emoji,
                format!("Workspace {}", idx + 1),
            )
        })
        .collect()
}

/// The complete rule configuration consumed by a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerConfig {
    /// Leave STRICT path rules out of settings listings.
    #[serde(default = "default_true")]
    pub hide_strict_path_filters: bool,
    #[serde(default)]
    pub focus_mode: FocusMode,
    #[serde(default = "RuleBundle::with_blank_rules")]
    pub pin_filters: RuleBundle,
    #[serde(default = "RuleBundle::with_blank_rules")]
    pub hide_filters: RuleBundle,
    #[serde(default)]
    pub workspace_focus: WorkspaceFocus,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            hide_strict_path_filters: true,
            focus_mode: FocusMode::default(),
            pin_filters: RuleBundle::with_blank_rules(),
            hide_filters: RuleBundle::with_blank_rules(),
            workspace_focus: WorkspaceFocus::default(),
        }
    }
}

impl ExplorerConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    pub fn bundle(&self, action: FilterAction) -> &RuleBundle {
        match action {
            FilterAction::Pin => &self.pin_filters,
            FilterAction::Hide => &self.hide_filters,
        }
    }

    pub fn bundle_mut(&mut self, action: FilterAction) -> &mut RuleBundle {
        match action {
            FilterAction::Pin => &mut self.pin_filters,
            FilterAction::Hide => &mut self.hide_filters,
        }
    }

    pub fn workspace(&self, id: &str) -> Option<&WorkspaceGroup> {
        self.workspace_focus.groups.iter().find(|g| g.id == id)
    }

    pub fn workspace_mut(&mut self, id: &str) -> Option<&mut WorkspaceGroup> {
        self.workspace_focus.groups.iter_mut().find(|g| g.id == id)
    }

    /// The group restricting visibility, if workspace focus is enabled and
    /// the active id still names a group. A dangling id reads as "none".
    pub fn active_workspace(&self) -> Option<&WorkspaceGroup> {
        if !self.workspace_focus.enabled {
            return None;
        }
        let id = self.workspace_focus.active_group_id.as_deref()?;
        self.workspace(id)
    }

    /// Repairs a configuration loaded from disk or edited by hand.
    ///
    /// Normalizes member lists, gives every group a unique id, drops unknown
    /// recent ids, and clears an active id that names no group or is set
    /// while workspace focus is disabled or focus mode is on.
    pub fn ensure_consistency(&mut self) {
        let focus = &mut self.workspace_focus;

        let mut taken: HashSet<String> = HashSet::new();
        for idx in 0..focus.groups.len() {
            focus.groups[idx].normalize();
            let id = focus.groups[idx].id.trim().to_string();
            if id.is_empty() || taken.contains(&id) {
                let generated = generate_group_id(&taken, &focus.groups);
                tracing::info!("Assigning id '{}' to workspace group #{}", generated, idx + 1);
                focus.groups[idx].id = generated.clone();
                taken.insert(generated);
            } else {
                focus.groups[idx].id = id.clone();
                taken.insert(id);
            }
        }

        let mut seen_recent = HashSet::new();
        focus
            .recent_group_ids
            .retain(|id| taken.contains(id) && seen_recent.insert(id.clone()));

        if let Some(active) = focus.active_group_id.clone() {
            if !taken.contains(&active) {
                tracing::warn!("Active workspace '{}' no longer exists; clearing selection", active);
                focus.active_group_id = None;
            } else if !focus.enabled || self.focus_mode.active {
                focus.active_group_id = None;
            }
        }

        let mut seen_focus = HashSet::new();
        self.focus_mode
            .focused_paths
            .retain(|p| !p.trim().is_empty() && seen_focus.insert(p.clone()));
    }
}

/// Picks the smallest free `workspace-N` id.
pub fn generate_group_id(taken: &HashSet<String>, groups: &[WorkspaceGroup]) -> String {
    (1..)
        .map(|n| format!("workspace-{n}"))
        .find(|candidate| !taken.contains(candidate) && !groups.iter().any(|g| &g.id == candidate))
        .unwrap_or_else(|| format!("workspace-{}", groups.len() + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_shape() {
        let config = ExplorerConfig::default();
        assert!(config.pin_filters.active);
        assert!(config.hide_filters.active);
        assert_eq!(config.hide_filters.paths.len(), 1);
        assert!(config.workspace_focus.enabled);
        let ids: Vec<_> = config.workspace_focus.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["workspace-1", "workspace-2", "workspace-3"]);
        assert!(config.active_workspace().is_none());
    }

    #[test]
    fn test_active_workspace_by_id_survives_reordering() {
        let mut config = ExplorerConfig::default();
        config.workspace_focus.active_group_id = Some("workspace-2".into());
        config.workspace_focus.groups.reverse();
        assert_eq!(config.active_workspace().map(|g| g.id.as_str()), Some("workspace-2"));

        config.workspace_focus.groups.retain(|g| g.id != "workspace-1");
        assert_eq!(config.active_workspace().map(|g| g.id.as_str()), Some("workspace-2"));
    }

    #[test]
    fn test_dangling_active_id_reads_as_none() {
        let mut config = ExplorerConfig::default();
        config.workspace_focus.active_group_id = Some("deleted".into());
        assert!(config.active_workspace().is_none());

        config.ensure_consistency();
        assert_eq!(config.workspace_focus.active_group_id, None);
    }

    #[test]
    fn test_disabled_workspace_focus_has_no_active_group() {
        let mut config = ExplorerConfig::default();
        config.workspace_focus.active_group_id = Some("workspace-1".into());
        config.workspace_focus.enabled = false;
        assert!(config.active_workspace().is_none());
    }

    #[test]
    fn test_ensure_consistency_repairs_ids_and_members() {
        let mut config = ExplorerConfig::default();
        config.workspace_focus.groups[1].id = "workspace-1".into();
        config.workspace_focus.groups[2].id = "  ".into();
        config.workspace_focus.groups[0].members = vec!["a/".into(), "a".into(), "".into()];
        config.workspace_focus.recent_group_ids =
            vec!["workspace-1".into(), "ghost".into(), "workspace-1".into()];

        config.ensure_consistency();

        let ids: Vec<_> = config.workspace_focus.groups.iter().map(|g| g.id.clone()).collect();
        assert_eq!(ids, vec!["workspace-1", "workspace-2", "workspace-3"]);
        assert_eq!(config.workspace_focus.groups[0].members, vec!["a"]);
        assert_eq!(config.workspace_focus.recent_group_ids, vec!["workspace-1"]);
    }

    #[test]
    fn test_ensure_consistency_keeps_focus_and_workspace_exclusive() {
        let mut config = ExplorerConfig::default();
        config.focus_mode.active = true;
        config.focus_mode.focused_paths = vec!["notes/".into(), " ".into(), "notes/".into()];
        config.workspace_focus.active_group_id = Some("workspace-1".into());

        config.ensure_consistency();

        assert_eq!(config.workspace_focus.active_group_id, None);
        assert_eq!(config.focus_mode.focused_paths, vec!["notes/"]);
    }

    #[test]
    fn test_serde_uses_persisted_key_names() {
        let value = serde_json::to_value(ExplorerConfig::default()).unwrap();
        assert!(value.get("hideStrictPathFilters").is_some());
        assert!(value["workspaceFocus"].get("activeGroupId").is_some());
        assert!(value["pinFilters"].get("frontMatter").is_some());

        let parsed: ExplorerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, ExplorerConfig::default());
    }
}
