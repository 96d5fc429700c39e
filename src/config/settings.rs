use anyhow::Result;
use directories::ProjectDirs;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{generate_group_id, ExplorerConfig};
use crate::core::paths::normalize_json;

const APP_NAME: &str = "ExplorerRules";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "explorerrules", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the full path to the configuration file.
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_directory().map(|dir| dir.join(CONFIG_FILE))
}

fn resolve_config_path(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => get_config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the configuration from `config_path`, or from the platform config
/// directory when `None`.
/// If the file doesn't exist, it creates a default one.
/// Legacy files (index-based workspace selection, groups without ids) are
/// migrated; a file that cannot be parsed at all falls back to defaults.
pub fn load_config(config_path: Option<&Path>) -> Result<ExplorerConfig> {
    let config_path = resolve_config_path(config_path)?;

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = ExplorerConfig::default();
        save_config(&default_config, Some(config_path.as_path()))?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;
    match parse_config(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(ExplorerConfig::default())
        }
    }
}

/// Parses configuration text, migrating the legacy shape when detected.
pub fn parse_config(config_content: &str) -> Result<ExplorerConfig> {
    let value: Value = serde_json::from_str(config_content)?;

    if needs_migration(&value) {
        tracing::info!("Legacy config detected, migrating");
        return migrate_legacy_config(config_content);
    }

    match serde_json::from_value::<ExplorerConfig>(value) {
        Ok(mut config) => {
            config.ensure_consistency();
            Ok(config)
        }
        Err(e) => {
            tracing::warn!("Config does not match the current shape ({}); trying migration", e);
            migrate_legacy_config(config_content)
        }
    }
}

/// `true` if the persisted value still uses index-based workspace selection
/// or groups that predate stable ids.
pub fn needs_migration(value: &Value) -> bool {
    let Some(workspace) = value.get("workspaceFocus").and_then(Value::as_object) else {
        return false;
    };
    if workspace.contains_key("activeIndex") {
        return true;
    }
    workspace
        .get("groups")
        .and_then(Value::as_array)
        .is_some_and(|groups| {
            groups.iter().any(|group| {
                group.get("filterNames").is_some()
                    || group
                        .get("id")
                        .and_then(Value::as_str)
                        .is_none_or(|id| id.trim().is_empty())
            })
        })
}

/// Attempts to migrate a configuration from an older format to the current `ExplorerConfig` struct.
///
/// Groups receive generated `workspace-N` ids, their `filterNames` become
/// normalized legacy bindings, and a legacy `activeIndex` is mapped onto the
/// id of the group it pointed at.
fn migrate_legacy_config(config_content: &str) -> Result<ExplorerConfig> {
    let mut value: Value = serde_json::from_str(config_content)?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Config is not a JSON object"))?;

    let defaults = ExplorerConfig::default();

    // Helper to insert a default value if the key is missing or its value is null.
    let ensure_field = |obj: &mut Map<String, Value>, key: &str, default_val: Value| {
        if !obj.contains_key(key) || obj.get(key) == Some(&Value::Null) {
            obj.insert(key.to_string(), default_val);
        }
    };

    for (key, bundle) in [
        ("pinFilters", &defaults.pin_filters),
        ("hideFilters", &defaults.hide_filters),
    ] {
        ensure_field(obj, key, serde_json::to_value(bundle)?);
        if let Some(bundle_obj) = obj.get_mut(key).and_then(Value::as_object_mut) {
            ensure_field(
                bundle_obj,
                "frontMatter",
                serde_json::to_value(&bundle.front_matter)?,
            );
        }
    }

    ensure_field(
        obj,
        "workspaceFocus",
        serde_json::to_value(&defaults.workspace_focus)?,
    );
    if let Some(workspace) = obj.get_mut("workspaceFocus").and_then(Value::as_object_mut) {
        migrate_workspace_focus(workspace)?;
    }

    let mut migrated_config: ExplorerConfig = serde_json::from_value(Value::Object(obj.clone()))?;
    migrated_config.ensure_consistency();
    tracing::info!("Successfully migrated legacy config");
    Ok(migrated_config)
}

fn migrate_workspace_focus(workspace: &mut Map<String, Value>) -> Result<()> {
    let defaults = super::WorkspaceFocus::default();
    if !matches!(workspace.get("groups"), Some(Value::Array(_))) {
        workspace.insert("groups".to_string(), serde_json::to_value(&defaults.groups)?);
    }

    let mut ids: Vec<String> = Vec::new();
    if let Some(Value::Array(groups)) = workspace.get_mut("groups") {
        let mut taken: HashSet<String> = groups
            .iter()
            .filter_map(|g| g.get("id").and_then(Value::as_str))
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        let mut seen: HashSet<String> = HashSet::new();

        for group in groups.iter_mut() {
            let Some(group_obj) = group.as_object_mut() else {
                ids.push(String::new());
                continue;
            };

            let current = group_obj
                .get("id")
                .and_then(Value::as_str)
                .map(|id| id.trim().to_string())
                .unwrap_or_default();
            let id = if current.is_empty() || seen.contains(&current) {
                let generated = generate_group_id(&taken, &[]);
                taken.insert(generated.clone());
                generated
            } else {
                current
            };
            seen.insert(id.clone());
            group_obj.insert("id".to_string(), Value::String(id.clone()));

            let mut bindings = group_obj
                .remove("legacyBindings")
                .map(|v| normalize_json(&v))
                .unwrap_or_default();
            if let Some(filter_names) = group_obj.remove("filterNames") {
                bindings.extend(normalize_json(&filter_names));
            }
            group_obj.insert(
                "legacyBindings".to_string(),
                serde_json::to_value(crate::core::paths::normalize_all(&bindings))?,
            );

            let members = group_obj
                .get("members")
                .map(normalize_json)
                .unwrap_or_default();
            group_obj.insert("members".to_string(), serde_json::to_value(members)?);

            ids.push(id);
        }
    }

    if let Some(active_index) = workspace.remove("activeIndex") {
        let mapped = active_index
            .as_u64()
            .and_then(|idx| ids.get(idx as usize))
            .filter(|id| !id.is_empty())
            .cloned();
        if workspace.get("activeGroupId").is_none_or(Value::is_null) {
            workspace.insert(
                "activeGroupId".to_string(),
                mapped.map(Value::String).unwrap_or(Value::Null),
            );
        }
    }

    Ok(())
}

/// Saves the provided configuration to `config_path`, or to the platform
/// config directory when `None`.
pub fn save_config(config: &ExplorerConfig, config_path: Option<&Path>) -> Result<()> {
    let config_path = resolve_config_path(config_path)?;

    // Create config directory if it doesn't exist.
    if let Some(config_dir) = config_path.parent() {
        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            tracing::info!("Created config directory: {:?}", config_dir);
        }
    }

    let config_json = serde_json::to_string_pretty(config)?;

    fs::write(&config_path, config_json)?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}

/// Exports the current configuration to a user-specified JSON file.
pub fn export_config(config: &ExplorerConfig, export_path: &Path) -> Result<()> {
    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(export_path, config_json)?;
    tracing::info!("Exported config to {:?}", export_path);
    Ok(())
}

/// Imports a configuration from a user-specified JSON file.
pub fn import_config(import_path: &Path) -> Result<ExplorerConfig> {
    let config_content = fs::read_to_string(import_path)?;
    let config = parse_config(&config_content)?;
    tracing::info!("Imported config from {:?}", import_path);
    Ok(config)
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.explorerrules.ExplorerRules/
// Linux:   ~/.config/explorerrules/
// Windows: %APPDATA%/explorerrules/ExplorerRules/config/
