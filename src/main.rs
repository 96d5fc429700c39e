use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use explorer_rules::app::{commands, report, tree_generator, ExplorerState};
use explorer_rules::config::{settings, ExplorerConfig, FilterAction};
use explorer_rules::core::rules::FilterRule;
use explorer_rules::core::{Entry, EntryKind, PathLookup, Vault, VaultScanner};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "explorer-rules")]
#[command(about = "Pin, hide and focus rules for a notes folder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of the one in the platform config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    Pin,
    Hide,
}

impl From<ActionArg> for FilterAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Pin => FilterAction::Pin,
            ActionArg::Hide => FilterAction::Hide,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the vault as the explorer would show it
    Tree { vault: Utf8PathBuf },

    /// List the entries a bundle pins or hides, and which rules fired
    Explain {
        vault: Utf8PathBuf,
        action: ActionArg,
        /// Only evaluate the rules carrying this name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Tell the rules that an entry was renamed
    Rename { old_path: String, new_path: String },

    /// Tell the rules that an entry was deleted
    #[command(alias = "rm")]
    Delete { path: String },

    /// Toggle every rule with the given name
    ToggleFilter { action: ActionArg, name: String },

    /// Switch all pin or all hide rules on or off
    ToggleBundle { action: ActionArg },

    /// Pin or hide a single file or folder (or undo it)
    TogglePath {
        vault: Utf8PathBuf,
        action: ActionArg,
        path: String,
    },

    #[command(subcommand)]
    Workspace(WorkspaceCommand),

    #[command(subcommand)]
    Focus(FocusCommand),

    /// Write the configuration to a file
    Export { path: PathBuf },

    /// Replace the configuration with the contents of a file
    Import { path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum WorkspaceCommand {
    /// List groups in toolbar order
    #[command(alias = "ls")]
    List,
    /// Activate a group, or deactivate it if it is active
    Toggle {
        id: String,
        /// Move the group to the front of the toolbar (default: the
        /// `reorderOnShortcutClick` setting)
        #[arg(long)]
        promote: bool,
    },
    /// Report missing members and promote resolvable legacy bindings
    Audit { vault: Utf8PathBuf, id: String },
    Enable,
    Disable,
}

#[derive(Subcommand, Debug)]
enum FocusCommand {
    /// Show only these paths (folders include everything below them)
    On {
        vault: Utf8PathBuf,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    Off,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let config = settings::load_config(config_path)?;

    match cli.command {
        Commands::Tree { vault } => {
            let vault_data = scan(&vault)?;
            let mut state = ExplorerState::new(config);
            print!("{}", tree_generator::render_tree(&vault_data, &mut state));
        }
        Commands::Explain { vault, action, name } => {
            let vault_data = scan(&vault)?;
            explain(&config, &vault_data, action.into(), name.as_deref());
        }
        Commands::Rename { old_path, new_path } => {
            let mut state = ExplorerState::new(config);
            let outcome = state.on_rename(&old_path, &new_path);
            println!(
                "{} rule(s), {} member(s), {} focus path(s) updated",
                outcome.rules_changed, outcome.members_changed, outcome.focus_paths_changed
            );
            persist(&state.config, config_path, !outcome.is_noop())?;
        }
        Commands::Delete { path } => {
            let mut state = ExplorerState::new(config);
            let outcome = state.on_delete(&path);
            println!(
                "{} rule(s), {} member(s), {} focus path(s) removed",
                outcome.rules_changed, outcome.members_changed, outcome.focus_paths_changed
            );
            persist(&state.config, config_path, !outcome.is_noop())?;
        }
        Commands::ToggleFilter { action, name } => {
            let mut config = config;
            let action = FilterAction::from(action);
            let toggled = commands::toggle_named_filter(&mut config, action, &name);
            match commands::is_named_filter_active(&config, action, &name) {
                Some(active) => println!(
                    "{} {} filter(s) named '{}' toggled, now {}",
                    toggled.len(),
                    action,
                    name,
                    if active { "on" } else { "off" }
                ),
                None => println!("No {action} filter named '{name}'"),
            }
            persist(&config, config_path, !toggled.is_empty())?;
        }
        Commands::ToggleBundle { action } => {
            let mut config = config;
            let action = FilterAction::from(action);
            let active = commands::toggle_bundle(&mut config, action);
            println!("All {} filters {}", action, if active { "on" } else { "off" });
            persist(&config, config_path, true)?;
        }
        Commands::TogglePath { vault, action, path } => {
            let vault_data = scan(&vault)?;
            let kind = vault_data
                .kind_of(&explorer_rules::core::paths::normalize(&path))
                .with_context(|| format!("'{path}' does not exist in {vault}"))?;
            let mut config = config;
            let action = FilterAction::from(action);
            let on = commands::toggle_strict_path_rule(&mut config, action, &path, kind);
            println!("{path}: {} {}", action, if on { "on" } else { "off" });
            persist(&config, config_path, true)?;
        }
        Commands::Workspace(command) => workspace(command, config, config_path)?,
        Commands::Focus(command) => {
            let mut config = config;
            match command {
                FocusCommand::On { vault, paths } => {
                    let vault_data = scan(&vault)?;
                    commands::focus_on(&mut config, paths.iter().map(String::as_str), &vault_data);
                    println!("Focused on: {}", config.focus_mode.focused_paths.join(", "));
                }
                FocusCommand::Off => {
                    commands::focus_off(&mut config);
                    println!("Focus mode off");
                }
            }
            persist(&config, config_path, true)?;
        }
        Commands::Export { path } => settings::export_config(&config, &path)?,
        Commands::Import { path } => {
            let imported = settings::import_config(&path)?;
            persist(&imported, config_path, true)?;
        }
    }

    Ok(())
}

fn scan(vault: &Utf8PathBuf) -> Result<Vault> {
    VaultScanner::new(vault.clone())
        .scan()
        .with_context(|| format!("Failed to scan {vault}"))
}

fn persist(config: &ExplorerConfig, config_path: Option<&Path>, changed: bool) -> Result<()> {
    if changed {
        settings::save_config(config, config_path)?;
    }
    Ok(())
}

fn explain(config: &ExplorerConfig, vault: &Vault, action: FilterAction, name: Option<&str>) {
    let bundle = config.bundle(action);
    let entries: &[Entry] = vault.entries();

    let rows = match name {
        None => report::activation_report(bundle, entries, None),
        Some(name) => {
            let rules = bundle
                .tags
                .iter()
                .map(|r| r as &dyn FilterRule)
                .chain(bundle.paths.iter().map(|r| r as &dyn FilterRule))
                .chain(bundle.front_matter.iter().map(|r| r as &dyn FilterRule))
                .filter(|r| r.base().name == name);
            let mut rows = Vec::new();
            for rule in rules {
                rows.extend(report::activation_report(bundle, entries, Some(rule)));
            }
            rows
        }
    };

    if rows.is_empty() {
        println!("No entries match the {action} rules");
        return;
    }
    for row in rows {
        println!("{}  [{}]", row.entry.path, row.labels.join(", "));
    }
}

fn workspace(command: WorkspaceCommand, mut config: ExplorerConfig, config_path: Option<&Path>) -> Result<()> {
    match command {
        WorkspaceCommand::List => {
            let active = config.active_workspace().map(|g| g.id.clone());
            for (pos, group) in commands::display_groups(&config).into_iter().enumerate() {
                let marker = if active.as_deref() == Some(group.id.as_str()) { "*" } else { " " };
                println!(
                    "{marker} {} {:<14} {} ({} member(s))",
                    group.display_emoji(pos),
                    group.id,
                    group.display_tooltip(pos),
                    group.members.len()
                );
            }
        }
        WorkspaceCommand::Toggle { id, promote } => {
            let active = if promote {
                commands::toggle_workspace(&mut config, &id, true)?
            } else {
                commands::toggle_workspace_shortcut(&mut config, &id)?
            };
            match active {
                Some(id) => println!("Workspace '{id}' active"),
                None => println!("No workspace active"),
            }
            settings::save_config(&config, config_path)?;
        }
        WorkspaceCommand::Audit { vault, id } => {
            let vault_data = scan(&vault)?;
            let group = config
                .workspace_mut(&id)
                .ok_or_else(|| explorer_rules::core::CoreError::UnknownWorkspace(id.clone()))?;
            let promoted = group.resolve_legacy_bindings(&vault_data);
            for status in group.member_report(&vault_data) {
                let kind = match status.kind {
                    Some(EntryKind::File) => "file",
                    Some(EntryKind::Folder) => "folder",
                    None => "missing",
                };
                println!("{:<8} {}", kind, status.path);
            }
            for binding in &group.legacy_bindings {
                println!("{:<8} {}", "legacy", binding);
            }
            persist(&config, config_path, promoted > 0)?;
        }
        WorkspaceCommand::Enable => set_workspace_focus(config, config_path, true)?,
        WorkspaceCommand::Disable => set_workspace_focus(config, config_path, false)?,
    }
    Ok(())
}

fn set_workspace_focus(mut config: ExplorerConfig, config_path: Option<&Path>, enabled: bool) -> Result<()> {
    commands::set_workspace_focus_enabled(&mut config, enabled);
    println!("Workspace focus {}", if enabled { "enabled" } else { "disabled" });
    settings::save_config(&config, config_path)
}
