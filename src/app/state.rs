//! The engine facade a host holds on to between resolution passes.

use super::filtering::{self, Resolution};
use super::maintenance::{self, MaintenanceOutcome};
use crate::config::ExplorerConfig;
use crate::core::workspace::{self, MatcherCache};
use crate::core::{Entry, PathLookup};

/// Extension point a host exposes for reordering one folder's children.
///
/// The host sorts a folder natively, hands the list to `transform`, and
/// renders the visible entries of the result.
pub trait SortedItemsHook {
    fn transform<'a>(&mut self, sorted: &'a [Entry], lookup: &dyn PathLookup) -> Resolution<'a>;
}

/// Rule configuration plus the workspace matcher cache.
///
/// The configuration is only changed between passes, through the methods
/// below or by the host mutating `config` directly.
#[derive(Debug, Default)]
pub struct ExplorerState {
    pub config: ExplorerConfig,
    cache: MatcherCache,
}

impl ExplorerState {
    pub fn new(mut config: ExplorerConfig) -> Self {
        config.ensure_consistency();
        Self {
            config,
            cache: MatcherCache::new(),
        }
    }

    pub fn resolve<'a>(&mut self, entries: &'a [Entry], lookup: &dyn PathLookup) -> Resolution<'a> {
        filtering::resolve(entries, &self.config, lookup, &mut self.cache)
    }

    pub fn on_rename(&mut self, old_path: &str, new_path: &str) -> MaintenanceOutcome {
        let outcome = maintenance::on_rename(&mut self.config, old_path, new_path);
        if outcome.members_changed > 0 {
            // Member paths may now classify differently against the renamed tree.
            self.cache.invalidate();
        }
        outcome
    }

    pub fn on_delete(&mut self, path: &str) -> MaintenanceOutcome {
        let outcome = maintenance::on_delete(&mut self.config, path);
        if outcome.members_changed > 0 {
            self.cache.invalidate();
        }
        outcome
    }

    /// Whether `path` would be visible with workspace `group_id` active,
    /// regardless of which group is active now. `None` for an unknown id.
    pub fn is_path_visible_in_workspace(
        &mut self,
        group_id: &str,
        path: &str,
        lookup: &dyn PathLookup,
    ) -> Option<bool> {
        let group = self.config.workspace(group_id)?;
        Some(workspace::is_path_visible_in_workspace(
            group,
            path,
            lookup,
            &mut self.cache,
        ))
    }

    /// Drops the cached workspace matcher, e.g. after the host tree changed
    /// in ways that may flip a member between file, folder and missing.
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }
}

impl SortedItemsHook for ExplorerState {
    fn transform<'a>(&mut self, sorted: &'a [Entry], lookup: &dyn PathLookup) -> Resolution<'a> {
        self.resolve(sorted, lookup)
    }
}
