//! The stateful layer around the pure engine: the resolution pipeline, rule
//! maintenance on rename/delete, user commands and rendering.

pub mod commands;
pub mod filtering;
pub mod maintenance;
pub mod report;
pub mod state;
pub mod tree_generator;

pub use filtering::{resolve, EntryFlags, HiddenBy, HiddenEntry, Resolution, Resolved};
pub use maintenance::MaintenanceOutcome;
pub use state::{ExplorerState, SortedItemsHook};
