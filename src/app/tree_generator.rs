//! Generates an ASCII representation of a vault as the explorer would show it.

use super::state::ExplorerState;
use crate::core::paths;
use crate::core::scanner::Vault;

const PIN_MARKER: &str = "📌 ";

/// A utility struct for rendering resolved trees.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeGenerator;

impl TreeGenerator {
    /// Renders the vault under a `root_name/` header line.
    ///
    /// Every folder's children go through a full resolution pass, so hidden
    /// entries (and everything below them) are left out and pinned entries
    /// come first, marked with a pin.
    pub fn generate_tree(vault: &Vault, state: &mut ExplorerState, root_name: &str) -> String {
        let mut result = format!("{root_name}/\n");
        Self::render_folder(vault, state, "", "", &mut result);
        result
    }

    fn render_folder(
        vault: &Vault,
        state: &mut ExplorerState,
        folder: &str,
        prefix: &str,
        result: &mut String,
    ) {
        let children = vault.children_of(folder);
        let resolution = state.resolve(&children, vault);
        let count = resolution.visible.len();

        for (i, resolved) in resolution.visible.iter().enumerate() {
            let entry = resolved.entry;
            let is_last = i == count - 1;

            let connector = if is_last { "└── " } else { "├── " };
            let icon = if entry.is_folder() { "📁 " } else { "📄 " };
            let pin = if resolved.flags.pinned { PIN_MARKER } else { "" };

            result.push_str(&format!(
                "{prefix}{connector}{pin}{icon}{}\n",
                paths::file_name(&entry.path)
            ));

            if entry.is_folder() {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };
                Self::render_folder(vault, state, &entry.path, &new_prefix, result);
            }
        }
    }
}

/// Renders `vault` with the root labelled `.`.
pub fn render_tree(vault: &Vault, state: &mut ExplorerState) -> String {
    TreeGenerator::generate_tree(vault, state, ".")
}
