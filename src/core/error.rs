//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Resolution itself never fails: malformed patterns and dangling references
/// degrade to "never matches". These variants surface only from the explicit,
/// fallible entry points (pattern compilation, scanning, workspace selection).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A REGEX (or translated WILDCARD) pattern that the regex engine rejected.
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1:?}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// A Markdown file whose front matter block is not valid YAML.
    #[error("Invalid front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0:?}")]
    NotADirectory(PathBuf),

    /// A workspace id that names no configured group.
    #[error("Unknown workspace group: {0}")]
    UnknownWorkspace(String),
}
