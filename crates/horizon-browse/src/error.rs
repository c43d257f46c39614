//! Error types for browse-list operations.

use std::path::PathBuf;

use crate::column::ColumnId;

/// Result type alias for browse-list operations.
pub type Result<T> = std::result::Result<T, BrowseError>;

/// Errors reported synchronously by structural browse-list operations.
///
/// Every operation that returns one of these leaves the component state
/// exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    /// A column index was outside the current column range.
    #[error("column index {index} is out of range for {len} columns")]
    InvalidColumnIndex { index: usize, len: usize },

    /// A reorder mapping was not a permutation of the current columns.
    #[error("invalid column permutation: {reason}")]
    InvalidPermutation { reason: String },

    /// Removing the column would leave the view without any column.
    #[error("a browse view needs at least one column")]
    LastColumn,

    /// The possible-column catalog was empty.
    #[error("cannot build a column registry from an empty catalog")]
    EmptyCatalog,

    /// A column id did not name any column in the catalog.
    #[error("unknown column '{0}'")]
    UnknownColumn(ColumnId),

    /// Persisted settings could not be read or written.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl BrowseError {
    /// Create an index error.
    pub fn invalid_index(index: usize, len: usize) -> Self {
        Self::InvalidColumnIndex { index, len }
    }

    /// Create a permutation error.
    pub fn invalid_permutation(reason: impl Into<String>) -> Self {
        Self::InvalidPermutation {
            reason: reason.into(),
        }
    }
}

/// Errors from loading or saving [`Settings`](crate::settings::Settings).
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File I/O error.
    #[error("failed to access settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encode/decode error.
    #[error("invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decode error.
    #[error("invalid TOML settings: {0}")]
    TomlDecode(#[from] toml::de::Error),

    /// TOML encode error.
    #[error("cannot encode settings as TOML: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

impl SettingsError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
