//! Per-view configuration.
//!
//! Hosts usually keep browse view definitions in configuration files. Any
//! field may be omitted:
//!
//! ```
//! use horizon_browse::options::BrowseOptions;
//!
//! let options = BrowseOptions::from_toml_str(r#"
//!     view_id = "lexiconEdit"
//!     default_checked = true
//! "#).unwrap();
//!
//! assert_eq!(options.view_id, "lexiconEdit");
//! assert!(options.has_select_column);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result as BrowseResult, SettingsError};
use crate::item::ItemId;

/// Configuration of one browse view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseOptions {
    /// Identity used in persisted keys and the selection cache.
    pub view_id: String,
    /// Width the columns are laid out in, in device-independent pixels.
    pub available_width: i32,
    /// State of items without an explicit check-box choice.
    pub default_checked: bool,
    /// Whether the view shows check boxes at all.
    pub has_select_column: bool,
    /// Root object of the listed items, part of the selection cache key.
    pub root: Option<ItemId>,
}

impl Default for BrowseOptions {
    fn default() -> Self {
        Self {
            view_id: "browse".to_string(),
            available_width: 800,
            default_checked: false,
            has_select_column: true,
            root: None,
        }
    }
}

impl BrowseOptions {
    /// Creates default options for `view_id`.
    pub fn new(view_id: impl Into<String>) -> Self {
        Self {
            view_id: view_id.into(),
            ..Self::default()
        }
    }

    /// Parses options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> BrowseResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SettingsError::io(path, e))?;
        Ok(Self::from_toml_str(&text)?)
    }

    /// Serializes the options as TOML.
    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string(self)?)
    }
}
