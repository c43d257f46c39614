//! Persisted view settings.
//!
//! Browse lists remember column widths, the visible column list and the
//! active sorter between sessions. They do so through the [`PersistedStore`]
//! trait, so hosts can plug in whatever property table they already have.
//! [`Settings`] is the stock implementation: a hierarchical key-value store
//! that persists to JSON or TOML files and announces changes via a signal.
//!
//! # Path-Based Access
//!
//! Paths can use either "." or "/" as separators:
//!
//! ```
//! use horizon_browse::settings::Settings;
//!
//! let settings = Settings::new();
//! settings.set("lexicon.window.width", 1024);
//! settings.set("lexicon/theme", "dark");
//!
//! assert_eq!(settings.get::<i32>("lexicon/window/width"), Some(1024));
//! assert_eq!(settings.get_or("lexicon.missing", 7), 7);
//! ```
//!
//! # Persistence
//!
//! ```ignore
//! settings.save_json("browse.json")?;
//! let settings = Settings::load_json("browse.json")?;
//!
//! // Or keep the file in sync on every change.
//! settings.set_auto_save("browse.toml", SettingsFormat::Toml);
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use horizon_browse_core::Signal;
use horizon_browse_core::logging::targets;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Key-value persistence used by browse lists.
///
/// Keys are deterministic strings built by the caller, for example
/// `"{view}_{column}_Width"`.
pub trait PersistedStore: Send + Sync {
    /// Reads an integer, or `None` when nothing is stored under `key`.
    fn get_int(&self, key: &str) -> Option<i64>;

    /// Stores an integer under `key`.
    fn set_int(&self, key: &str, value: i64);

    /// Reads a string, or `None` when nothing is stored under `key`.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Stores a string under `key`.
    fn set_string(&self, key: &str, value: &str);
}

/// A value that can be stored in settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingsValue {
    /// A null/empty value.
    #[default]
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Integer(i64),
    /// A 64-bit floating point number.
    Float(f64),
    /// A string value.
    String(String),
    /// An array of values.
    Array(Vec<SettingsValue>),
    /// A nested table.
    Object(HashMap<String, SettingsValue>),
}

impl SettingsValue {
    /// Returns this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingsValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SettingsValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns this value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingsValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&Vec<SettingsValue>> {
        match self {
            SettingsValue::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for SettingsValue {
    fn from(v: bool) -> Self {
        SettingsValue::Bool(v)
    }
}

impl From<i32> for SettingsValue {
    fn from(v: i32) -> Self {
        SettingsValue::Integer(i64::from(v))
    }
}

impl From<i64> for SettingsValue {
    fn from(v: i64) -> Self {
        SettingsValue::Integer(v)
    }
}

impl From<String> for SettingsValue {
    fn from(v: String) -> Self {
        SettingsValue::String(v)
    }
}

impl From<&str> for SettingsValue {
    fn from(v: &str) -> Self {
        SettingsValue::String(v.to_string())
    }
}

impl<T: Into<SettingsValue>> From<Vec<T>> for SettingsValue {
    fn from(v: Vec<T>) -> Self {
        SettingsValue::Array(v.into_iter().map(Into::into).collect())
    }
}

/// The format for settings file persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// JSON format.
    Json,
    /// TOML format.
    Toml,
}

#[derive(Debug, Clone)]
struct AutoSaveConfig {
    path: PathBuf,
    format: SettingsFormat,
}

/// A hierarchical key-value settings store.
pub struct Settings {
    data: RwLock<HashMap<String, SettingsValue>>,
    /// Emitted with the full key path whenever a value is modified.
    changed: Signal<String>,
    auto_save: RwLock<Option<AutoSaveConfig>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("keys", &self.data.read().len())
            .field("auto_save", &*self.auto_save.read())
            .finish()
    }
}

impl Settings {
    /// Creates a new empty settings store.
    pub fn new() -> Self {
        Self::from_data(HashMap::new())
    }

    /// Creates settings from a nested map.
    pub fn from_data(data: HashMap<String, SettingsValue>) -> Self {
        Self {
            data: RwLock::new(data),
            changed: Signal::new(),
            auto_save: RwLock::new(None),
        }
    }

    /// Signal emitted whenever a setting value is modified.
    pub fn changed(&self) -> &Signal<String> {
        &self.changed
    }

    /// Persists every subsequent change to `path` in the given format.
    pub fn set_auto_save(&self, path: impl AsRef<Path>, format: SettingsFormat) {
        *self.auto_save.write() = Some(AutoSaveConfig {
            path: path.as_ref().to_path_buf(),
            format,
        });
    }

    /// Disables auto-save.
    pub fn disable_auto_save(&self) {
        *self.auto_save.write() = None;
    }

    /// Sets a value at the specified path, creating intermediate tables.
    pub fn set<V: Into<SettingsValue>>(&self, path: &str, value: V) {
        let parts = Self::parse_path(path);
        if parts.is_empty() {
            return;
        }

        {
            let mut data = self.data.write();
            Self::set_nested(&mut data, &parts, value.into());
        }

        self.changed.emit(path.to_string());
        self.try_auto_save();
    }

    /// Gets a value at the specified path.
    ///
    /// Returns `None` if the path doesn't exist or the value has another type.
    pub fn get<T: FromSettingsValue>(&self, path: &str) -> Option<T> {
        let data = self.data.read();
        let parts = Self::parse_path(path);
        Self::get_nested(&data, &parts).and_then(T::from_settings_value)
    }

    /// Gets a value at the specified path, or returns the default.
    pub fn get_or<T: FromSettingsValue>(&self, path: &str, default: T) -> T {
        self.get(path).unwrap_or(default)
    }

    /// Returns true if a value exists at the specified path.
    pub fn contains(&self, path: &str) -> bool {
        let data = self.data.read();
        Self::get_nested(&data, &Self::parse_path(path)).is_some()
    }

    /// Removes a value at the specified path, returning it.
    pub fn remove(&self, path: &str) -> Option<SettingsValue> {
        let parts = Self::parse_path(path);
        let removed = {
            let mut data = self.data.write();
            Self::remove_nested(&mut data, &parts)
        };

        if removed.is_some() {
            self.changed.emit(path.to_string());
            self.try_auto_save();
        }
        removed
    }

    /// Returns the number of top-level keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if there are no settings.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Loads settings from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = read_text(path.as_ref())?;
        let data: HashMap<String, SettingsValue> = serde_json::from_str(&content)?;
        Ok(Self::from_data(data))
    }

    /// Loads settings from a TOML file.
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = read_text(path.as_ref())?;
        let table: toml::Table = content.parse()?;
        match Self::toml_to_settings(toml::Value::Table(table)) {
            SettingsValue::Object(map) => Ok(Self::from_data(map)),
            _ => Ok(Self::new()),
        }
    }

    /// Saves settings to a JSON file, atomically.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(&*self.data.read())?;
        write_atomically(path.as_ref(), &json)
    }

    /// Saves settings to a TOML file, atomically.
    pub fn save_toml(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let value = Self::settings_to_toml(&SettingsValue::Object(self.data.read().clone()));
        let text = toml::to_string_pretty(&value)?;
        write_atomically(path.as_ref(), &text)
    }

    /// Writes to the auto-save file now, if auto-save is enabled.
    pub fn sync(&self) -> Result<(), SettingsError> {
        let config = self.auto_save.read().clone();
        match config {
            Some(config) => match config.format {
                SettingsFormat::Json => self.save_json(&config.path),
                SettingsFormat::Toml => self.save_toml(&config.path),
            },
            None => Ok(()),
        }
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn parse_path(path: &str) -> Vec<&str> {
        path.split(['.', '/']).filter(|s| !s.is_empty()).collect()
    }

    fn get_nested<'a>(
        data: &'a HashMap<String, SettingsValue>,
        parts: &[&str],
    ) -> Option<&'a SettingsValue> {
        let (first, rest) = parts.split_first()?;
        let value = data.get(*first)?;
        if rest.is_empty() {
            return Some(value);
        }
        match value {
            SettingsValue::Object(obj) => Self::get_nested(obj, rest),
            _ => None,
        }
    }

    fn set_nested(data: &mut HashMap<String, SettingsValue>, parts: &[&str], value: SettingsValue) {
        let Some((first, rest)) = parts.split_first() else {
            return;
        };

        if rest.is_empty() {
            data.insert(first.to_string(), value);
            return;
        }

        let entry = data
            .entry(first.to_string())
            .or_insert_with(|| SettingsValue::Object(HashMap::new()));
        if !matches!(entry, SettingsValue::Object(_)) {
            *entry = SettingsValue::Object(HashMap::new());
        }
        if let SettingsValue::Object(obj) = entry {
            Self::set_nested(obj, rest, value);
        }
    }

    fn remove_nested(
        data: &mut HashMap<String, SettingsValue>,
        parts: &[&str],
    ) -> Option<SettingsValue> {
        let (first, rest) = parts.split_first()?;
        if rest.is_empty() {
            return data.remove(*first);
        }
        match data.get_mut(*first)? {
            SettingsValue::Object(obj) => Self::remove_nested(obj, rest),
            _ => None,
        }
    }

    fn try_auto_save(&self) {
        if let Err(e) = self.sync() {
            tracing::error!(target: targets::SETTINGS, "failed to auto-save settings: {}", e);
        }
    }

    fn toml_to_settings(value: toml::Value) -> SettingsValue {
        match value {
            toml::Value::String(s) => SettingsValue::String(s),
            toml::Value::Integer(i) => SettingsValue::Integer(i),
            toml::Value::Float(f) => SettingsValue::Float(f),
            toml::Value::Boolean(b) => SettingsValue::Bool(b),
            toml::Value::Datetime(dt) => SettingsValue::String(dt.to_string()),
            toml::Value::Array(arr) => {
                SettingsValue::Array(arr.into_iter().map(Self::toml_to_settings).collect())
            }
            toml::Value::Table(table) => SettingsValue::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_settings(v)))
                    .collect(),
            ),
        }
    }

    fn settings_to_toml(value: &SettingsValue) -> toml::Value {
        match value {
            // TOML has no null; an empty string is the closest round-trippable value.
            SettingsValue::Null => toml::Value::String(String::new()),
            SettingsValue::Bool(b) => toml::Value::Boolean(*b),
            SettingsValue::Integer(i) => toml::Value::Integer(*i),
            SettingsValue::Float(f) => toml::Value::Float(*f),
            SettingsValue::String(s) => toml::Value::String(s.clone()),
            SettingsValue::Array(arr) => {
                toml::Value::Array(arr.iter().map(Self::settings_to_toml).collect())
            }
            SettingsValue::Object(obj) => toml::Value::Table(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::settings_to_toml(v)))
                    .collect(),
            ),
        }
    }
}

impl PersistedStore for Settings {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key)
    }

    fn set_int(&self, key: &str, value: i64) {
        self.set(key, value);
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    fn set_string(&self, key: &str, value: &str) {
        self.set(key, value);
    }
}

fn read_text(path: &Path) -> Result<String, SettingsError> {
    std::fs::read_to_string(path).map_err(|e| SettingsError::io(path, e))
}

fn write_atomically(path: &Path, contents: &str) -> Result<(), SettingsError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| SettingsError::io(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| SettingsError::io(path, e))?;
    file.persist(path)
        .map_err(|e| SettingsError::io(path, e.error))?;
    Ok(())
}

/// Trait for types that can be extracted from a [`SettingsValue`].
pub trait FromSettingsValue: Sized {
    /// Attempts to convert a `SettingsValue` to this type.
    fn from_settings_value(value: &SettingsValue) -> Option<Self>;
}

impl FromSettingsValue for bool {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromSettingsValue for i32 {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_integer().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromSettingsValue for i64 {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_integer()
    }
}

impl FromSettingsValue for String {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl<T: FromSettingsValue> FromSettingsValue for Vec<T> {
    fn from_settings_value(value: &SettingsValue) -> Option<Self> {
        value
            .as_array()
            .and_then(|arr| arr.iter().map(T::from_settings_value).collect())
    }
}

static_assertions::assert_impl_all!(Settings: Send, Sync);
