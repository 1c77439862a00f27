//! # Configuration Store
//!
//! Per-project settings persisted in `.app_cache/config.toml`. The store is an explicit
//! value owned by whoever opened it; nothing is cached at module level.
//!
//! Built-in defaults (`execution`, `logging`, `styling`) are merged in on load, but only
//! for keys that are missing, so user edits always win. Every mutation is written to
//! disk immediately.

use crate::core::paths;
use crate::models::{
    DefaultConfig, EnvironmentConfig, LoggingConfig, StylingConfig, TemplateRecord,
};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use toml::{Table, Value};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Could not write configuration file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid configuration key '{0}'.")]
    InvalidKey(String),
    #[error("Configuration key '{key}' cannot be nested under a non-table value.")]
    NotATable { key: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    data: Table,
}

impl ConfigStore {
    /// Loads the configuration of the project at `project_root`.
    ///
    /// A missing or malformed file yields the defaults. Opening never writes.
    pub fn open(project_root: &Path) -> ConfigResult<Self> {
        let path = paths::config_path(project_root);
        let mut data = read_table(&path)?;
        merge_missing(&mut data, &default_table());
        Ok(Self { path, data })
    }

    /// Whether the configuration file is present on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up a value by key. Dotted keys walk into nested tables.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let mut current = self.data.get(segments.next()?)?;
        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }
        Some(current)
    }

    /// Like `get`, falling back to `default` when the key is absent.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Stores `value` under `key` and persists the file.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> ConfigResult<()> {
        insert_path(&mut self.data, key, value.into())?;
        self.save()
    }

    /// Removes `key`. Returns whether something was removed; absent keys are not an error.
    pub fn delete(&mut self, key: &str) -> ConfigResult<bool> {
        let removed = remove_path(&mut self.data, key);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn get_all(&self) -> &Table {
        &self.data
    }

    /// Drops every setting and re-applies the built-in defaults.
    pub fn clear(&mut self) -> ConfigResult<()> {
        self.data = default_table();
        self.save()
    }

    /// Writes the configuration through a sibling temporary file and a rename.
    pub fn save(&self) -> ConfigResult<()> {
        let write_err = |source: io::Error| ConfigError::Write {
            path: self.path.display().to_string(),
            source,
        };
        let dir = self
            .path
            .parent()
            .ok_or_else(|| write_err(io::Error::from(ErrorKind::NotFound)))?;
        fs::create_dir_all(dir).map_err(write_err)?;

        let content = toml::to_string_pretty(&self.data)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        log::debug!("Configuration saved to '{}'", self.path.display());
        Ok(())
    }

    // --- Typed accessors ---

    pub fn capture_output(&self) -> bool {
        self.flag("execution.capture_output", true)
    }

    pub fn stack_trace(&self) -> bool {
        self.flag("execution.stack_trace", false)
    }

    /// A boolean setting; missing or non-boolean values read as `default`.
    fn flag(&self, key: &str, default: bool) -> bool {
        self.get_or(key, Value::Boolean(default))
            .as_bool()
            .unwrap_or(default)
    }

    pub fn logging(&self) -> LoggingConfig {
        self.section("logging").unwrap_or_default()
    }

    pub fn styling(&self) -> StylingConfig {
        self.section("styling").unwrap_or_default()
    }

    pub fn environment(&self) -> Option<EnvironmentConfig> {
        self.section("environment")
    }

    pub fn set_environment(&mut self, environment: &EnvironmentConfig) -> ConfigResult<()> {
        self.set("environment", Value::try_from(environment)?)
    }

    pub fn template_record(&self) -> Option<TemplateRecord> {
        self.section("template")
    }

    pub fn set_template_record(&mut self, record: &TemplateRecord) -> ConfigResult<()> {
        self.set("template", Value::try_from(record)?)
    }

    fn section<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?.clone();
        match value.try_into() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("Ignoring invalid '{}' section in configuration: {}", key, e);
                None
            }
        }
    }
}

/// The built-in defaults as a TOML table.
pub fn default_table() -> Table {
    match Value::try_from(DefaultConfig::default()) {
        Ok(Value::Table(table)) => table,
        Ok(_) => Table::new(),
        Err(e) => {
            log::error!("Could not build default configuration: {}", e);
            Table::new()
        }
    }
}

fn read_table(path: &Path) -> ConfigResult<Table> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Table::new()),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            log::warn!(
                "Configuration file '{}' is not valid UTF-8; using defaults.",
                path.display()
            );
            return Ok(Table::new());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source: e,
            });
        }
    };

    match toml::from_str::<Table>(&content) {
        Ok(table) => Ok(table),
        Err(e) => {
            log::warn!(
                "Configuration file '{}' is malformed; using defaults. {}",
                path.display(),
                e
            );
            Ok(Table::new())
        }
    }
}

/// Copies every key of `defaults` that `target` lacks, recursing into tables present on both sides.
fn merge_missing(target: &mut Table, defaults: &Table) {
    for (key, default_value) in defaults {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), default_value.clone());
            }
            Some(Value::Table(existing)) => {
                if let Value::Table(default_table) = default_value {
                    merge_missing(existing, default_table);
                }
            }
            Some(_) => {}
        }
    }
}

fn insert_path(table: &mut Table, key: &str, value: Value) -> ConfigResult<()> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(ConfigError::InvalidKey(key.to_string()));
    }
    let Some((last, parents)) = segments.split_last() else {
        return Err(ConfigError::InvalidKey(key.to_string()));
    };

    let mut current = table;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        current = match entry {
            Value::Table(nested) => nested,
            _ => {
                return Err(ConfigError::NotATable {
                    key: key.to_string(),
                });
            }
        };
    }
    current.insert(last.to_string(), value);
    Ok(())
}

fn remove_path(table: &mut Table, key: &str) -> bool {
    match key.split_once('.') {
        None => table.remove(key).is_some(),
        Some((head, rest)) => match table.get_mut(head) {
            Some(Value::Table(nested)) => remove_path(nested, rest),
            _ => false,
        },
    }
}
