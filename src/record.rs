#![forbid(unsafe_code)]

//! Field values for declarative rules
//!
//! The engine never reads host objects itself; rule closures do. `Record` is
//! the host object used by rule files and the CLI: a shared, mutable map from
//! target key to string value. Clones share the same storage, so a rule can
//! hold one clone while the application updates another.

use crate::error::ConfigError;
use crate::types::TargetKey;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use crate::engine::{read, write};
use std::sync::{Arc, RwLock};

/// Shared map of field values keyed by target
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Arc<RwLock<BTreeMap<TargetKey, String>>>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from `(key, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<TargetKey>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Record {
            fields: Arc::new(RwLock::new(fields)),
        }
    }

    /// Load values from a `.json` or `.toml` file (chosen by extension)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, cannot be parsed, or
    /// holds a value that is not a string, number, or boolean.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&content),
            _ => Self::parse_toml(&content),
        }
    }

    /// Parse values from a flat TOML table
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let mut pairs = Vec::with_capacity(table.len());

        for (key, value) in table {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: key,
                        message: format!("expected a scalar value, found {}", other.type_str()),
                    });
                }
            };
            pairs.push((key, text));
        }

        Ok(Self::from_pairs(pairs))
    }

    /// Parse values from a flat JSON object
    pub fn parse_json(content: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let serde_json::Value::Object(object) = value else {
            return Err(ConfigError::InvalidSyntax(
                "values file must contain a JSON object".to_string(),
            ));
        };

        let mut pairs = Vec::with_capacity(object.len());
        for (key, value) in object {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: key,
                        message: "expected a scalar value".to_string(),
                    });
                }
            };
            pairs.push((key, text));
        }

        Ok(Self::from_pairs(pairs))
    }

    /// Current value of a field, if set
    pub fn get(&self, key: &TargetKey) -> Option<String> {
        read(&self.fields).get(key).cloned()
    }

    /// Current value of a field; unset fields read as the empty string
    pub fn value(&self, key: &TargetKey) -> String {
        self.get(key).unwrap_or_default()
    }

    /// Values of several fields, in the order given
    pub fn values(&self, keys: &[TargetKey]) -> Vec<String> {
        let fields = read(&self.fields);
        keys.iter()
            .map(|key| fields.get(key).cloned().unwrap_or_default())
            .collect()
    }

    /// Set a field, returning the previous value
    pub fn set(&self, key: impl Into<TargetKey>, value: impl Into<String>) -> Option<String> {
        write(&self.fields).insert(key.into(), value.into())
    }

    /// Keys of all set fields, sorted
    pub fn keys(&self) -> Vec<TargetKey> {
        read(&self.fields).keys().cloned().collect()
    }
}
