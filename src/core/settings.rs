//! Load settings produced by view types.
//!
//! A `Settings` object is a schema of named, typed options plus the values a
//! caller chose for them. View types return one from
//! `load_settings_for_data` so tooling can present or override loader options
//! before full construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while reading or updating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    #[error("Type mismatch for setting {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: SettingKind,
        found: SettingKind,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The declared type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingKind {
    Boolean,
    Number,
    String,
    StringList,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingKind::Boolean => write!(f, "boolean"),
            SettingKind::Number => write!(f, "number"),
            SettingKind::String => write!(f, "string"),
            SettingKind::StringList => write!(f, "array"),
        }
    }
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Boolean(bool),
    Number(u64),
    String(String),
    StringList(Vec<String>),
}

impl SettingValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Boolean(_) => SettingKind::Boolean,
            SettingValue::Number(_) => SettingKind::Number,
            SettingValue::String(_) => SettingKind::String,
            SettingValue::StringList(_) => SettingKind::StringList,
        }
    }
}

/// Declaration of one option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingSchema {
    pub title: String,
    pub description: String,
    pub default: SettingValue,
}

impl SettingSchema {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        default: SettingValue,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            default,
        }
    }

    pub fn kind(&self) -> SettingKind {
        self.default.kind()
    }
}

/// A set of declared options and their current values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    schema: BTreeMap<String, SettingSchema>,
    values: BTreeMap<String, SettingValue>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an option. Re-declaring a key replaces its schema and clears any
    /// value that no longer matches the declared type.
    pub fn register(&mut self, key: impl Into<String>, schema: SettingSchema) {
        let key = key.into();
        if let Some(v) = self.values.get(&key) {
            if v.kind() != schema.kind() {
                self.values.remove(&key);
            }
        }
        self.schema.insert(key, schema);
    }

    /// Builder-style `register`.
    pub fn with_setting(mut self, key: impl Into<String>, schema: SettingSchema) -> Self {
        self.register(key, schema);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.schema.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.schema.keys()
    }

    pub fn schema(&self, key: &str) -> Option<&SettingSchema> {
        self.schema.get(key)
    }

    /// Set a value, checking the key is declared and the type matches.
    pub fn set(&mut self, key: &str, value: SettingValue) -> Result<(), SettingsError> {
        let schema = self
            .schema
            .get(key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        if schema.kind() != value.kind() {
            return Err(SettingsError::TypeMismatch {
                key: key.to_string(),
                expected: schema.kind(),
                found: value.kind(),
            });
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Drop an explicit value so the default applies again.
    pub fn reset(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// Current value, falling back to the declared default.
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values
            .get(key)
            .or_else(|| self.schema.get(key).map(|s| &s.default))
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            SettingValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            SettingValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Serialize only the explicitly set values as a JSON object.
    pub fn values_to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(&self.values)?)
    }

    /// Apply a JSON object of values; every key must be declared and typed
    /// correctly. Nothing is applied if any entry is rejected.
    pub fn apply_json(&mut self, json: &str) -> Result<(), SettingsError> {
        let incoming: BTreeMap<String, SettingValue> = serde_json::from_str(json)?;
        let mut staged = self.clone();
        for (key, value) in incoming {
            staged.set(&key, value)?;
        }
        *self = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        Settings::new()
            .with_setting(
                "loader.imageBase",
                SettingSchema::new("Image Base", "Rebase address", SettingValue::Number(0)),
            )
            .with_setting(
                "loader.platform",
                SettingSchema::new(
                    "Platform",
                    "Platform override",
                    SettingValue::String(String::new()),
                ),
            )
    }

    #[test]
    fn test_default_values() {
        let s = sample();
        assert_eq!(s.get_u64("loader.imageBase"), Some(0));
        assert_eq!(s.get_string("loader.platform"), Some(""));
        assert!(s.get("loader.unknown").is_none());
    }

    #[test]
    fn test_set_checks_type() {
        let mut s = sample();
        s.set("loader.imageBase", SettingValue::Number(0x400000))
            .unwrap();
        assert_eq!(s.get_u64("loader.imageBase"), Some(0x400000));

        let err = s
            .set("loader.imageBase", SettingValue::Boolean(true))
            .unwrap_err();
        assert!(matches!(err, SettingsError::TypeMismatch { .. }));

        let err = s
            .set("loader.bogus", SettingValue::Boolean(true))
            .unwrap_err();
        assert!(matches!(err, SettingsError::UnknownKey(_)));
    }

    #[test]
    fn test_json_values_round_trip() {
        let mut s = sample();
        s.set("loader.platform", SettingValue::String("linux-x86_64".into()))
            .unwrap();
        let json = s.values_to_json().unwrap();

        let mut other = sample();
        other.apply_json(&json).unwrap();
        assert_eq!(other.get_string("loader.platform"), Some("linux-x86_64"));
    }

    #[test]
    fn test_apply_json_is_all_or_nothing() {
        let mut s = sample();
        let err = s
            .apply_json(r#"{"loader.imageBase": 4096, "loader.nope": true}"#)
            .unwrap_err();
        assert!(matches!(err, SettingsError::UnknownKey(_)));
        assert_eq!(s.get_u64("loader.imageBase"), Some(0));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut s = sample();
        s.set("loader.imageBase", SettingValue::Number(1)).unwrap();
        s.reset("loader.imageBase");
        assert_eq!(s.get_u64("loader.imageBase"), Some(0));
    }
}
