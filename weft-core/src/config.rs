//! Configuration
//!
//! Flat string configuration loaded from an optional JSON file and the
//! process environment, with the environment taking precedence. Nested JSON
//! objects flatten into underscore-joined uppercase keys, so
//! `{"server": {"port": 3000}}` becomes `SERVER_PORT=3000`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Flat key/value application configuration.
#[derive(Default)]
pub struct Config {
    data: RwLock<HashMap<String, String>>,
}

impl Config {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from an optional JSON file, then overlay the environment.
    pub fn load(json_path: Option<&Path>) -> Self {
        let config = Self::new();

        if let Some(path) = json_path {
            if let Ok(bytes) = fs::read(path) {
                if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&bytes) {
                    config.load_map("", &map);
                }
            }
        }

        let mut data = config.data.write();
        for (key, value) in std::env::vars() {
            data.insert(key, value);
        }
        drop(data);

        config
    }

    fn load_map(&self, prefix: &str, map: &Map<String, Value>) {
        for (key, value) in map {
            let flat = if prefix.is_empty() {
                key.to_uppercase()
            } else {
                format!("{prefix}_{}", key.to_uppercase())
            };
            match value {
                Value::Object(nested) => self.load_map(&flat, nested),
                Value::String(s) => {
                    self.data.write().insert(flat, s.clone());
                }
                Value::Number(n) => {
                    self.data.write().insert(flat, n.to_string());
                }
                Value::Bool(b) => {
                    self.data.write().insert(flat, b.to_string());
                }
                _ => {}
            }
        }
    }

    /// String value, or the empty string.
    pub fn get(&self, key: &str) -> String {
        self.data.read().get(key).cloned().unwrap_or_default()
    }

    /// String value, or `default` when unset or empty.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        let value = self.get(key);
        if value.is_empty() {
            default.to_string()
        } else {
            value
        }
    }

    /// Integer value, or 0.
    pub fn int(&self, key: &str) -> i64 {
        self.get(key).parse().unwrap_or(0)
    }

    /// Integer value, or `default` when unset or unparsable.
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        let value = self.get(key);
        if value.is_empty() {
            return default;
        }
        value.parse().unwrap_or(default)
    }

    /// Boolean value: `true` or `1` count as true.
    pub fn bool(&self, key: &str) -> bool {
        let value = self.get(key);
        value == "true" || value == "1"
    }

    /// Set a value at runtime.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().insert(key.into(), value.into());
    }
}
