//! Instance configuration

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{CONFIG_NAME, CONFIG_REQUIRES_FILTERS};
use crate::error::{Error, Result};

/// Key/value configuration of one component instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceConfiguration(BTreeMap<String, Value>);

impl InstanceConfiguration {
    /// Empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration carrying only an instance name
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self::new().with(CONFIG_NAME, Value::String(name.into()))
    }

    /// Add or replace an entry
    #[must_use]
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Add or replace an entry in place
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    /// Entry lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the configuration contains `key`
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Instance name, when configured
    pub fn name(&self) -> Option<&str> {
        self.0.get(CONFIG_NAME).and_then(Value::as_str)
    }

    /// Per-dependency filter overrides
    ///
    /// Returns an empty map when the key is absent; a value that is not an
    /// object of strings is a configuration error.
    pub fn requires_filters(&self) -> Result<BTreeMap<String, String>> {
        let Some(value) = self.0.get(CONFIG_REQUIRES_FILTERS) else {
            return Ok(BTreeMap::new());
        };
        let Value::Object(entries) = value else {
            return Err(Error::configuration(format!(
                "'{CONFIG_REQUIRES_FILTERS}' must map dependency ids to filters"
            )));
        };
        entries
            .iter()
            .map(|(id, filter)| {
                filter
                    .as_str()
                    .map(|f| (id.clone(), f.to_string()))
                    .ok_or_else(|| {
                        Error::configuration(format!(
                            "filter override for '{id}' must be a string"
                        ))
                    })
            })
            .collect()
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for InstanceConfiguration {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
