//! Instance introspection
//!
//! Serializable snapshots of an instance, its handlers and its
//! dependencies, as reported by [`InstanceManager::description`].
//!
//! [`InstanceManager::description`]: crate::instance::InstanceManager::description

use std::collections::BTreeMap;

use dcr_domain::{BindingPolicy, DependencyState, InstanceState, ProviderId};
use serde::{Deserialize, Serialize};

/// Snapshot of one instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDescription {
    /// Instance name
    pub name: String,
    /// Implementation class
    pub class_name: String,
    /// Current state
    pub state: InstanceState,
    /// Number of created component objects
    pub created_objects: usize,
    /// Handler snapshots, in handler order
    pub handlers: Vec<HandlerDescription>,
}

impl InstanceDescription {
    /// Handler snapshot by name
    pub fn handler(&self, name: &str) -> Option<&HandlerDescription> {
        self.handlers.iter().find(|h| h.name == name)
    }

    /// Every dependency snapshot of every handler
    pub fn dependencies(&self) -> impl Iterator<Item = &DependencyDescription> {
        self.handlers.iter().flat_map(|h| h.dependencies.iter())
    }
}

/// Snapshot of one handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerDescription {
    /// Handler name
    pub name: String,
    /// Whether the handler reports valid
    pub valid: bool,
    /// Dependencies tracked by the handler
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyDescription>,
    /// Handler specific attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl HandlerDescription {
    /// Create a bare description
    pub fn new<S: Into<String>>(name: S, valid: bool) -> Self {
        Self {
            name: name.into(),
            valid,
            dependencies: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add a dependency snapshot
    #[must_use]
    pub fn with_dependency(mut self, dependency: DependencyDescription) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute<K: Into<String>, V: Into<serde_json::Value>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Snapshot of one dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescription {
    /// Dependency id
    pub id: String,
    /// Required specification
    pub specification: String,
    /// Current filter text
    pub filter: Option<String>,
    /// Injects every matching provider
    pub aggregate: bool,
    /// Does not affect validity
    pub optional: bool,
    /// Binding policy
    pub policy: BindingPolicy,
    /// Comparator name
    pub comparator: Option<String>,
    /// Fallback injected when optional and unresolved
    pub fallback: Option<String>,
    /// Static binding is frozen
    pub frozen: bool,
    /// Resolution state
    pub state: DependencyState,
    /// Matching providers
    pub matching: Vec<ProviderId>,
    /// Providers currently bound or selected
    pub used: Vec<ProviderId>,
}
