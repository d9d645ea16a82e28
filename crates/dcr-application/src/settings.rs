//! Engine-level defaults consumed by handlers at configuration time

use dcr_domain::BindingPolicy;
use serde::{Deserialize, Serialize};

/// Runtime defaults applied when component metadata is silent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Policy of requirements that declare none
    pub default_binding_policy: BindingPolicy,
    /// Inject a no-op stand-in for unresolved optional requirements
    pub nullable_by_default: bool,
    /// Create the object as soon as the instance becomes valid when the
    /// component declares lifecycle callbacks
    pub immediate_by_default: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            default_binding_policy: BindingPolicy::Dynamic,
            nullable_by_default: true,
            immediate_by_default: true,
        }
    }
}

impl RuntimeSettings {
    /// Set the default binding policy
    #[must_use]
    pub fn with_default_binding_policy(mut self, policy: BindingPolicy) -> Self {
        self.default_binding_policy = policy;
        self
    }

    /// Enable or disable nullable stand-ins by default
    #[must_use]
    pub fn with_nullable_by_default(mut self, nullable: bool) -> Self {
        self.nullable_by_default = nullable;
        self
    }

    /// Enable or disable immediate object creation by default
    #[must_use]
    pub fn with_immediate_by_default(mut self, immediate: bool) -> Self {
        self.immediate_by_default = immediate;
        self
    }
}
