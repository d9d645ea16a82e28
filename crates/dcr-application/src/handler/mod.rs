//! Handler contract
//!
//! A handler is one unit of cross-cutting behavior attached to an
//! instance. The instance manager drives every handler through the same
//! capability set; handlers that care about a field or a method register
//! for it and receive the matching interception callbacks.
//!
//! | Capability | Called by the instance manager |
//! |------------|--------------------------------|
//! | `configure` | once, before the handler is registered |
//! | `start` / `stop` | in handler order / reverse handler order |
//! | `is_valid` | at any time; must be side-effect free |
//! | `state_changed` | after each VALID/INVALID transition, reverse order |
//! | `create_instance` | after each component object creation, handler order |
//! | `on_field_*` / `on_method_*` | for registered fields and methods |

/// Handler catalog: internal handlers and namespace-resolved extensions
pub mod catalog;

use std::sync::Arc;

use dcr_domain::{
    ComponentMetadata, ComponentObject, FieldValue, InstanceConfiguration, InstanceState,
    MethodId, MethodOutcome, Result,
};

use crate::description::HandlerDescription;
use crate::instance::InstanceHandle;
use crate::settings::RuntimeSettings;

pub use catalog::{
    internal_handlers, list_handlers, resolve_handler, HandlerFactoryEntry, HANDLER_FACTORIES,
};

/// Fields and methods a handler wants to intercept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerRegistration {
    /// Intercepted field names
    pub fields: Vec<String>,
    /// Intercepted method identifiers
    pub methods: Vec<MethodId>,
}

impl HandlerRegistration {
    /// Registration without interception
    pub fn empty() -> Self {
        Self::default()
    }

    /// Intercept a field
    #[must_use]
    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Intercept methods
    #[must_use]
    pub fn with_methods<I: IntoIterator<Item = MethodId>>(mut self, methods: I) -> Self {
        self.methods.extend(methods);
        self
    }
}

/// Pluggable unit of instance behavior
pub trait Handler: Send + Sync {
    /// Handler name, unique within an instance
    fn name(&self) -> &str;

    /// Read metadata and configuration
    ///
    /// `Ok(None)` means the handler has nothing to do for this component and
    /// is not registered. Errors are logged and the handler is skipped.
    fn configure(
        &mut self,
        instance: &InstanceHandle,
        metadata: &ComponentMetadata,
        config: &InstanceConfiguration,
        settings: &RuntimeSettings,
    ) -> Result<Option<HandlerRegistration>>;

    /// Start the handler
    fn start(&self);

    /// Stop the handler
    fn stop(&self);

    /// Whether the handler lets the instance be valid
    fn is_valid(&self) -> bool {
        true
    }

    /// The instance entered `state`
    fn state_changed(&self, _state: InstanceState) {}

    /// Apply a new configuration
    fn reconfigure(&self, _config: &InstanceConfiguration) -> Result<()> {
        Ok(())
    }

    /// A component object was created
    fn create_instance(&self, _object: &Arc<dyn ComponentObject>) {}

    /// A registered field is read; return `current` to leave it unchanged
    fn on_field_get(&self, _field: &str, current: &FieldValue) -> FieldValue {
        current.clone()
    }

    /// A registered field is written
    fn on_field_set(&self, _field: &str, _value: &FieldValue) {}

    /// A registered method is entered
    fn on_method_entry(&self, _method: &MethodId) {}

    /// A registered method returned
    fn on_method_exit(&self, _method: &MethodId, _outcome: &MethodOutcome) {}

    /// A registered method failed
    fn on_method_error(&self, _method: &MethodId, _error: &str) {}

    /// A registered method completed, whatever the outcome
    fn on_method_finally(&self, _method: &MethodId) {}

    /// Introspection snapshot
    fn description(&self) -> HandlerDescription {
        HandlerDescription::new(self.name(), self.is_valid())
    }
}
