//! Controller handler
//!
//! A component may expose a boolean controller field. Writing `false` to
//! it makes the instance invalid; writing `true` lets it become valid again.

use std::sync::atomic::{AtomicBool, Ordering};

use dcr_domain::{ComponentMetadata, FieldValue, InstanceConfiguration, Result};
use tracing::{debug, warn};

use crate::description::HandlerDescription;
use crate::handler::{Handler, HandlerRegistration};
use crate::instance::InstanceHandle;
use crate::settings::RuntimeSettings;

/// Handler name
pub const CONTROLLER_HANDLER: &str = "controller";

/// Lets the component veto its own validity
#[derive(Default)]
pub struct ControllerHandler {
    instance: InstanceHandle,
    field: String,
    value: AtomicBool,
}

impl ControllerHandler {
    /// Controller field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Current controller value
    pub fn value(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }
}

impl Handler for ControllerHandler {
    fn name(&self) -> &str {
        CONTROLLER_HANDLER
    }

    fn configure(
        &mut self,
        instance: &InstanceHandle,
        metadata: &ComponentMetadata,
        _config: &InstanceConfiguration,
        _settings: &RuntimeSettings,
    ) -> Result<Option<HandlerRegistration>> {
        let Some(field) = &metadata.controller else {
            return Ok(None);
        };
        self.instance = instance.clone();
        self.field = field.clone();
        Ok(Some(HandlerRegistration::empty().with_field(field.clone())))
    }

    fn start(&self) {
        self.value.store(true, Ordering::SeqCst);
    }

    fn stop(&self) {}

    fn is_valid(&self) -> bool {
        self.value()
    }

    fn on_field_get(&self, field: &str, current: &FieldValue) -> FieldValue {
        if field == self.field {
            FieldValue::from(self.value())
        } else {
            current.clone()
        }
    }

    fn on_field_set(&self, field: &str, value: &FieldValue) {
        if field != self.field {
            return;
        }
        let Some(value) = value.as_bool() else {
            warn!(
                instance = %self.instance.name(),
                field,
                "Controller field only accepts booleans"
            );
            return;
        };
        if self.value.swap(value, Ordering::SeqCst) != value {
            debug!(instance = %self.instance.name(), value, "Controller changed");
            self.instance.check_instance_state();
        }
    }

    fn description(&self) -> HandlerDescription {
        HandlerDescription::new(self.name(), self.is_valid())
            .with_attribute("field", self.field.clone())
    }
}
