//! Lifecycle callback handler
//!
//! Calls the component's `validate` methods when the instance becomes
//! VALID and its `invalidate` methods when it leaves VALID. Immediate
//! components get their object created on validation.

use dcr_domain::{ComponentMetadata, InstanceConfiguration, InstanceState, Result, Transition};
use tracing::debug;

use crate::description::HandlerDescription;
use crate::dispatcher::CallbackDispatcher;
use crate::handler::{Handler, HandlerRegistration};
use crate::instance::InstanceHandle;
use crate::settings::RuntimeSettings;

/// Handler name
pub const LIFECYCLE_CALLBACK_HANDLER: &str = "lifecycle-callback";

/// Invokes validate/invalidate callbacks
#[derive(Default)]
pub struct LifecycleCallbackHandler {
    instance: InstanceHandle,
    dispatcher: CallbackDispatcher,
    immediate: bool,
    validate: Vec<String>,
    invalidate: Vec<String>,
}

impl LifecycleCallbackHandler {
    /// Whether the object is created as soon as the instance is valid
    pub fn is_immediate(&self) -> bool {
        self.immediate
    }

    fn invoke_all(&self, methods: &[String]) {
        if methods.is_empty() {
            return;
        }
        for object in self.instance.pojo_objects() {
            for method in methods {
                if self.dispatcher.invoke_lifecycle(&object, method).is_err() {
                    return;
                }
            }
        }
    }
}

impl Handler for LifecycleCallbackHandler {
    fn name(&self) -> &str {
        LIFECYCLE_CALLBACK_HANDLER
    }

    fn configure(
        &mut self,
        instance: &InstanceHandle,
        metadata: &ComponentMetadata,
        _config: &InstanceConfiguration,
        settings: &RuntimeSettings,
    ) -> Result<Option<HandlerRegistration>> {
        let (validate, invalidate): (Vec<_>, Vec<_>) = metadata
            .callbacks
            .iter()
            .partition(|c| c.transition == Transition::Validate);
        self.validate = validate.into_iter().map(|c| c.method.clone()).collect();
        self.invalidate = invalidate.into_iter().map(|c| c.method.clone()).collect();
        self.immediate = metadata
            .immediate
            .unwrap_or(settings.immediate_by_default && !metadata.callbacks.is_empty());

        if metadata.callbacks.is_empty() && !self.immediate {
            return Ok(None);
        }
        self.instance = instance.clone();
        self.dispatcher = CallbackDispatcher::new(instance.clone());
        Ok(Some(HandlerRegistration::empty()))
    }

    fn start(&self) {}

    fn stop(&self) {}

    fn state_changed(&self, state: InstanceState) {
        match state {
            InstanceState::Valid => {
                // a queued notification may arrive after the instance moved on
                if self.instance.state() != InstanceState::Valid {
                    return;
                }
                if self.immediate && self.instance.pojo_object().is_err() {
                    return;
                }
                debug!(instance = %self.instance.name(), "Invoking validate callbacks");
                self.invoke_all(&self.validate);
            }
            InstanceState::Invalid => {
                debug!(instance = %self.instance.name(), "Invoking invalidate callbacks");
                self.invoke_all(&self.invalidate);
            }
            InstanceState::Stopped | InstanceState::Disposed => {}
        }
    }

    fn description(&self) -> HandlerDescription {
        HandlerDescription::new(self.name(), self.is_valid())
            .with_attribute("immediate", self.immediate)
            .with_attribute("validate", self.validate.clone())
            .with_attribute("invalidate", self.invalidate.clone())
    }
}
