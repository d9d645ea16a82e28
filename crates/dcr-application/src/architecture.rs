//! Architecture handler
//!
//! Attached to every instance. Keeps a short history of state transitions
//! and exposes the instance description to management tooling.

use std::collections::VecDeque;

use dcr_domain::{ComponentMetadata, InstanceConfiguration, InstanceState, Result};
use parking_lot::Mutex;

use crate::description::{HandlerDescription, InstanceDescription};
use crate::handler::{Handler, HandlerRegistration};
use crate::instance::InstanceHandle;
use crate::settings::RuntimeSettings;

/// Handler name
pub const ARCHITECTURE_HANDLER: &str = "architecture";

const HISTORY_LIMIT: usize = 32;

/// Introspection hook of an instance
#[derive(Default)]
pub struct ArchitectureHandler {
    instance: InstanceHandle,
    history: Mutex<VecDeque<InstanceState>>,
}

impl ArchitectureHandler {
    /// Recent VALID/INVALID transitions, oldest first
    pub fn history(&self) -> Vec<InstanceState> {
        self.history.lock().iter().copied().collect()
    }

    /// Description of the whole instance
    pub fn instance_description(&self) -> Option<InstanceDescription> {
        self.instance.upgrade().map(|manager| manager.description())
    }
}

impl Handler for ArchitectureHandler {
    fn name(&self) -> &str {
        ARCHITECTURE_HANDLER
    }

    fn configure(
        &mut self,
        instance: &InstanceHandle,
        _metadata: &ComponentMetadata,
        _config: &InstanceConfiguration,
        _settings: &RuntimeSettings,
    ) -> Result<Option<HandlerRegistration>> {
        self.instance = instance.clone();
        Ok(Some(HandlerRegistration::empty()))
    }

    fn start(&self) {
        self.history.lock().clear();
    }

    fn stop(&self) {}

    fn state_changed(&self, state: InstanceState) {
        let mut history = self.history.lock();
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(state);
    }

    fn description(&self) -> HandlerDescription {
        let history: Vec<&str> = self.history.lock().iter().map(|s| s.label()).collect();
        HandlerDescription::new(self.name(), self.is_valid())
            .with_attribute("instance", self.instance.name())
            .with_attribute("class_name", self.instance.class_name())
            .with_attribute("history", history)
    }
}
