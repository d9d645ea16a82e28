//! Weak handle on an instance
//!
//! Handlers, dependencies and component objects keep an [`InstanceHandle`]
//! rather than the manager itself, so nothing they hold keeps a disposed
//! instance alive. Every operation degrades to a no-op once the manager is
//! gone.

use std::sync::{Arc, Weak};

use dcr_domain::{
    ComponentObject, FieldValue, InstanceState, MethodId, MethodOutcome, Result, ServiceRegistry,
};

use crate::instance::InstanceManager;
use crate::ports::ComponentType;

/// Non-owning reference to an [`InstanceManager`]
#[derive(Clone, Default)]
pub struct InstanceHandle {
    manager: Weak<InstanceManager>,
}

impl InstanceHandle {
    pub(crate) fn new(manager: Weak<InstanceManager>) -> Self {
        Self { manager }
    }

    /// The manager, if it is still alive
    pub fn upgrade(&self) -> Option<Arc<InstanceManager>> {
        self.manager.upgrade()
    }

    /// Instance name, empty once the manager is gone
    pub fn name(&self) -> String {
        self.upgrade()
            .map(|m| m.name().to_string())
            .unwrap_or_default()
    }

    /// Implementation class name
    pub fn class_name(&self) -> String {
        self.upgrade()
            .map(|m| m.class_name().to_string())
            .unwrap_or_default()
    }

    /// Current state; [`InstanceState::Disposed`] once the manager is gone
    pub fn state(&self) -> InstanceState {
        self.upgrade()
            .map_or(InstanceState::Disposed, |m| m.state())
    }

    /// Created component objects
    pub fn pojo_objects(&self) -> Vec<Arc<dyn ComponentObject>> {
        self.upgrade().map(|m| m.pojo_objects()).unwrap_or_default()
    }

    /// First component object, created on demand
    pub fn pojo_object(&self) -> Result<Arc<dyn ComponentObject>> {
        match self.upgrade() {
            Some(manager) => manager.pojo_object(),
            None => Err(dcr_domain::Error::invalid_state("instance is gone")),
        }
    }

    /// Recompute the instance validity
    pub fn check_instance_state(&self) {
        if let Some(manager) = self.upgrade() {
            manager.check_instance_state();
        }
    }

    /// Stop the instance
    pub fn stop(&self) {
        if let Some(manager) = self.upgrade() {
            manager.stop();
        }
    }

    /// Component type of the instance
    pub fn component_type(&self) -> Option<Arc<dyn ComponentType>> {
        self.upgrade().map(|m| Arc::clone(m.component_type()))
    }

    /// Registry the instance resolves against
    pub fn registry(&self) -> Option<Arc<dyn ServiceRegistry>> {
        self.upgrade().map(|m| Arc::clone(m.registry()))
    }

    /// Intercepted read of `field`
    pub fn get_field(&self, field: &str, current: &FieldValue) -> FieldValue {
        match self.upgrade() {
            Some(manager) => manager.getter_callback(field, current),
            None => current.clone(),
        }
    }

    /// Intercepted write of `field`
    pub fn set_field(&self, field: &str, value: &FieldValue) {
        if let Some(manager) = self.upgrade() {
            manager.setter_callback(field, value);
        }
    }

    /// Intercepted method entry; the guard reports the exit when dropped
    pub fn enter(&self, method: &MethodId) -> MethodGuard {
        if let Some(manager) = self.upgrade() {
            manager.entry_callback(method);
        }
        MethodGuard {
            instance: self.clone(),
            method: method.clone(),
            outcome: None,
        }
    }
}

/// Reports the completion of an intercepted method
///
/// Without an explicit [`returned`](Self::returned) or
/// [`failed`](Self::failed), the method is reported as returning nothing.
#[must_use = "dropping the guard immediately reports the method as completed"]
pub struct MethodGuard {
    instance: InstanceHandle,
    method: MethodId,
    outcome: Option<MethodOutcome>,
}

impl MethodGuard {
    /// Record a return value
    pub fn returned(&mut self, value: Option<serde_json::Value>) {
        self.outcome = Some(MethodOutcome::Returned(value));
    }

    /// Record a failure
    pub fn failed<S: Into<String>>(&mut self, message: S) {
        self.outcome = Some(MethodOutcome::Failed(message.into()));
    }
}

impl Drop for MethodGuard {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or(MethodOutcome::Returned(None));
        if let Some(manager) = self.instance.upgrade() {
            manager.exit_callback(&self.method, &outcome);
        }
    }
}
