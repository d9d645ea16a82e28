//! Dependency handler
//!
//! Owns one [`Dependency`] per declared requirement. The instance is valid
//! only while every dependency is satisfied.

use std::sync::Arc;

use dcr_domain::{
    ComponentMetadata, ComponentObject, Error, FieldValue, Filter, InstanceConfiguration,
    MethodId, Result,
};
use tracing::{debug, error, warn};

use crate::dependency::{Dependency, DependencyConfig};
use crate::description::HandlerDescription;
use crate::handler::{Handler, HandlerRegistration};
use crate::instance::InstanceHandle;
use crate::settings::RuntimeSettings;

/// Handler name
pub const DEPENDENCY_HANDLER: &str = "dependency";

/// Binds the service requirements of an instance
#[derive(Default)]
pub struct DependencyHandler {
    instance: InstanceHandle,
    dependencies: Vec<Arc<Dependency>>,
}

impl DependencyHandler {
    /// Managed dependencies, in declaration order
    pub fn dependencies(&self) -> &[Arc<Dependency>] {
        &self.dependencies
    }

    /// Dependency by id
    pub fn dependency(&self, id: &str) -> Option<&Arc<Dependency>> {
        self.dependencies.iter().find(|d| d.id() == id)
    }

    fn injecting(&self) -> impl Iterator<Item = &Arc<Dependency>> {
        self.dependencies.iter().filter(|d| d.field().is_some())
    }
}

impl Handler for DependencyHandler {
    fn name(&self) -> &str {
        DEPENDENCY_HANDLER
    }

    fn configure(
        &mut self,
        instance: &InstanceHandle,
        metadata: &ComponentMetadata,
        config: &InstanceConfiguration,
        settings: &RuntimeSettings,
    ) -> Result<Option<HandlerRegistration>> {
        if metadata.requires.is_empty() {
            return Ok(None);
        }
        self.instance = instance.clone();
        let component_type = instance
            .component_type()
            .ok_or_else(|| Error::invalid_state("instance is gone"))?;
        let registry = instance
            .registry()
            .ok_or_else(|| Error::invalid_state("instance is gone"))?;
        let filters = config.requires_filters()?;

        let mut registration = HandlerRegistration::empty();
        for requirement in &metadata.requires {
            let id = requirement.id();
            if self.dependency(id).is_some() {
                error!(
                    instance = %instance.name(),
                    dependency = id,
                    "Duplicate dependency id; skipping the requirement"
                );
                continue;
            }

            let mut requirement = requirement.clone();
            if let Some(filter) = filters.get(id) {
                requirement.filter = Some(filter.clone());
            }
            match DependencyConfig::from_metadata(&requirement, settings, component_type.as_ref()) {
                Ok(dependency) => {
                    if let Some(field) = &dependency.field {
                        registration = registration.with_field(field.clone());
                    }
                    self.dependencies.push(Dependency::new(
                        instance.clone(),
                        Arc::clone(&registry),
                        dependency,
                    ));
                }
                Err(e) => error!(
                    instance = %instance.name(),
                    dependency = id,
                    error = %e,
                    "Invalid requirement; skipping it"
                ),
            }
        }

        if self.dependencies.is_empty() {
            return Ok(None);
        }
        if self.injecting().next().is_some() {
            registration = registration.with_methods(metadata.method_ids());
        }
        debug!(
            instance = %instance.name(),
            dependencies = self.dependencies.len(),
            "Dependency handler configured"
        );
        Ok(Some(registration))
    }

    fn start(&self) {
        for dependency in &self.dependencies {
            if let Err(e) = dependency.start() {
                error!(
                    instance = %self.instance.name(),
                    dependency = %dependency.id(),
                    error = %e,
                    "Cannot start dependency"
                );
            }
        }
    }

    fn stop(&self) {
        for dependency in &self.dependencies {
            dependency.stop();
        }
    }

    fn is_valid(&self) -> bool {
        self.dependencies.iter().all(|d| d.state().is_satisfied())
    }

    fn reconfigure(&self, config: &InstanceConfiguration) -> Result<()> {
        let filters = config.requires_filters()?;
        let mut first_error = None;
        for (id, text) in &filters {
            let outcome = match self.dependency(id) {
                Some(dependency) => {
                    Filter::parse(text).and_then(|filter| dependency.set_filter(Some(filter)))
                }
                None => Err(Error::not_found(format!("dependency '{id}'"))),
            };
            if let Err(e) = outcome {
                warn!(
                    instance = %self.instance.name(),
                    dependency = %id,
                    error = %e,
                    "Cannot apply the new filter"
                );
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn create_instance(&self, object: &Arc<dyn ComponentObject>) {
        for dependency in &self.dependencies {
            dependency.on_object_creation(object);
        }
    }

    fn on_field_get(&self, field: &str, current: &FieldValue) -> FieldValue {
        match self.injecting().find(|d| d.field() == Some(field)) {
            Some(dependency) => dependency.on_field_get(),
            None => current.clone(),
        }
    }

    fn on_method_entry(&self, _method: &MethodId) {
        for dependency in self.injecting() {
            dependency.on_method_entry();
        }
    }

    fn on_method_finally(&self, _method: &MethodId) {
        for dependency in self.injecting() {
            dependency.on_method_exit();
        }
    }

    fn description(&self) -> HandlerDescription {
        self.dependencies.iter().fold(
            HandlerDescription::new(self.name(), self.is_valid()),
            |description, dependency| description.with_dependency(dependency.description()),
        )
    }
}
