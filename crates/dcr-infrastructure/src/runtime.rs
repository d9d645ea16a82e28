//! Runtime composition root
//!
//! [`RuntimeContext`] owns the loaded configuration, the service registries
//! and every component factory. Instances see a scoped view over a local
//! and a global registry, selected by `registry.scope`.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dcr_application::{ComponentFactory, ComponentType, RuntimeSettings};
use dcr_domain::error::{Error, Result};
use dcr_domain::{ComponentMetadata, ServiceRegistry};
use dcr_providers::{InMemoryServiceRegistry, ScopedServiceRegistry};
use tracing::{debug, info};

use crate::config::{AppConfig, ConfigLoader};

/// Long-lived owner of registries and factories
pub struct RuntimeContext {
    config: AppConfig,
    local: InMemoryServiceRegistry,
    global: InMemoryServiceRegistry,
    view: Arc<dyn ServiceRegistry>,
    factories: DashMap<String, Arc<ComponentFactory>>,
}

impl RuntimeContext {
    /// Build a context from an already loaded configuration
    pub fn new(config: AppConfig) -> Self {
        let local = InMemoryServiceRegistry::new();
        let global = InMemoryServiceRegistry::new();
        let view: Arc<dyn ServiceRegistry> = Arc::new(ScopedServiceRegistry::new(
            Arc::new(local.clone()),
            Arc::new(global.clone()),
            config.registry.scope,
        ));
        info!(scope = %config.registry.scope, "Runtime context created");
        Self {
            config,
            local,
            global,
            view,
            factories: DashMap::new(),
        }
    }

    /// Load the configuration and build a context from it
    pub fn load(loader: &ConfigLoader) -> Result<Self> {
        Ok(Self::new(loader.load()?))
    }

    /// Loaded configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Engine defaults handed to factories
    pub fn settings(&self) -> &RuntimeSettings {
        &self.config.runtime
    }

    /// Registry private to this context
    pub fn local_registry(&self) -> &InMemoryServiceRegistry {
        &self.local
    }

    /// Registry shared with other contexts
    pub fn global_registry(&self) -> &InMemoryServiceRegistry {
        &self.global
    }

    /// Registry view component instances bind against
    pub fn service_registry(&self) -> Arc<dyn ServiceRegistry> {
        Arc::clone(&self.view)
    }

    /// Create a factory for a component type
    ///
    /// Factory names are the component class names and must be unique.
    pub fn register_factory(
        &self,
        metadata: ComponentMetadata,
        component_type: Arc<dyn ComponentType>,
    ) -> Result<Arc<ComponentFactory>> {
        let name = metadata.class_name.clone();
        if name.trim().is_empty() {
            return Err(Error::configuration("A factory needs a class name"));
        }
        match self.factories.entry(name) {
            Entry::Occupied(entry) => Err(Error::duplicate_name(entry.key().clone())),
            Entry::Vacant(entry) => {
                let factory = ComponentFactory::new(
                    metadata,
                    component_type,
                    self.service_registry(),
                    self.config.runtime.clone(),
                );
                debug!(factory = %entry.key(), "Factory registered");
                entry.insert(Arc::clone(&factory));
                Ok(factory)
            }
        }
    }

    /// Factory by name
    pub fn factory(&self, name: &str) -> Option<Arc<ComponentFactory>> {
        self.factories.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Sorted factory names
    pub fn factory_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Dispose a factory's instances and forget it
    pub fn unregister_factory(&self, name: &str) -> Result<()> {
        let (_, factory) = self
            .factories
            .remove(name)
            .ok_or_else(|| Error::not_found(format!("factory {name}")))?;
        factory.dispose_all();
        debug!(factory = %name, "Factory unregistered");
        Ok(())
    }

    /// Dispose every instance of every factory
    pub fn shutdown(&self) {
        let factories: Vec<Arc<ComponentFactory>> = self
            .factories
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        self.factories.clear();
        for factory in &factories {
            factory.dispose_all();
        }
        info!(factories = factories.len(), "Runtime context shut down");
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("scope", &self.config.registry.scope)
            .field("factories", &self.factory_names())
            .finish_non_exhaustive()
    }
}
