//! Component factory
//!
//! Creates named instances of one component type and forgets them when
//! they are disposed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dcr_domain::{ComponentMetadata, Error, InstanceConfiguration, Result, ServiceRegistry};
use tracing::{debug, info};

use crate::instance::InstanceManager;
use crate::ports::{ComponentType, InstanceOwner};
use crate::settings::RuntimeSettings;

/// Instance factory for one component type
pub struct ComponentFactory {
    this: Weak<ComponentFactory>,
    name: String,
    metadata: ComponentMetadata,
    component_type: Arc<dyn ComponentType>,
    registry: Arc<dyn ServiceRegistry>,
    settings: RuntimeSettings,
    instances: DashMap<String, Arc<InstanceManager>>,
    counter: AtomicU64,
}

impl ComponentFactory {
    /// Create a factory named after the component class
    pub fn new(
        metadata: ComponentMetadata,
        component_type: Arc<dyn ComponentType>,
        registry: Arc<dyn ServiceRegistry>,
        settings: RuntimeSettings,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            name: metadata.class_name.clone(),
            metadata,
            component_type,
            registry,
            settings,
            instances: DashMap::new(),
            counter: AtomicU64::new(0),
        })
    }

    /// Factory name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Component metadata
    pub fn metadata(&self) -> &ComponentMetadata {
        &self.metadata
    }

    /// Create, configure and start an instance
    ///
    /// The instance is named after the `name` property, or
    /// `<factory>-<n>` when absent. Names are unique within the factory.
    pub fn create_instance(&self, config: InstanceConfiguration) -> Result<Arc<InstanceManager>> {
        let mut config = config;
        let name = match config.name() {
            Some(name) => name.to_string(),
            None => self.next_name(),
        };
        config.insert(dcr_domain::constants::CONFIG_NAME, name.clone());

        let owner: Weak<dyn InstanceOwner> = self.this.clone();
        let instance = InstanceManager::new(
            Some(owner),
            Arc::clone(&self.component_type),
            Arc::clone(&self.registry),
            self.settings.clone(),
        );

        match self.instances.entry(name.clone()) {
            Entry::Occupied(_) => return Err(Error::duplicate_name(name)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&instance));
            }
        }
        if let Err(e) = instance.configure(&self.metadata, &config) {
            self.instances.remove(&name);
            return Err(e);
        }

        instance.start();
        info!(factory = %self.name, instance = %name, "Instance created");
        Ok(instance)
    }

    fn next_name(&self) -> String {
        loop {
            let n = self.counter.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{}-{n}", self.name);
            if !self.instances.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Instance by name
    pub fn instance(&self, name: &str) -> Option<Arc<InstanceManager>> {
        self.instances.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Names of the live instances, sorted
    pub fn instance_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.instances.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Live instances
    pub fn instances(&self) -> Vec<Arc<InstanceManager>> {
        self.instances
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Dispose every instance
    pub fn dispose_all(&self) {
        // dispose re-enters the map through `disposed`
        for instance in self.instances() {
            instance.dispose();
        }
    }
}

impl InstanceOwner for ComponentFactory {
    fn disposed(&self, instance: &str) {
        if self.instances.remove(instance).is_some() {
            debug!(factory = %self.name, instance, "Instance forgotten");
        }
    }
}

impl std::fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("name", &self.name)
            .field("instances", &self.instances.len())
            .finish_non_exhaustive()
    }
}
