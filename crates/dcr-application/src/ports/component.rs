//! Component type port
//!
//! A [`ComponentType`] replaces runtime introspection: it creates the
//! component objects, the no-op stand-ins and the default implementations
//! the engine injects, and resolves named provider comparators.

use std::cmp::Ordering;
use std::sync::Arc;

use dcr_domain::{ComponentObject, Error, ProviderObject, ProviderRef, Result, ServiceRegistry};

use crate::instance::InstanceHandle;

/// Provider ordering; `Ordering::Less` means the first provider is preferred
pub type ProviderComparator = Arc<dyn Fn(&ProviderRef, &ProviderRef) -> Ordering + Send + Sync>;

/// Constructor variant of a component class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstructorKind {
    /// Needs only the instance handle
    #[default]
    Plain,
    /// Also needs the service registry
    WithRegistry,
}

/// What a constructor receives
#[derive(Clone)]
pub struct InstantiationContext {
    instance: InstanceHandle,
    registry: Option<Arc<dyn ServiceRegistry>>,
}

impl InstantiationContext {
    /// Context for a [`ConstructorKind::Plain`] constructor
    pub fn plain(instance: InstanceHandle) -> Self {
        Self {
            instance,
            registry: None,
        }
    }

    /// Context for a [`ConstructorKind::WithRegistry`] constructor
    pub fn with_registry(instance: InstanceHandle, registry: Arc<dyn ServiceRegistry>) -> Self {
        Self {
            instance,
            registry: Some(registry),
        }
    }

    /// Handle on the owning instance, used for field and method interception
    pub fn instance(&self) -> &InstanceHandle {
        &self.instance
    }

    /// Registry, when the constructor asked for it
    pub fn registry(&self) -> Option<&Arc<dyn ServiceRegistry>> {
        self.registry.as_ref()
    }
}

/// Factory capability for one component class
pub trait ComponentType: Send + Sync {
    /// Implementation class name
    fn class_name(&self) -> &str;

    /// Constructor variant to call
    fn constructor(&self) -> ConstructorKind {
        ConstructorKind::Plain
    }

    /// Create a component object
    fn instantiate(&self, context: &InstantiationContext) -> Result<Arc<dyn ComponentObject>>;

    /// No-op stand-in implementing `specification`, if the type provides one
    fn nullable(&self, _specification: &str) -> Option<ProviderObject> {
        None
    }

    /// Create the default implementation `class_name`
    fn default_implementation(&self, class_name: &str) -> Result<ProviderObject> {
        Err(Error::instantiation(
            class_name,
            format!("'{}' provides no default implementations", self.class_name()),
        ))
    }

    /// Resolve a named comparator
    fn comparator(&self, _name: &str) -> Option<ProviderComparator> {
        None
    }
}

/// Owner of instances, notified when one is disposed
pub trait InstanceOwner: Send + Sync {
    /// `instance` was disposed and must be forgotten
    fn disposed(&self, instance: &str);
}
