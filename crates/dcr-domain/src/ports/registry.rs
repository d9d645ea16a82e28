//! Service registry port
//!
//! The engine consumes an abstract registry capability; it never assumes a
//! transport or wire format. Adapters live in the providers layer.
//!
//! ## Event semantics
//!
//! | Event | Delivered when |
//! |-------|----------------|
//! | `Registered` | a matching provider is published, or a modification makes it match |
//! | `Modified` | a matching provider changes its properties and still matches |
//! | `ModifiedEndMatch` | a modification makes a matching provider stop matching |
//! | `Unregistering` | a matching provider is withdrawn |
//!
//! Events for one subscription are delivered in registry order, on the
//! registry's calling thread, with no registry lock held.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::value_objects::{compare_by_ranking, Filter, ProviderObject, ProviderRef, RegistryId};

/// Kind of registry notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceEventKind {
    /// Provider arrived
    Registered,
    /// Provider properties changed, still matching
    Modified,
    /// Provider properties changed, no longer matching
    ModifiedEndMatch,
    /// Provider is leaving
    Unregistering,
}

/// Registry notification
#[derive(Debug, Clone)]
pub struct ServiceEvent {
    /// What happened
    pub kind: ServiceEventKind,
    /// Affected provider
    pub reference: ProviderRef,
}

impl ServiceEvent {
    /// Create an event
    pub fn new(kind: ServiceEventKind, reference: ProviderRef) -> Self {
        Self { kind, reference }
    }
}

/// Receiver of registry notifications
pub trait ServiceListener: Send + Sync {
    /// Called for every event matching the subscription
    fn service_changed(&self, event: &ServiceEvent);
}

/// Handle on a registry subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(uuid::Uuid);

impl SubscriptionId {
    /// Allocate a fresh subscription id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Abstract service registry
pub trait ServiceRegistry: Send + Sync {
    /// Identity stamped on the references this registry issues
    fn id(&self) -> RegistryId;

    /// Current providers of `specification` matching `filter`
    fn lookup(&self, specification: &str, filter: Option<&Filter>) -> Result<Vec<ProviderRef>>;

    /// Subscribe to changes of providers of `specification` matching `filter`
    fn subscribe(
        &self,
        specification: &str,
        filter: Option<Filter>,
        listener: Arc<dyn ServiceListener>,
    ) -> Result<SubscriptionId>;

    /// Cancel a subscription; no delivery starts after this returns
    fn unsubscribe(&self, subscription: SubscriptionId) -> Result<()>;

    /// Obtain the provider object, `None` if the provider is gone
    fn resolve(&self, reference: &ProviderRef) -> Option<ProviderObject>;

    /// Release an object obtained through [`resolve`](Self::resolve)
    fn release(&self, reference: &ProviderRef);

    /// Provider ordering; `Ordering::Less` means `a` is preferred
    fn compare(&self, a: &ProviderRef, b: &ProviderRef) -> Ordering {
        compare_by_ranking(a, b)
    }
}
