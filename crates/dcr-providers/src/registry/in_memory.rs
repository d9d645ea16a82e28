//! In-memory service registry
//!
//! Process-local implementation of the [`ServiceRegistry`] port. Providers
//! are published with [`InMemoryServiceRegistry::register`] and withdrawn
//! through the returned [`ServiceRegistration`].
//!
//! ## Delivery
//!
//! Each mutation computes its events under the registry lock and queues
//! them; the queue is then drained with no lock held. One thread drains at
//! a time, so every subscription sees events in mutation order. A listener
//! that mutates the registry from inside a callback has its events queued
//! behind the current one.
//!
//! ## Example
//!
//! ```ignore
//! use dcr_providers::InMemoryServiceRegistry;
//!
//! let registry = InMemoryServiceRegistry::new();
//! let registration = registry.register(["acme.Greeter"], Arc::new(Greeter), Properties::new())?;
//! registration.set_properties(props)?;
//! registration.unregister()?;
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dcr_domain::constants::{OBJECT_CLASS, SERVICE_ID};
use dcr_domain::{
    Error, Filter, Properties, ProviderId, ProviderObject, ProviderRef, RegistryId, Result,
    ServiceEvent, ServiceEventKind, ServiceListener, ServiceRegistry, SubscriptionId,
};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

struct Registration {
    reference: ProviderRef,
    object: ProviderObject,
    uses: usize,
}

struct Subscription {
    sequence: u64,
    specification: String,
    filter: Option<Filter>,
    listener: Arc<dyn ServiceListener>,
}

impl Subscription {
    fn matches(&self, reference: &ProviderRef, properties: &Properties) -> bool {
        reference.provides(&self.specification)
            && self.filter.as_ref().is_none_or(|f| f.matches(properties))
    }
}

struct Delivery {
    subscription: SubscriptionId,
    listener: Arc<dyn ServiceListener>,
    event: ServiceEvent,
}

#[derive(Default)]
struct Outbox {
    queue: VecDeque<Delivery>,
    delivering: bool,
}

struct RegistryState {
    id: RegistryId,
    next_id: AtomicU64,
    next_subscription: AtomicU64,
    providers: Mutex<BTreeMap<ProviderId, Registration>>,
    subscriptions: DashMap<SubscriptionId, Subscription>,
    outbox: Mutex<Outbox>,
}

/// Process-local service registry
///
/// Clones share the same registry.
#[derive(Clone)]
pub struct InMemoryServiceRegistry {
    state: Arc<RegistryState>,
}

impl Default for InMemoryServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryServiceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            state: Arc::new(RegistryState {
                id: RegistryId::generate(),
                next_id: AtomicU64::new(1),
                next_subscription: AtomicU64::new(0),
                providers: Mutex::new(BTreeMap::new()),
                subscriptions: DashMap::new(),
                outbox: Mutex::new(Outbox::default()),
            }),
        }
    }

    /// Publish `object` under `specifications`
    ///
    /// `service.id` and `objectClass` are set by the registry and override
    /// any value supplied in `properties`.
    pub fn register<I, S>(
        &self,
        specifications: I,
        object: ProviderObject,
        properties: Properties,
    ) -> Result<ServiceRegistration>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let specifications: Vec<String> = specifications.into_iter().map(Into::into).collect();
        if specifications.is_empty() || specifications.iter().any(|s| s.trim().is_empty()) {
            return Err(Error::registry(
                "a provider needs at least one non-empty specification",
            ));
        }

        let id = ProviderId::new(self.state.next_id.fetch_add(1, Ordering::Relaxed));
        let properties = stamp(properties, id, &specifications);
        let reference = ProviderRef::new(self.state.id, id, specifications, properties);

        {
            let mut providers = self.state.providers.lock();
            providers.insert(
                id,
                Registration {
                    reference: reference.clone(),
                    object,
                    uses: 0,
                },
            );
            let properties = reference.properties();
            self.queue(&reference, |subscription| {
                subscription
                    .matches(&reference, &properties)
                    .then_some(ServiceEventKind::Registered)
            });
        }
        debug!(provider = %reference, "Provider registered");
        self.drain();

        Ok(ServiceRegistration {
            registry: self.clone(),
            reference,
        })
    }

    fn set_properties(&self, reference: &ProviderRef, properties: Properties) -> Result<()> {
        {
            let providers = self.state.providers.lock();
            if !providers.contains_key(&reference.id()) {
                return Err(Error::not_found(format!("provider {reference}")));
            }
            let before = reference.properties();
            let after = stamp(properties, reference.id(), reference.specifications());
            reference.set_properties(after);
            let after = reference.properties();
            self.queue(reference, |subscription| {
                match (
                    subscription.matches(reference, &before),
                    subscription.matches(reference, &after),
                ) {
                    (true, true) => Some(ServiceEventKind::Modified),
                    (false, true) => Some(ServiceEventKind::Registered),
                    (true, false) => Some(ServiceEventKind::ModifiedEndMatch),
                    (false, false) => None,
                }
            });
        }
        debug!(provider = %reference, "Provider modified");
        self.drain();
        Ok(())
    }

    fn unregister(&self, reference: &ProviderRef) -> Result<()> {
        {
            let mut providers = self.state.providers.lock();
            let Some(registration) = providers.remove(&reference.id()) else {
                return Err(Error::not_found(format!("provider {reference}")));
            };
            if registration.uses > 0 {
                debug!(
                    provider = %reference,
                    uses = registration.uses,
                    "Provider withdrawn while in use"
                );
            }
            let properties = reference.properties();
            self.queue(reference, |subscription| {
                subscription
                    .matches(reference, &properties)
                    .then_some(ServiceEventKind::Unregistering)
            });
        }
        debug!(provider = %reference, "Provider unregistered");
        self.drain();
        Ok(())
    }

    /// Queue one event per subscription for which `kind` yields one
    ///
    /// Called with the provider lock held, so queue order is mutation order.
    fn queue<F>(&self, reference: &ProviderRef, kind: F)
    where
        F: Fn(&Subscription) -> Option<ServiceEventKind>,
    {
        let mut deliveries: Vec<(u64, Delivery)> = self
            .state
            .subscriptions
            .iter()
            .filter_map(|entry| {
                kind(entry.value()).map(|kind| {
                    (
                        entry.value().sequence,
                        Delivery {
                            subscription: *entry.key(),
                            listener: Arc::clone(&entry.value().listener),
                            event: ServiceEvent::new(kind, reference.clone()),
                        },
                    )
                })
            })
            .collect();
        if deliveries.is_empty() {
            return;
        }
        deliveries.sort_by_key(|(sequence, _)| *sequence);
        self.state
            .outbox
            .lock()
            .queue
            .extend(deliveries.into_iter().map(|(_, delivery)| delivery));
    }

    fn drain(&self) {
        {
            let mut outbox = self.state.outbox.lock();
            if outbox.delivering {
                return;
            }
            outbox.delivering = true;
        }
        loop {
            let next = {
                let mut outbox = self.state.outbox.lock();
                let next = outbox.queue.pop_front();
                if next.is_none() {
                    outbox.delivering = false;
                }
                next
            };
            let Some(delivery) = next else {
                return;
            };
            if !self.state.subscriptions.contains_key(&delivery.subscription) {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                delivery.listener.service_changed(&delivery.event);
            }));
            if outcome.is_err() {
                warn!(
                    subscription = %delivery.subscription,
                    provider = %delivery.event.reference,
                    "Service listener panicked"
                );
            }
        }
    }

    /// Number of published providers
    pub fn provider_count(&self) -> usize {
        self.state.providers.lock().len()
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.state.subscriptions.len()
    }

    /// Outstanding [`resolve`](ServiceRegistry::resolve) calls for a provider
    pub fn use_count(&self, reference: &ProviderRef) -> usize {
        self.state
            .providers
            .lock()
            .get(&reference.id())
            .map_or(0, |r| r.uses)
    }
}

impl ServiceRegistry for InMemoryServiceRegistry {
    fn id(&self) -> RegistryId {
        self.state.id
    }

    fn lookup(&self, specification: &str, filter: Option<&Filter>) -> Result<Vec<ProviderRef>> {
        let providers = self.state.providers.lock();
        Ok(providers
            .values()
            .filter(|r| r.reference.provides(specification))
            .filter(|r| filter.is_none_or(|f| f.matches(&r.reference.properties())))
            .map(|r| r.reference.clone())
            .collect())
    }

    fn subscribe(
        &self,
        specification: &str,
        filter: Option<Filter>,
        listener: Arc<dyn ServiceListener>,
    ) -> Result<SubscriptionId> {
        if specification.trim().is_empty() {
            return Err(Error::registry("cannot subscribe to an empty specification"));
        }
        let id = SubscriptionId::generate();
        self.state.subscriptions.insert(
            id,
            Subscription {
                sequence: self.state.next_subscription.fetch_add(1, Ordering::Relaxed),
                specification: specification.to_string(),
                filter,
                listener,
            },
        );
        debug!(subscription = %id, specification, "Subscribed");
        Ok(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> Result<()> {
        self.state
            .subscriptions
            .remove(&subscription)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("subscription {subscription}")))
    }

    fn resolve(&self, reference: &ProviderRef) -> Option<ProviderObject> {
        if reference.origin() != self.state.id {
            return None;
        }
        let mut providers = self.state.providers.lock();
        let registration = providers.get_mut(&reference.id())?;
        registration.uses += 1;
        Some(Arc::clone(&registration.object))
    }

    fn release(&self, reference: &ProviderRef) {
        if let Some(registration) = self.state.providers.lock().get_mut(&reference.id()) {
            registration.uses = registration.uses.saturating_sub(1);
        }
    }
}

impl std::fmt::Debug for InMemoryServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryServiceRegistry")
            .field("id", &self.state.id)
            .field("providers", &self.provider_count())
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

/// Handle on a published provider
pub struct ServiceRegistration {
    registry: InMemoryServiceRegistry,
    reference: ProviderRef,
}

impl ServiceRegistration {
    /// Reference of the published provider
    pub fn reference(&self) -> &ProviderRef {
        &self.reference
    }

    /// Replace the provider properties
    pub fn set_properties(&self, properties: Properties) -> Result<()> {
        self.registry.set_properties(&self.reference, properties)
    }

    /// Withdraw the provider
    pub fn unregister(self) -> Result<()> {
        self.registry.unregister(&self.reference)
    }
}

impl std::fmt::Debug for ServiceRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistration")
            .field("reference", &self.reference)
            .finish()
    }
}

fn stamp(mut properties: Properties, id: ProviderId, specifications: &[String]) -> Properties {
    properties.insert(SERVICE_ID.to_string(), Value::from(id.get()));
    properties.insert(
        OBJECT_CLASS.to_string(),
        Value::Array(specifications.iter().cloned().map(Value::String).collect()),
    );
    properties
}
