//! Scoped service registry
//!
//! Composes a local and a global registry into one view. Components of a
//! composite see their local providers, the global ones, or both,
//! depending on the [`ScopePolicy`]. The view is read-only: providers are
//! published on the underlying registries.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use dcr_domain::{
    Error, Filter, ProviderObject, ProviderRef, RegistryId, Result, ServiceListener,
    ServiceRegistry, SubscriptionId,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which registries a scoped view reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopePolicy {
    /// Local registry only
    #[default]
    Local,
    /// Global registry only
    Global,
    /// Local first, then global
    LocalAndGlobal,
}

impl ScopePolicy {
    /// Configuration label
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
            Self::LocalAndGlobal => "local-and-global",
        }
    }
}

impl fmt::Display for ScopePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "local" => Ok(Self::Local),
            "global" => Ok(Self::Global),
            "local-and-global" => Ok(Self::LocalAndGlobal),
            other => Err(Error::configuration(format!(
                "unknown scope policy '{other}'; expected local, global or local-and-global"
            ))),
        }
    }
}

/// Read-only view over a local and a global registry
pub struct ScopedServiceRegistry {
    id: RegistryId,
    local: Arc<dyn ServiceRegistry>,
    global: Arc<dyn ServiceRegistry>,
    policy: ScopePolicy,
    subscriptions: DashMap<SubscriptionId, Vec<(Arc<dyn ServiceRegistry>, SubscriptionId)>>,
}

impl ScopedServiceRegistry {
    /// Create a view
    pub fn new(
        local: Arc<dyn ServiceRegistry>,
        global: Arc<dyn ServiceRegistry>,
        policy: ScopePolicy,
    ) -> Self {
        Self {
            id: RegistryId::generate(),
            local,
            global,
            policy,
            subscriptions: DashMap::new(),
        }
    }

    /// Scope policy
    pub fn policy(&self) -> ScopePolicy {
        self.policy
    }

    fn scoped(&self) -> Vec<&Arc<dyn ServiceRegistry>> {
        match self.policy {
            ScopePolicy::Local => vec![&self.local],
            ScopePolicy::Global => vec![&self.global],
            ScopePolicy::LocalAndGlobal => vec![&self.local, &self.global],
        }
    }

    /// Registry that issued `reference`, when it is in scope
    fn owner(&self, reference: &ProviderRef) -> Option<&Arc<dyn ServiceRegistry>> {
        self.scoped()
            .into_iter()
            .find(|registry| registry.id() == reference.origin())
    }
}

impl ServiceRegistry for ScopedServiceRegistry {
    fn id(&self) -> RegistryId {
        self.id
    }

    fn lookup(&self, specification: &str, filter: Option<&Filter>) -> Result<Vec<ProviderRef>> {
        let mut found = Vec::new();
        for registry in self.scoped() {
            found.extend(registry.lookup(specification, filter)?);
        }
        Ok(found)
    }

    fn subscribe(
        &self,
        specification: &str,
        filter: Option<Filter>,
        listener: Arc<dyn ServiceListener>,
    ) -> Result<SubscriptionId> {
        let mut inner = Vec::new();
        for registry in self.scoped() {
            match registry.subscribe(specification, filter.clone(), Arc::clone(&listener)) {
                Ok(subscription) => inner.push((Arc::clone(registry), subscription)),
                Err(e) => {
                    for (registry, subscription) in inner {
                        if let Err(undo) = registry.unsubscribe(subscription) {
                            warn!(error = %undo, "Cannot roll back a partial subscription");
                        }
                    }
                    return Err(e);
                }
            }
        }
        let id = SubscriptionId::generate();
        self.subscriptions.insert(id, inner);
        Ok(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> Result<()> {
        let (_, inner) = self
            .subscriptions
            .remove(&subscription)
            .ok_or_else(|| Error::not_found(format!("subscription {subscription}")))?;
        let mut first_error = None;
        for (registry, id) in inner {
            if let Err(e) = registry.unsubscribe(id) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn resolve(&self, reference: &ProviderRef) -> Option<ProviderObject> {
        self.owner(reference)?.resolve(reference)
    }

    fn release(&self, reference: &ProviderRef) {
        match self.owner(reference) {
            Some(registry) => registry.release(reference),
            None => warn!(provider = %reference, "Release of a provider outside the scope"),
        }
    }

    fn compare(&self, a: &ProviderRef, b: &ProviderRef) -> std::cmp::Ordering {
        self.global.compare(a, b)
    }
}

impl fmt::Debug for ScopedServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedServiceRegistry")
            .field("id", &self.id)
            .field("policy", &self.policy)
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}
