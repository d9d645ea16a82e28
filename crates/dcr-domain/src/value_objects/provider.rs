//! Provider references
//!
//! A [`ProviderRef`] is the registry's handle on one published service.
//! The engine never owns the provider object behind it; it only borrows it
//! between bind and unbind through [`ServiceRegistry::resolve`].
//!
//! [`ServiceRegistry::resolve`]: crate::ports::ServiceRegistry::resolve

use std::any::Any;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::constants::SERVICE_RANKING;

/// Provider properties (string keys, JSON values)
pub type Properties = BTreeMap<String, serde_json::Value>;

/// A service object handed out by a registry
pub type ProviderObject = Arc<dyn Any + Send + Sync>;

/// Registry-unique provider identifier, increasing with registration order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProviderId(u64);

impl ProviderId {
    /// Wrap a raw identifier
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the registry that issued a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryId(uuid::Uuid);

impl RegistryId {
    /// Allocate a fresh registry identity
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RegistryId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct ProviderRefInner {
    origin: RegistryId,
    id: ProviderId,
    specifications: Vec<String>,
    properties: ArcSwap<Properties>,
}

/// Shared handle on a published provider
///
/// Clones are cheap and compare equal when they designate the same
/// registration. Properties are swapped atomically when the provider is
/// modified, so readers always see a consistent map.
#[derive(Clone)]
pub struct ProviderRef {
    inner: Arc<ProviderRefInner>,
}

impl ProviderRef {
    /// Create a reference; only registries should call this
    pub fn new(
        origin: RegistryId,
        id: ProviderId,
        specifications: Vec<String>,
        properties: Properties,
    ) -> Self {
        Self {
            inner: Arc::new(ProviderRefInner {
                origin,
                id,
                specifications,
                properties: ArcSwap::from_pointee(properties),
            }),
        }
    }

    /// Provider identifier
    pub fn id(&self) -> ProviderId {
        self.inner.id
    }

    /// Registry that issued this reference
    pub fn origin(&self) -> RegistryId {
        self.inner.origin
    }

    /// Published specifications
    pub fn specifications(&self) -> &[String] {
        &self.inner.specifications
    }

    /// Whether the provider publishes `specification`
    pub fn provides(&self, specification: &str) -> bool {
        self.inner.specifications.iter().any(|s| s == specification)
    }

    /// Current property snapshot
    pub fn properties(&self) -> Arc<Properties> {
        self.inner.properties.load_full()
    }

    /// Single property lookup
    pub fn property(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.properties.load().get(key).cloned()
    }

    /// Replace the property map (registry side of a modification)
    pub fn set_properties(&self, properties: Properties) {
        self.inner.properties.store(Arc::new(properties));
    }

    /// Ranking, `0` when absent or not an integer
    pub fn ranking(&self) -> i64 {
        self.inner
            .properties
            .load()
            .get(SERVICE_RANKING)
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0)
    }
}

impl PartialEq for ProviderRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.origin == other.inner.origin && self.inner.id == other.inner.id
    }
}

impl Eq for ProviderRef {}

impl Hash for ProviderRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.origin.hash(state);
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRef")
            .field("id", &self.inner.id)
            .field("specifications", &self.inner.specifications)
            .field("ranking", &self.ranking())
            .finish()
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider#{}", self.inner.id)
    }
}

/// Default provider ordering: higher ranking first, then older registration
///
/// `Ordering::Less` means `a` is preferred over `b`.
pub fn compare_by_ranking(a: &ProviderRef, b: &ProviderRef) -> Ordering {
    b.ranking()
        .cmp(&a.ranking())
        .then_with(|| a.id().cmp(&b.id()))
}
