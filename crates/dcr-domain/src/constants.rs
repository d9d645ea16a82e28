//! Domain layer constants
//!
//! Well-known property keys and configuration keys shared by the engine
//! and the registry adapters.

// ============================================================================
// PROVIDER PROPERTY KEYS
// ============================================================================

/// Registry-assigned provider identifier
pub const SERVICE_ID: &str = "service.id";

/// Provider ranking; higher ranks are preferred
pub const SERVICE_RANKING: &str = "service.ranking";

/// Specifications published by a provider
pub const OBJECT_CLASS: &str = "objectClass";

/// Name of the component instance backing a provider, when there is one
pub const INSTANCE_NAME: &str = "instance.name";

// ============================================================================
// INSTANCE CONFIGURATION KEYS
// ============================================================================

/// Instance name key in an instance configuration
pub const CONFIG_NAME: &str = "name";

/// Per-dependency filter overrides (`dependency id -> filter`)
pub const CONFIG_REQUIRES_FILTERS: &str = "requires.filters";

// ============================================================================
// COMPARATORS
// ============================================================================

/// Built-in comparator name ordering providers by ranking, then age
pub const RANKING_COMPARATOR: &str = "ranking";
