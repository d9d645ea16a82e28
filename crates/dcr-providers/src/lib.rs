//! # Dynamic Component Runtime - Registry Adapters
//!
//! Concrete implementations of the `ServiceRegistry` port defined in
//! `dcr-domain`.
//!
//! ## Adapters
//!
//! | Port | Implementations |
//! |------|-----------------|
//! | `ServiceRegistry` | InMemory, Scoped |
//!
//! ## Usage
//!
//! ```ignore
//! use dcr_providers::{InMemoryServiceRegistry, ScopePolicy, ScopedServiceRegistry};
//!
//! let global = Arc::new(InMemoryServiceRegistry::new());
//! let local = Arc::new(InMemoryServiceRegistry::new());
//! let view = ScopedServiceRegistry::new(local, global, ScopePolicy::LocalAndGlobal);
//! ```

// Re-export dcr-domain types commonly used with adapters
pub use dcr_domain::error::{Error, Result};
pub use dcr_domain::ports::ServiceRegistry;

/// Registry adapters
pub mod registry;

pub use registry::{
    InMemoryServiceRegistry, ScopePolicy, ScopedServiceRegistry, ServiceRegistration,
};
