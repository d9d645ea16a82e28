//! Service registry adapters
//!
//! | Adapter | Description |
//! |---------|-------------|
//! | [`InMemoryServiceRegistry`] | Process-local registry with ordered event delivery |
//! | [`ScopedServiceRegistry`] | Local/global view under a [`ScopePolicy`] |

/// In-memory registry
pub mod in_memory;
/// Scoped registry view
pub mod scoped;

pub use in_memory::{InMemoryServiceRegistry, ServiceRegistration};
pub use scoped::{ScopePolicy, ScopedServiceRegistry};
