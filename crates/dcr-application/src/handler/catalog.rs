//! Handler Catalog
//!
//! Internal handlers are created in a fixed order for every instance.
//! Additional handlers are requested by namespace in the component
//! metadata and resolved from a link-time registration slice.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Handler Resolution Flow                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  1. Extension defines:  #[distributed_slice(HANDLER_FACTORIES)]│
//! │                         static ENTRY: HandlerFactoryEntry    │
//! │                              ↓                               │
//! │  2. Metadata requests:  handlers = ["acme:audit"]            │
//! │                              ↓                               │
//! │  3. Instance resolves:  resolve_handler("acme:audit")        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Registering a handler
//!
//! ```ignore
//! use dcr_application::handler::{Handler, HandlerFactoryEntry, HANDLER_FACTORIES};
//!
//! fn audit_handler() -> Box<dyn Handler> {
//!     Box::new(AuditHandler::default())
//! }
//!
//! #[linkme::distributed_slice(HANDLER_FACTORIES)]
//! static AUDIT_HANDLER: HandlerFactoryEntry = HandlerFactoryEntry {
//!     namespace: "acme:audit",
//!     description: "Records every method entry",
//!     factory: audit_handler,
//! };
//! ```

use dcr_domain::{Error, Result};

use crate::architecture::ArchitectureHandler;
use crate::controller::ControllerHandler;
use crate::dependency::DependencyHandler;
use crate::handler::Handler;
use crate::lifecycle::LifecycleCallbackHandler;

/// Registry entry for an external handler
pub struct HandlerFactoryEntry {
    /// Namespace requested by component metadata
    pub namespace: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Create a fresh, unconfigured handler
    pub factory: fn() -> Box<dyn Handler>,
}

/// External handlers, collected at link time
#[linkme::distributed_slice]
pub static HANDLER_FACTORIES: [HandlerFactoryEntry] = [..];

/// Fresh internal handlers, in instance order
pub fn internal_handlers() -> Vec<Box<dyn Handler>> {
    vec![
        Box::new(DependencyHandler::default()),
        Box::new(LifecycleCallbackHandler::default()),
        Box::new(ControllerHandler::default()),
        Box::new(ArchitectureHandler::default()),
    ]
}

/// Create the external handler registered for `namespace`
pub fn resolve_handler(namespace: &str) -> Result<Box<dyn Handler>> {
    HANDLER_FACTORIES
        .iter()
        .find(|entry| entry.namespace == namespace)
        .map(|entry| (entry.factory)())
        .ok_or_else(|| {
            let available: Vec<&str> = HANDLER_FACTORIES.iter().map(|e| e.namespace).collect();
            Error::configuration(format!(
                "Unknown handler namespace '{namespace}'. Available handlers: {available:?}"
            ))
        })
}

/// List all registered external handlers as `(namespace, description)`
pub fn list_handlers() -> Vec<(&'static str, &'static str)> {
    HANDLER_FACTORIES
        .iter()
        .map(|entry| (entry.namespace, entry.description))
        .collect()
}
