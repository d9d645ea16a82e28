//! Application Layer - Dynamic Component Runtime
//!
//! This crate contains the engine of the runtime: the instance lifecycle
//! state machine, the handler contract and the service dependency binding
//! model.
//!
//! ## Architecture
//!
//! The application layer:
//! - Drives component instances through STOPPED, INVALID, VALID and DISPOSED
//! - Attaches handlers that decide validity and intercept fields and methods
//! - Binds component objects to providers found through the registry port
//! - Has no knowledge of any concrete registry implementation
//!
//! ## Handlers
//!
//! - `dependency`: service requirements and field injection
//! - `lifecycle-callback`: validate/invalidate callbacks
//! - `controller`: component-driven validity
//! - `architecture`: introspection
//! - external handlers resolved by namespace ([`handler::catalog`])
//!
//! ## Dependencies
//!
//! This crate depends only on:
//! - `dcr-domain`: value objects, ports and the error type
//! - Pure Rust libraries for locking, logging and serialization

pub mod architecture;
pub mod controller;
pub mod dependency;
pub mod description;
pub mod dispatcher;
pub mod factory;
pub mod handler;
pub mod instance;
pub mod lifecycle;
pub mod ports;
pub mod settings;
pub mod sync;

pub use architecture::ArchitectureHandler;
pub use controller::ControllerHandler;
pub use dependency::{Dependency, DependencyConfig, DependencyHandler, ServiceUsage};
pub use description::{DependencyDescription, HandlerDescription, InstanceDescription};
pub use dispatcher::CallbackDispatcher;
pub use factory::ComponentFactory;
pub use handler::{Handler, HandlerFactoryEntry, HandlerRegistration, HANDLER_FACTORIES};
pub use instance::{InstanceHandle, InstanceManager, MethodGuard};
pub use lifecycle::LifecycleCallbackHandler;
pub use ports::*;
pub use settings::RuntimeSettings;
