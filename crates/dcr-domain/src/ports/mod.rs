//! Domain Port Interfaces
//!
//! Boundary contracts between the engine and its collaborators:
//!
//! - **registry** - the abstract service registry the engine consumes
//! - **component** - the component objects the engine drives

/// Component object and state listener ports
pub mod component;
/// Service registry port
pub mod registry;

pub use component::{CallbackArg, ComponentObject, InstanceStateListener, InvocationError};
pub use registry::{
    ServiceEvent, ServiceEventKind, ServiceListener, ServiceRegistry, SubscriptionId,
};
