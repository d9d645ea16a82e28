//! Application Port Interfaces
//!
//! Contracts the engine expects from the code that declares components.

/// Component type and instance owner ports
pub mod component;

pub use component::{
    ComponentType, ConstructorKind, InstanceOwner, InstantiationContext, ProviderComparator,
};
