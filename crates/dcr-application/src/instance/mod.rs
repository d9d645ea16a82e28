//! Component instances
//!
//! [`InstanceManager`] drives one instance; [`InstanceHandle`] is the weak
//! reference handed to handlers, dependencies and component objects.

mod handle;
mod manager;

pub use handle::{InstanceHandle, MethodGuard};
pub use manager::InstanceManager;
