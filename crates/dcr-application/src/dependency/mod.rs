//! Service dependencies
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | Requirement resolution: filter, policy, comparator, fallback |
//! | [`model`] | [`Dependency`]: matching set, selection and binding |
//! | [`usage`] | [`ServiceUsage`]: per-thread injection snapshot |
//! | [`handler`] | [`DependencyHandler`]: one dependency per requirement |

pub mod config;
pub mod handler;
pub mod model;
pub mod usage;

pub use config::{DependencyConfig, Fallback, NamedComparator};
pub use handler::{DependencyHandler, DEPENDENCY_HANDLER};
pub use model::Dependency;
pub use usage::ServiceUsage;
