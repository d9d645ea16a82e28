//! # Domain Layer
//!
//! Core value objects, ports and the error type of the dynamic component
//! runtime. This crate has no knowledge of threads, locks or logging; it
//! only defines what the engine and its collaborators exchange.
//!
//! ## Architecture
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`value_objects`] | Instance state, provider references, filters, metadata |
//! | [`ports`] | Registry and component object contracts |
//! | [`error`] | Domain error type |
//! | [`constants`] | Well-known property and configuration keys |

/// Domain layer constants
pub mod constants;
/// Error handling types
pub mod error;
/// Boundary contracts
pub mod ports;
/// Value objects
pub mod value_objects;

pub use error::{Error, Result};
pub use ports::*;
pub use value_objects::*;
