//! # Infrastructure Layer
//!
//! Cross-cutting technical concerns of the dynamic component runtime.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Figment configuration: defaults, TOML file, `DCR__` environment |
//! | [`logging`] | Structured logging with tracing |
//! | [`error_ext`] | Context extension for foreign errors |
//! | [`constants`] | File names, prefixes and logging defaults |
//! | [`runtime`] | Composition root owning registries and factories |

pub mod config;
pub mod constants;
pub mod error_ext;
pub mod logging;
pub mod runtime;

pub use config::{AppConfig, ConfigBuilder, ConfigLoader};
pub use error_ext::ErrorContext;
pub use runtime::RuntimeContext;
