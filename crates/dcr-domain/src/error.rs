//! Error handling types
//!
//! The runtime distinguishes four failure families:
//!
//! | Family | Variants | Policy |
//! |--------|----------|--------|
//! | Configuration | `Configuration`, `InvalidFilter`, `Instantiation`, `DuplicateName` | logged, offending handler skipped |
//! | Binding | `Callback` | fatal to the instance, forces `stop()` |
//! | Unsupported | `Unsupported`, `InvalidState` | rejected at the API boundary |
//! | Plumbing | `Registry`, `NotFound`, `Io`, `Json`, `Internal` | propagated to the caller |

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the dynamic component runtime
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed declaration or missing required metadata
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A provider filter could not be parsed
    #[error("Invalid filter '{filter}': {message}")]
    InvalidFilter {
        /// The offending filter text
        filter: String,
        /// What went wrong
        message: String,
    },

    /// A component object or default implementation could not be created
    #[error("Instantiation error for '{class_name}': {message}")]
    Instantiation {
        /// Class name of the object that failed to instantiate
        class_name: String,
        /// Description of the failure
        message: String,
    },

    /// A bind/unbind/modified or lifecycle callback failed
    #[error("Callback '{method}' failed on '{class_name}': {message}")]
    Callback {
        /// Callback method name
        method: String,
        /// Class name of the target object
        class_name: String,
        /// Description of the failure
        message: String,
    },

    /// Registry collaborator failure
    #[error("Registry error: {message}")]
    Registry {
        /// Description of the registry error
        message: String,
    },

    /// Operation not allowed in the current lifecycle state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the state violation
        message: String,
    },

    /// Operation rejected at the API boundary
    #[error("Unsupported operation: {message}")]
    Unsupported {
        /// Description of the unsupported operation
        message: String,
    },

    /// Resource not found error
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// A name that must be unique was reused
    #[error("Duplicate name: {name}")]
    DuplicateName {
        /// The conflicting name
        name: String,
    },

    /// I/O operation error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing or serialization error
    #[error("JSON parsing error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

// Configuration error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter<F: Into<String>, S: Into<String>>(filter: F, message: S) -> Self {
        Self::InvalidFilter {
            filter: filter.into(),
            message: message.into(),
        }
    }

    /// Create an instantiation error
    pub fn instantiation<C: Into<String>, S: Into<String>>(class_name: C, message: S) -> Self {
        Self::Instantiation {
            class_name: class_name.into(),
            message: message.into(),
        }
    }
}

// Runtime error creation methods
impl Error {
    /// Create a callback (binding) error
    pub fn callback<M: Into<String>, C: Into<String>, S: Into<String>>(
        method: M,
        class_name: C,
        message: S,
    ) -> Self {
        Self::Callback {
            method: method.into(),
            class_name: class_name.into(),
            message: message.into(),
        }
    }

    /// Create a registry error
    pub fn registry<S: Into<String>>(message: S) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a duplicate name error
    pub fn duplicate_name<S: Into<String>>(name: S) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// I/O error creation methods
impl Error {
    /// Create an I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create an I/O error with source
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Classification helpers
impl Error {
    /// Whether the error belongs to the configuration family (recovered locally)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::InvalidFilter { .. }
                | Self::Instantiation { .. }
                | Self::DuplicateName { .. }
        )
    }

    /// Whether the error is a binding error (fatal to the instance)
    pub fn is_binding(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }
}
