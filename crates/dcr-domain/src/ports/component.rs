//! Component object port
//!
//! Component objects are created by generated or hand-written factory
//! code. The engine reaches them only through [`ComponentObject::invoke`],
//! never through runtime introspection.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::value_objects::{InstanceState, Properties, ProviderObject, ProviderRef};

/// Argument passed to a component callback
#[derive(Clone)]
pub enum CallbackArg {
    /// The provider's service object
    Service(ProviderObject),
    /// The provider reference
    Reference(ProviderRef),
    /// The provider properties
    Properties(Arc<Properties>),
}

impl CallbackArg {
    /// First service object among `args`
    pub fn service(args: &[Self]) -> Option<&ProviderObject> {
        args.iter().find_map(|arg| match arg {
            Self::Service(object) => Some(object),
            _ => None,
        })
    }

    /// First provider reference among `args`
    pub fn reference(args: &[Self]) -> Option<&ProviderRef> {
        args.iter().find_map(|arg| match arg {
            Self::Reference(reference) => Some(reference),
            _ => None,
        })
    }
}

impl fmt::Debug for CallbackArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(object) => write!(f, "Service({:p})", Arc::as_ptr(object)),
            Self::Reference(reference) => write!(f, "Reference({reference})"),
            Self::Properties(properties) => write!(f, "Properties({properties:?})"),
        }
    }
}

/// Failure raised while invoking a component method
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// The object has no method of that name
    #[error("no such method '{method}'")]
    NoSuchMethod {
        /// Requested method
        method: String,
    },

    /// The method exists but cannot be called
    #[error("method '{method}' is not accessible")]
    Inaccessible {
        /// Requested method
        method: String,
    },

    /// The method body failed
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl InvocationError {
    /// Create a no-such-method error
    pub fn no_such_method<S: Into<String>>(method: S) -> Self {
        Self::NoSuchMethod {
            method: method.into(),
        }
    }

    /// Create a failure from a message
    pub fn failed<S: fmt::Display + fmt::Debug + Send + Sync + 'static>(message: S) -> Self {
        Self::Failed(anyhow::anyhow!(message))
    }
}

/// An object created for a component instance
pub trait ComponentObject: Send + Sync + 'static {
    /// Invoke `method` with `args`
    fn invoke(&self, method: &str, args: &[CallbackArg]) -> Result<(), InvocationError>;

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;
}

/// Observer of instance state changes
pub trait InstanceStateListener: Send + Sync {
    /// Called synchronously after `instance` entered `state`
    fn state_changed(&self, instance: &str, state: InstanceState);
}
