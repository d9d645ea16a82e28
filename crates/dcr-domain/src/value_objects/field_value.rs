//! Values flowing through field and method interception

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::value_objects::ProviderObject;

/// Value of an intercepted component field
#[derive(Clone, Default)]
pub enum FieldValue {
    /// Nothing injected
    #[default]
    Empty,
    /// A single service object
    Object(ProviderObject),
    /// Service objects of an aggregate dependency
    Objects(Arc<[ProviderObject]>),
    /// A plain configuration value
    Value(Value),
}

impl FieldValue {
    /// Identity comparison: objects compare by pointer, plain values by value
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Objects(a), Self::Objects(b)) => Arc::ptr_eq(a, b),
            (Self::Value(a), Self::Value(b)) => a == b,
            _ => false,
        }
    }

    /// Whether nothing is injected
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Single service object
    pub fn as_object(&self) -> Option<&ProviderObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Aggregate service objects
    pub fn as_objects(&self) -> Option<&Arc<[ProviderObject]>> {
        match self {
            Self::Objects(objects) => Some(objects),
            _ => None,
        }
    }

    /// Boolean plain value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Value(value) => value.as_bool(),
            _ => None,
        }
    }

    /// Downcast a single service object to its concrete type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.as_object()
            .and_then(|object| Arc::clone(object).downcast::<T>().ok())
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Object(object) => write!(f, "Object({:p})", Arc::as_ptr(object)),
            Self::Objects(objects) => write!(f, "Objects(len={})", objects.len()),
            Self::Value(value) => write!(f, "Value({value})"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

/// How an intercepted method body ended
#[derive(Debug, Clone, PartialEq)]
pub enum MethodOutcome {
    /// Returned normally, with an optional result value
    Returned(Option<Value>),
    /// Failed with an error
    Failed(String),
}

impl MethodOutcome {
    /// Whether the method failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
