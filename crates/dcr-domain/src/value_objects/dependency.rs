//! Dependency model enums

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How many providers a dependency injects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// One selected provider
    #[default]
    Single,
    /// Every matching provider
    Aggregate,
}

impl Cardinality {
    /// Map the declarative `aggregate` flag
    pub fn from_aggregate(aggregate: bool) -> Self {
        if aggregate {
            Self::Aggregate
        } else {
            Self::Single
        }
    }
}

/// How a dependency reacts to provider churn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingPolicy {
    /// Bind once per instance start; later arrivals are ignored
    Static,
    /// Follow arrivals and departures
    #[default]
    Dynamic,
    /// Like `Dynamic`, but always keep the best-ranked provider selected
    DynamicPriority,
}

impl BindingPolicy {
    /// Label used in descriptions and configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::DynamicPriority => "dynamic-priority",
        }
    }
}

impl fmt::Display for BindingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            "dynamic-priority" => Ok(Self::DynamicPriority),
            other => Err(Error::configuration(format!(
                "unknown binding policy '{other}'"
            ))),
        }
    }
}

/// Resolution state of a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyState {
    /// Satisfied (or optional)
    Resolved,
    /// Required and no provider matches
    Unresolved,
    /// A frozen static binding lost its provider; cleared by a restart
    Broken,
}

impl DependencyState {
    /// Whether the owning handler may report valid
    pub fn is_satisfied(self) -> bool {
        self == Self::Resolved
    }
}

impl fmt::Display for DependencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolved => "resolved",
            Self::Unresolved => "unresolved",
            Self::Broken => "broken",
        })
    }
}

/// Kind of binding callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackKind {
    /// Provider became bound
    Bind,
    /// Provider is being unbound
    Unbind,
    /// Bound provider changed its properties
    Modified,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bind => "bind",
            Self::Unbind => "unbind",
            Self::Modified => "modified",
        })
    }
}
