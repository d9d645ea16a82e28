//! Resolved dependency declaration
//!
//! Turns a [`RequirementMetadata`] into everything a [`Dependency`] needs:
//! the parsed filter, the effective policy, the comparator and the
//! fallback injected when an optional dependency is unresolved.
//!
//! [`Dependency`]: crate::dependency::Dependency

use std::fmt;

use dcr_domain::constants::RANKING_COMPARATOR;
use dcr_domain::{
    BindingPolicy, CallbackKind, Cardinality, Error, Filter, ProviderObject, RequirementMetadata,
    Result,
};
use tracing::warn;

use crate::ports::{ComponentType, ProviderComparator};
use crate::settings::RuntimeSettings;

/// Object injected into an unresolved optional single dependency
#[derive(Clone, Default)]
pub enum Fallback {
    /// Nothing is injected
    #[default]
    None,
    /// No-op stand-in supplied by the component type
    Nullable(ProviderObject),
    /// Declared default implementation
    DefaultImplementation {
        /// Implementation class
        class_name: String,
        /// The created object
        object: ProviderObject,
    },
}

impl Fallback {
    /// Injected object, if any
    pub fn object(&self) -> Option<&ProviderObject> {
        match self {
            Self::None => None,
            Self::Nullable(object) | Self::DefaultImplementation { object, .. } => Some(object),
        }
    }

    /// Label used in descriptions
    pub fn label(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Nullable(_) => Some("nullable".to_string()),
            Self::DefaultImplementation { class_name, .. } => {
                Some(format!("default-implementation:{class_name}"))
            }
        }
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(&label),
            None => f.write_str("none"),
        }
    }
}

/// Comparator with the name it was declared under
#[derive(Clone)]
pub struct NamedComparator {
    /// Declared name
    pub name: String,
    /// Custom ordering; `None` uses the registry ordering
    pub compare: Option<ProviderComparator>,
}

impl fmt::Debug for NamedComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedComparator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Fully resolved dependency declaration
#[derive(Debug, Clone)]
pub struct DependencyConfig {
    /// Identifier, unique within the handler
    pub id: String,
    /// Required specification
    pub specification: String,
    /// Provider filter
    pub filter: Option<Filter>,
    /// Injected field
    pub field: Option<String>,
    /// Cardinality
    pub cardinality: Cardinality,
    /// Validity does not depend on this dependency
    pub optional: bool,
    /// Binding policy
    pub policy: BindingPolicy,
    /// Provider comparator
    pub comparator: Option<NamedComparator>,
    /// Fallback for an unresolved optional single dependency
    pub fallback: Fallback,
    /// Bind callback methods
    pub bind_callbacks: Vec<String>,
    /// Unbind callback methods
    pub unbind_callbacks: Vec<String>,
    /// Modified callback methods
    pub modified_callbacks: Vec<String>,
}

impl DependencyConfig {
    /// Resolve a requirement against the runtime defaults and the component type
    pub fn from_metadata(
        requirement: &RequirementMetadata,
        settings: &RuntimeSettings,
        component_type: &dyn ComponentType,
    ) -> Result<Self> {
        if requirement.specification.trim().is_empty() {
            return Err(Error::configuration(format!(
                "requirement '{}' has no specification",
                requirement.id()
            )));
        }
        if requirement.field.is_none() && requirement.callbacks.is_empty() {
            return Err(Error::configuration(format!(
                "requirement '{}' has neither a field nor callbacks",
                requirement.id()
            )));
        }

        let filter = requirement
            .filter
            .as_deref()
            .map(Filter::parse)
            .transpose()?;

        let comparator = match requirement.comparator.as_deref() {
            None => None,
            Some(RANKING_COMPARATOR) => Some(NamedComparator {
                name: RANKING_COMPARATOR.to_string(),
                compare: None,
            }),
            Some(name) => {
                let compare = component_type.comparator(name).ok_or_else(|| {
                    Error::configuration(format!(
                        "unknown comparator '{name}' on requirement '{}'",
                        requirement.id()
                    ))
                })?;
                Some(NamedComparator {
                    name: name.to_string(),
                    compare: Some(compare),
                })
            }
        };

        let cardinality = requirement.cardinality();
        let fallback = if requirement.optional && cardinality == Cardinality::Single {
            Self::resolve_fallback(requirement, settings, component_type)?
        } else {
            if requirement.default_implementation.is_some() {
                warn!(
                    dependency = requirement.id(),
                    "default-implementation only applies to optional single requirements; ignored"
                );
            }
            Fallback::None
        };

        let methods = |kind: CallbackKind| -> Vec<String> {
            requirement
                .callbacks
                .iter()
                .filter(|c| c.kind == kind)
                .map(|c| c.method.clone())
                .collect()
        };

        Ok(Self {
            id: requirement.id().to_string(),
            specification: requirement.specification.clone(),
            filter,
            field: requirement.field.clone(),
            cardinality,
            optional: requirement.optional,
            policy: requirement
                .policy
                .unwrap_or(settings.default_binding_policy),
            comparator,
            fallback,
            bind_callbacks: methods(CallbackKind::Bind),
            unbind_callbacks: methods(CallbackKind::Unbind),
            modified_callbacks: methods(CallbackKind::Modified),
        })
    }

    fn resolve_fallback(
        requirement: &RequirementMetadata,
        settings: &RuntimeSettings,
        component_type: &dyn ComponentType,
    ) -> Result<Fallback> {
        if let Some(class_name) = &requirement.default_implementation {
            let object = component_type.default_implementation(class_name)?;
            return Ok(Fallback::DefaultImplementation {
                class_name: class_name.clone(),
                object,
            });
        }
        if !requirement.nullable.unwrap_or(settings.nullable_by_default) {
            return Ok(Fallback::None);
        }
        match component_type.nullable(&requirement.specification) {
            Some(object) => Ok(Fallback::Nullable(object)),
            None => {
                warn!(
                    dependency = requirement.id(),
                    specification = %requirement.specification,
                    "No nullable stand-in available; unresolved reads inject nothing"
                );
                Ok(Fallback::None)
            }
        }
    }

    /// Callback methods of `kind`
    pub fn callbacks(&self, kind: CallbackKind) -> &[String] {
        match kind {
            CallbackKind::Bind => &self.bind_callbacks,
            CallbackKind::Unbind => &self.unbind_callbacks,
            CallbackKind::Modified => &self.modified_callbacks,
        }
    }
}
