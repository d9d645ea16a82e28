//! Component metadata
//!
//! Declarative description of a component type, produced by whatever
//! collaborator parses component declarations. The engine only reads it.
//!
//! ```
//! use dcr_domain::value_objects::{BindingPolicy, ComponentMetadata, RequirementMetadata, Transition};
//!
//! let metadata = ComponentMetadata::new("demo.Greeter")
//!     .with_requirement(
//!         RequirementMetadata::new("demo.Hello")
//!             .with_field("hello")
//!             .with_policy(BindingPolicy::DynamicPriority),
//!     )
//!     .with_lifecycle_callback(Transition::Validate, "start")
//!     .with_method("greet", &["java.lang.String"]);
//!
//! assert_eq!(metadata.requires[0].id(), "demo.Hello");
//! assert_eq!(metadata.methods[0].id().as_str(), "greetjava_lang_String");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_objects::{BindingPolicy, Cardinality, CallbackKind};

// ============================================================================
// Methods
// ============================================================================

/// Unique identifier of a component method
///
/// Built from the method name followed by each argument type with `.`
/// replaced by `_`; array arguments end with `$`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(String);

impl MethodId {
    /// Compute the identifier of `name(arguments...)`
    pub fn new<S: AsRef<str>>(name: &str, arguments: &[S]) -> Self {
        let mut id = name.to_string();
        for argument in arguments {
            let argument = argument.as_ref();
            let argument = match argument.strip_suffix("[]") {
                Some(element) => format!("{element}$"),
                None => argument.to_string(),
            };
            id.push_str(&argument.replace('.', "_"));
        }
        Self(id)
    }

    /// Identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A method of the component class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMetadata {
    /// Method name
    pub name: String,
    /// Argument type names
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl MethodMetadata {
    /// Method identifier
    pub fn id(&self) -> MethodId {
        MethodId::new(&self.name, &self.arguments)
    }
}

// ============================================================================
// Lifecycle callbacks
// ============================================================================

/// Instance transition a lifecycle callback is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Instance became VALID
    Validate,
    /// Instance left VALID
    Invalidate,
}

/// Lifecycle callback declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleCallbackMetadata {
    /// Transition that triggers the callback
    pub transition: Transition,
    /// Method to invoke
    pub method: String,
}

// ============================================================================
// Requirements
// ============================================================================

/// Binding callback declaration on a requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingCallbackMetadata {
    /// Callback kind
    pub kind: CallbackKind,
    /// Method to invoke
    pub method: String,
}

/// Declaration of one service requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementMetadata {
    /// Identifier, defaults to the specification
    #[serde(default)]
    pub id: Option<String>,
    /// Required specification
    pub specification: String,
    /// Optional LDAP filter text
    #[serde(default)]
    pub filter: Option<String>,
    /// Injected field, if any
    #[serde(default)]
    pub field: Option<String>,
    /// Inject every matching provider
    #[serde(default)]
    pub aggregate: bool,
    /// Validity does not depend on this requirement
    #[serde(default)]
    pub optional: bool,
    /// Binding policy; the runtime default applies when absent
    #[serde(default)]
    pub policy: Option<BindingPolicy>,
    /// Named comparator
    #[serde(default)]
    pub comparator: Option<String>,
    /// Inject a no-op stand-in when optional and unresolved
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Class of the default implementation used when optional and unresolved
    #[serde(default)]
    pub default_implementation: Option<String>,
    /// Bind/unbind/modified callbacks
    #[serde(default)]
    pub callbacks: Vec<BindingCallbackMetadata>,
}

impl RequirementMetadata {
    /// Create a required, single, field-less requirement
    pub fn new<S: Into<String>>(specification: S) -> Self {
        Self {
            id: None,
            specification: specification.into(),
            filter: None,
            field: None,
            aggregate: false,
            optional: false,
            policy: None,
            comparator: None,
            nullable: None,
            default_implementation: None,
            callbacks: Vec::new(),
        }
    }

    /// Set the identifier
    #[must_use]
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the filter
    #[must_use]
    pub fn with_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the injected field
    #[must_use]
    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Make the requirement aggregate
    #[must_use]
    pub fn aggregate(mut self) -> Self {
        self.aggregate = true;
        self
    }

    /// Make the requirement optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Set the binding policy
    #[must_use]
    pub fn with_policy(mut self, policy: BindingPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set the comparator name
    #[must_use]
    pub fn with_comparator<S: Into<String>>(mut self, comparator: S) -> Self {
        self.comparator = Some(comparator.into());
        self
    }

    /// Enable or disable the nullable stand-in
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Set the default implementation class
    #[must_use]
    pub fn with_default_implementation<S: Into<String>>(mut self, class_name: S) -> Self {
        self.default_implementation = Some(class_name.into());
        self
    }

    /// Add a binding callback
    #[must_use]
    pub fn with_callback<S: Into<String>>(mut self, kind: CallbackKind, method: S) -> Self {
        self.callbacks.push(BindingCallbackMetadata {
            kind,
            method: method.into(),
        });
        self
    }

    /// Effective identifier
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.specification)
    }

    /// Declared cardinality
    pub fn cardinality(&self) -> Cardinality {
        Cardinality::from_aggregate(self.aggregate)
    }
}

// ============================================================================
// Component
// ============================================================================

/// Declarative description of a component type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    /// Implementation class name
    pub class_name: String,
    /// Service requirements
    #[serde(default)]
    pub requires: Vec<RequirementMetadata>,
    /// Lifecycle callbacks
    #[serde(default)]
    pub callbacks: Vec<LifecycleCallbackMetadata>,
    /// Boolean field controlling validity
    #[serde(default)]
    pub controller: Option<String>,
    /// Namespaces of additional handlers
    #[serde(default)]
    pub handlers: Vec<String>,
    /// Create the object as soon as the instance is valid
    #[serde(default)]
    pub immediate: Option<bool>,
    /// Methods of the implementation class
    #[serde(default)]
    pub methods: Vec<MethodMetadata>,
}

impl ComponentMetadata {
    /// Create metadata for `class_name` with no requirements
    pub fn new<S: Into<String>>(class_name: S) -> Self {
        Self {
            class_name: class_name.into(),
            requires: Vec::new(),
            callbacks: Vec::new(),
            controller: None,
            handlers: Vec::new(),
            immediate: None,
            methods: Vec::new(),
        }
    }

    /// Add a requirement
    #[must_use]
    pub fn with_requirement(mut self, requirement: RequirementMetadata) -> Self {
        self.requires.push(requirement);
        self
    }

    /// Add a lifecycle callback
    #[must_use]
    pub fn with_lifecycle_callback<S: Into<String>>(
        mut self,
        transition: Transition,
        method: S,
    ) -> Self {
        self.callbacks.push(LifecycleCallbackMetadata {
            transition,
            method: method.into(),
        });
        self
    }

    /// Declare the controller field
    #[must_use]
    pub fn with_controller<S: Into<String>>(mut self, field: S) -> Self {
        self.controller = Some(field.into());
        self
    }

    /// Require an additional handler by namespace
    #[must_use]
    pub fn with_handler<S: Into<String>>(mut self, namespace: S) -> Self {
        self.handlers.push(namespace.into());
        self
    }

    /// Set the immediate flag
    #[must_use]
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = Some(immediate);
        self
    }

    /// Declare a method
    #[must_use]
    pub fn with_method<S: AsRef<str>>(mut self, name: &str, arguments: &[S]) -> Self {
        self.methods.push(MethodMetadata {
            name: name.to_string(),
            arguments: arguments.iter().map(|a| a.as_ref().to_string()).collect(),
        });
        self
    }

    /// Identifiers of all declared methods
    pub fn method_ids(&self) -> Vec<MethodId> {
        self.methods.iter().map(MethodMetadata::id).collect()
    }
}
