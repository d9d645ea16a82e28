//! Domain Value Objects
//!
//! Immutable descriptions shared by the engine, the registry adapters and
//! the declaration collaborators.
//!
//! ## Value Objects
//!
//! | Value Object | Description |
//! |--------------|-------------|
//! | [`InstanceState`] | Activation state of a component instance |
//! | [`ProviderRef`] | Registry handle on a published service |
//! | [`Filter`] | LDAP-style predicate over provider properties |
//! | [`BindingPolicy`] | Reaction of a dependency to provider churn |
//! | [`ComponentMetadata`] | Declarative description of a component type |
//! | [`InstanceConfiguration`] | Per-instance key/value configuration |
//! | [`FieldValue`] | Value returned by field interception |

/// Configuration value objects
pub mod configuration;
/// Dependency model enums
pub mod dependency;
/// Field and method interception values
pub mod field_value;
/// Provider filters
pub mod filter;
/// Instance activation state
pub mod instance_state;
/// Component metadata
pub mod metadata;
/// Provider references
pub mod provider;

pub use configuration::InstanceConfiguration;
pub use dependency::{BindingPolicy, CallbackKind, Cardinality, DependencyState};
pub use field_value::{FieldValue, MethodOutcome};
pub use filter::Filter;
pub use instance_state::InstanceState;
pub use metadata::{
    BindingCallbackMetadata, ComponentMetadata, LifecycleCallbackMetadata, MethodId,
    MethodMetadata, RequirementMetadata, Transition,
};
pub use provider::{
    compare_by_ranking, Properties, ProviderId, ProviderObject, ProviderRef, RegistryId,
};
