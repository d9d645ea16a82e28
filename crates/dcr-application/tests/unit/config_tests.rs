//! Unit tests for requirement resolution

use std::cmp::Ordering;
use std::sync::Arc;

use dcr_application::dependency::Fallback;
use dcr_application::{
    ComponentType, DependencyConfig, InstantiationContext, ProviderComparator, RuntimeSettings,
};
use dcr_domain::{
    BindingPolicy, CallbackKind, Cardinality, ComponentObject, Error, ProviderObject,
    RequirementMetadata, Result,
};

const HELLO: &str = "demo.Hello";

/// Component type offering a nullable, one default implementation and a
/// `newest` comparator
struct Catalog;

impl ComponentType for Catalog {
    fn class_name(&self) -> &str {
        "demo.Catalog"
    }

    fn instantiate(&self, _context: &InstantiationContext) -> Result<Arc<dyn ComponentObject>> {
        Err(Error::instantiation("demo.Catalog", "not needed here"))
    }

    fn nullable(&self, _specification: &str) -> Option<ProviderObject> {
        Some(Arc::new("nullable"))
    }

    fn default_implementation(&self, class_name: &str) -> Result<ProviderObject> {
        if class_name == "demo.HelloImpl" {
            Ok(Arc::new("default"))
        } else {
            Err(Error::instantiation(class_name, "unknown class"))
        }
    }

    fn comparator(&self, name: &str) -> Option<ProviderComparator> {
        (name == "newest").then(|| {
            Arc::new(|a: &dcr_domain::ProviderRef, b: &dcr_domain::ProviderRef| {
                b.id().cmp(&a.id())
            }) as ProviderComparator
        })
    }
}

/// Component type with no extras
struct Bare;

impl ComponentType for Bare {
    fn class_name(&self) -> &str {
        "demo.Bare"
    }

    fn instantiate(&self, _context: &InstantiationContext) -> Result<Arc<dyn ComponentObject>> {
        Err(Error::instantiation("demo.Bare", "not needed here"))
    }
}

fn resolve(requirement: &RequirementMetadata) -> Result<DependencyConfig> {
    DependencyConfig::from_metadata(requirement, &RuntimeSettings::default(), &Catalog)
}

fn field() -> RequirementMetadata {
    RequirementMetadata::new(HELLO).with_field("hello")
}

#[test]
fn test_defaults_follow_the_settings() {
    let config = resolve(&field()).expect("from_metadata should succeed");
    assert_eq!(config.id, HELLO);
    assert_eq!(config.cardinality, Cardinality::Single);
    assert_eq!(config.policy, BindingPolicy::Dynamic);
    assert!(!config.optional);
    assert!(config.filter.is_none());
    assert!(config.comparator.is_none());
    assert!(matches!(config.fallback, Fallback::None));

    let settings = RuntimeSettings::default().with_default_binding_policy(BindingPolicy::Static);
    let config = DependencyConfig::from_metadata(&field(), &settings, &Catalog)
        .expect("from_metadata should succeed");
    assert_eq!(config.policy, BindingPolicy::Static);

    let explicit = field().with_policy(BindingPolicy::DynamicPriority);
    let config = DependencyConfig::from_metadata(&explicit, &settings, &Catalog)
        .expect("from_metadata should succeed");
    assert_eq!(config.policy, BindingPolicy::DynamicPriority);
}

#[test]
fn test_requirement_needs_a_specification_and_a_target() {
    let blank = RequirementMetadata::new(" ").with_field("hello");
    assert!(resolve(&blank).is_err_and(|e| e.is_configuration()));

    let nothing = RequirementMetadata::new(HELLO);
    assert!(resolve(&nothing).is_err_and(|e| e.is_configuration()));

    let callbacks_only = RequirementMetadata::new(HELLO).with_callback(CallbackKind::Bind, "bind");
    assert!(resolve(&callbacks_only).is_ok());
}

#[test]
fn test_invalid_filter_is_rejected() {
    let requirement = field().with_filter("(lang=en");
    assert!(matches!(
        resolve(&requirement),
        Err(Error::InvalidFilter { .. })
    ));
}

#[test]
fn test_comparators() {
    let ranking = resolve(&field().with_comparator("ranking")).expect("from_metadata should succeed");
    let comparator = ranking.comparator.expect("comparator should be set");
    assert_eq!(comparator.name, "ranking");
    assert!(comparator.compare.is_none());

    let newest = resolve(&field().with_comparator("newest")).expect("from_metadata should succeed");
    let comparator = newest.comparator.expect("comparator should be set");
    assert_eq!(comparator.name, "newest");
    let compare = comparator.compare.expect("custom comparator should be resolved");
    assert_eq!(compare(&reference(1), &reference(2)), Ordering::Greater);

    assert!(resolve(&field().with_comparator("oldest")).is_err_and(|e| e.is_configuration()));
}

#[test]
fn test_fallbacks_only_apply_to_optional_single_requirements() {
    let required = resolve(&field()).expect("from_metadata should succeed");
    assert!(required.fallback.object().is_none());

    let aggregate = resolve(&field().aggregate().optional()).expect("from_metadata should succeed");
    assert!(aggregate.fallback.object().is_none());

    let nullable = resolve(&field().optional()).expect("from_metadata should succeed");
    assert_eq!(nullable.fallback.label().as_deref(), Some("nullable"));

    let disabled = resolve(&field().optional().nullable(false)).expect("from_metadata should succeed");
    assert!(disabled.fallback.label().is_none());

    let default = resolve(&field().optional().with_default_implementation("demo.HelloImpl"))
        .expect("from_metadata should succeed");
    let object = default.fallback.object().expect("default should be injected");
    assert_eq!(object.downcast_ref::<&str>(), Some(&"default"));

    let unknown = resolve(&field().optional().with_default_implementation("demo.Nope"));
    assert!(matches!(unknown, Err(Error::Instantiation { .. })));
}

#[test]
fn test_missing_nullable_injects_nothing() {
    let config = DependencyConfig::from_metadata(
        &field().optional(),
        &RuntimeSettings::default(),
        &Bare,
    )
    .expect("from_metadata should succeed");
    assert!(matches!(config.fallback, Fallback::None));
}

#[test]
fn test_callbacks_are_grouped_by_kind() {
    let requirement = RequirementMetadata::new(HELLO)
        .with_callback(CallbackKind::Bind, "bindHello")
        .with_callback(CallbackKind::Unbind, "unbindHello")
        .with_callback(CallbackKind::Bind, "track")
        .with_callback(CallbackKind::Modified, "refresh");
    let config = resolve(&requirement).expect("from_metadata should succeed");

    assert_eq!(config.callbacks(CallbackKind::Bind), ["bindHello", "track"]);
    assert_eq!(config.callbacks(CallbackKind::Unbind), ["unbindHello"]);
    assert_eq!(config.callbacks(CallbackKind::Modified), ["refresh"]);
}

fn reference(id: u64) -> dcr_domain::ProviderRef {
    dcr_domain::ProviderRef::new(
        dcr_domain::RegistryId::generate(),
        dcr_domain::ProviderId::new(id),
        vec![HELLO.to_string()],
        dcr_domain::Properties::new(),
    )
}
