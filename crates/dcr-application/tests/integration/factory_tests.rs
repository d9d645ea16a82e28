//! Component factory scenarios

use std::sync::Arc;

use dcr_application::{ComponentFactory, RuntimeSettings};
use dcr_domain::{ComponentMetadata, Error, InstanceConfiguration, InstanceState};
use dcr_providers::InMemoryServiceRegistry;

use crate::support::{hello, hello_requirement, metadata, TestComponent, CLIENT};

fn factory(metadata: ComponentMetadata, registry: &InMemoryServiceRegistry) -> Arc<ComponentFactory> {
    ComponentFactory::new(
        metadata,
        Arc::new(TestComponent::new()),
        Arc::new(registry.clone()),
        RuntimeSettings::default(),
    )
}

#[test]
fn test_generated_and_explicit_names() {
    let registry = InMemoryServiceRegistry::new();
    let factory = factory(metadata(), &registry);
    assert_eq!(factory.name(), CLIENT);

    let taken = factory
        .create_instance(InstanceConfiguration::named("demo.Client-0"))
        .expect("create_instance should succeed");
    let first = factory
        .create_instance(InstanceConfiguration::new())
        .expect("create_instance should succeed");
    let named = factory
        .create_instance(InstanceConfiguration::named("alpha"))
        .expect("create_instance should succeed");

    assert_eq!(taken.name(), "demo.Client-0");
    assert_eq!(first.name(), "demo.Client-1");
    assert_eq!(named.name(), "alpha");
    assert_eq!(named.state(), InstanceState::Valid);
    assert_eq!(
        factory.instance_names(),
        vec!["alpha", "demo.Client-0", "demo.Client-1"]
    );
    assert!(factory
        .instance("alpha")
        .is_some_and(|instance| Arc::ptr_eq(&instance, &named)));
}

#[test]
fn test_duplicate_name_is_rejected() {
    let registry = InMemoryServiceRegistry::new();
    let factory = factory(metadata(), &registry);

    factory
        .create_instance(InstanceConfiguration::named("alpha"))
        .expect("create_instance should succeed");
    let duplicate = factory.create_instance(InstanceConfiguration::named("alpha"));

    assert!(matches!(duplicate, Err(Error::DuplicateName { .. })));
    assert_eq!(factory.instances().len(), 1);
}

#[test]
fn test_failed_configuration_leaves_no_instance() {
    let registry = InMemoryServiceRegistry::new();
    let factory = factory(ComponentMetadata::new("  "), &registry);

    let result = factory.create_instance(InstanceConfiguration::named("broken"));
    assert!(result.is_err_and(|e| e.is_configuration()));
    assert!(factory.instance_names().is_empty());
}

#[test]
fn test_disposed_instance_is_forgotten() {
    let registry = InMemoryServiceRegistry::new();
    let factory = factory(metadata(), &registry);

    let disposed = factory
        .create_instance(InstanceConfiguration::named("disposed"))
        .expect("create_instance should succeed");
    let killed = factory
        .create_instance(InstanceConfiguration::named("killed"))
        .expect("create_instance should succeed");

    disposed.dispose();
    killed.kill();

    assert_eq!(killed.state(), InstanceState::Disposed);
    assert_eq!(factory.instance_names(), vec!["killed"]);

    factory
        .create_instance(InstanceConfiguration::named("disposed"))
        .expect("a disposed name should be reusable");
}

#[test]
fn test_dispose_all_releases_the_registry() {
    let registry = InMemoryServiceRegistry::new();
    let factory = factory(metadata().with_requirement(hello_requirement()), &registry);
    let _provider = hello(&registry, 1, 0);

    let instances: Vec<_> = (0..3)
        .map(|_| {
            factory
                .create_instance(InstanceConfiguration::new())
                .expect("create_instance should succeed")
        })
        .collect();
    assert!(instances
        .iter()
        .all(|instance| instance.state() == InstanceState::Valid));
    assert_eq!(registry.subscription_count(), 3);

    factory.dispose_all();

    assert!(factory.instance_names().is_empty());
    assert!(instances
        .iter()
        .all(|instance| instance.state() == InstanceState::Disposed));
    assert_eq!(registry.subscription_count(), 0);
}
