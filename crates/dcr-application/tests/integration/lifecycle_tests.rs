//! Instance lifecycle scenarios

use std::sync::Arc;

use dcr_domain::{Error, FieldValue, InstanceState};
use dcr_providers::InMemoryServiceRegistry;

use crate::support::{
    configured_instance, hello, hello_requirement, metadata, start_instance, state_log,
    with_lifecycle, TestComponent,
};

#[test]
fn test_stop_and_restart_round_trip() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = with_lifecycle(metadata().with_requirement(hello_requirement()));

    let _p1 = hello(&registry, 1, 0);
    let instance = configured_instance(&metadata, &component, &registry);
    let log = state_log(&instance);

    instance.start();
    instance.stop();
    assert_eq!(instance.state(), InstanceState::Stopped);
    assert!(instance.pojo_objects().is_empty());
    instance.start();

    assert_eq!(
        log.states(),
        vec![
            InstanceState::Invalid,
            InstanceState::Valid,
            InstanceState::Invalid,
            InstanceState::Stopped,
            InstanceState::Invalid,
            InstanceState::Valid
        ]
    );
    assert_eq!(
        component.journal().entries(),
        vec!["bind:1", "validate", "invalidate", "unbind:1", "bind:1", "validate"]
    );
    assert_eq!(component.instantiations(), 2);
}

#[test]
fn test_unresolved_instance_stays_invalid() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = with_lifecycle(metadata().with_requirement(hello_requirement()));

    let instance = start_instance(&metadata, &component, &registry);
    assert_eq!(instance.state(), InstanceState::Invalid);
    assert!(component.journal().entries().is_empty());

    let _p1 = hello(&registry, 1, 0);
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(component.journal().entries(), vec!["bind:1", "validate"]);
}

#[test]
fn test_start_and_stop_are_idempotent() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let instance = configured_instance(&metadata(), &component, &registry);
    let log = state_log(&instance);

    instance.stop();
    instance.start();
    instance.start();
    instance.stop();
    instance.stop();

    assert_eq!(
        log.states(),
        vec![
            InstanceState::Invalid,
            InstanceState::Valid,
            InstanceState::Invalid,
            InstanceState::Stopped
        ]
    );
}

#[test]
fn test_dispose_is_terminal() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = with_lifecycle(metadata().with_requirement(hello_requirement()));

    let p1 = hello(&registry, 1, 0);
    let instance = configured_instance(&metadata, &component, &registry);
    let log = state_log(&instance);
    instance.start();
    instance.dispose();

    assert_eq!(instance.state(), InstanceState::Disposed);
    assert_eq!(
        log.states(),
        vec![
            InstanceState::Invalid,
            InstanceState::Valid,
            InstanceState::Invalid,
            InstanceState::Stopped,
            InstanceState::Disposed
        ]
    );
    assert_eq!(
        component.journal().entries(),
        vec!["bind:1", "validate", "invalidate", "unbind:1"]
    );
    assert!(instance.handlers().is_empty());
    assert!(instance.pojo_objects().is_empty());
    assert_eq!(registry.subscription_count(), 0);
    assert_eq!(registry.use_count(p1.reference()), 0);

    instance.start();
    assert_eq!(instance.state(), InstanceState::Disposed);
    assert!(matches!(
        instance.create_pojo_object(),
        Err(Error::InvalidState { .. })
    ));
}

#[test]
fn test_kill_stops_and_disposes() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let instance = start_instance(&metadata(), &component, &registry);

    instance.kill();
    assert_eq!(instance.state(), InstanceState::Disposed);
    instance.kill();
    assert_eq!(instance.state(), InstanceState::Disposed);
}

#[test]
fn test_controller_field_drives_validity() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = metadata().with_controller("ready");
    let instance = configured_instance(&metadata, &component, &registry);
    let log = state_log(&instance);
    instance.start();
    assert_eq!(instance.state(), InstanceState::Valid);

    let handle = instance.handle();
    assert_eq!(
        handle.get_field("ready", &FieldValue::Empty).as_bool(),
        Some(true)
    );

    handle.set_field("ready", &FieldValue::from(false));
    assert_eq!(instance.state(), InstanceState::Invalid);
    assert_eq!(
        handle.get_field("ready", &FieldValue::Empty).as_bool(),
        Some(false)
    );

    handle.set_field("ready", &FieldValue::from(false));
    handle.set_field("ready", &FieldValue::Empty);
    assert_eq!(instance.state(), InstanceState::Invalid);

    handle.set_field("ready", &FieldValue::from(true));
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(
        log.states(),
        vec![
            InstanceState::Invalid,
            InstanceState::Valid,
            InstanceState::Invalid,
            InstanceState::Valid
        ]
    );
}

#[test]
fn test_controller_resets_on_restart() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = metadata().with_controller("ready");
    let instance = start_instance(&metadata, &component, &registry);

    instance.handle().set_field("ready", &FieldValue::from(false));
    assert_eq!(instance.state(), InstanceState::Invalid);

    instance.stop();
    instance.start();
    assert_eq!(instance.state(), InstanceState::Valid);
}

#[test]
fn test_instantiation_failure_is_reported() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new().failing_instantiation());
    let instance = start_instance(&metadata(), &component, &registry);

    let result = instance.create_pojo_object();
    assert!(matches!(result, Err(Error::Instantiation { .. })));
    assert!(instance.pojo_objects().is_empty());
    assert_eq!(instance.state(), InstanceState::Valid);
}

#[test]
fn test_registry_constructor_receives_the_registry() {
    let registry = InMemoryServiceRegistry::new();
    let plain = Arc::new(TestComponent::new());
    let instance = start_instance(&metadata(), &plain, &registry);
    instance
        .create_pojo_object()
        .expect("create_pojo_object should succeed");
    assert!(!plain.saw_registry());

    let with_registry = Arc::new(TestComponent::new().with_registry_constructor());
    let instance = start_instance(&metadata(), &with_registry, &registry);
    instance
        .create_pojo_object()
        .expect("create_pojo_object should succeed");
    assert!(with_registry.saw_registry());
}

#[test]
fn test_pojo_object_reuses_the_first_object() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let instance = start_instance(&metadata(), &component, &registry);

    let first = instance.pojo_object().expect("pojo_object should succeed");
    let again = instance.pojo_object().expect("pojo_object should succeed");
    assert!(Arc::ptr_eq(&first, &again));

    let second = instance
        .create_pojo_object()
        .expect("create_pojo_object should succeed");
    assert_eq!(instance.pojo_objects().len(), 2);
    assert!(instance.delete_pojo_object(&second));
    assert!(!instance.delete_pojo_object(&second));
    assert_eq!(component.instantiations(), 2);
}

#[test]
fn test_second_configure_is_rejected() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let instance = configured_instance(&metadata(), &component, &registry);

    let again = instance.configure(&metadata(), &dcr_domain::InstanceConfiguration::named("other"));
    assert!(again.is_err());
    assert_eq!(instance.name(), "test");
}
