//! Binding scenarios: policies, ranking and provider churn

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dcr_domain::constants::CONFIG_REQUIRES_FILTERS;
use dcr_domain::{
    BindingPolicy, CallbackKind, DependencyState, InstanceConfiguration, InstanceState,
    Properties, ProviderId,
};
use dcr_providers::InMemoryServiceRegistry;
use serde_json::json;

use crate::support::{
    configured_instance, hello, hello_requirement, hello_with, metadata, read_field,
    service_value, start_instance, state_log, with_lifecycle, Gate, TestComponent, HELLO,
};

fn dependency_state(instance: &dcr_application::InstanceManager) -> DependencyState {
    instance
        .description()
        .dependencies()
        .next()
        .map(|d| d.state)
        .expect("instance should describe one dependency")
}

fn ids(values: &[u64]) -> Vec<ProviderId> {
    values.iter().copied().map(ProviderId::new).collect()
}

#[test]
fn test_dynamic_priority_swaps_to_the_best_provider() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = with_lifecycle(
        metadata().with_requirement(hello_requirement().with_policy(BindingPolicy::DynamicPriority)),
    );

    let p1 = hello(&registry, 1, 0);
    let instance = start_instance(&metadata, &component, &registry);
    assert_eq!(instance.state(), InstanceState::Valid);

    let p2 = hello(&registry, 2, 5);
    p2.unregister().expect("unregister should succeed");
    p1.unregister().expect("unregister should succeed");

    assert_eq!(
        component.journal().entries(),
        vec![
            "bind:1",
            "validate",
            "unbind:1",
            "bind:2",
            "unbind:2",
            "bind:1",
            "unbind:1",
            "invalidate"
        ]
    );
    assert_eq!(instance.state(), InstanceState::Invalid);
}

#[test]
fn test_dynamic_keeps_the_first_provider_until_it_leaves() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = metadata()
        .with_requirement(hello_requirement())
        .immediate(true);

    let p1 = hello(&registry, 1, 0);
    let instance = start_instance(&metadata, &component, &registry);
    let _p2 = hello(&registry, 2, 10);
    assert_eq!(component.journal().entries(), vec!["bind:1"]);

    p1.unregister().expect("unregister should succeed");
    assert_eq!(component.journal().entries(), vec!["bind:1", "unbind:1", "bind:2"]);
    assert_eq!(instance.state(), InstanceState::Valid);
}

#[test]
fn test_aggregate_binds_every_provider() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = metadata()
        .with_requirement(hello_requirement().aggregate())
        .immediate(true);

    let _p1 = hello(&registry, 1, 0);
    let instance = start_instance(&metadata, &component, &registry);
    let p2 = hello(&registry, 2, 0);
    assert_eq!(component.journal().entries(), vec!["bind:1", "bind:2"]);

    p2.unregister().expect("unregister should succeed");
    assert_eq!(component.journal().entries(), vec!["bind:1", "bind:2", "unbind:2"]);

    let description = instance.description();
    let dependency = description
        .dependencies()
        .next()
        .expect("dependency should be described");
    assert!(dependency.aggregate);
    assert_eq!(dependency.matching, ids(&[1]));
    assert_eq!(dependency.used, ids(&[1]));
}

#[test]
fn test_static_binding_freezes_then_breaks() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = with_lifecycle(
        metadata().with_requirement(hello_requirement().with_policy(BindingPolicy::Static)),
    );

    let p1 = hello(&registry, 1, 0);
    let _p2 = hello(&registry, 2, 0);
    let instance = start_instance(&metadata, &component, &registry);
    assert_eq!(component.journal().entries(), vec!["bind:1", "validate"]);

    let _p3 = hello(&registry, 3, 10);
    assert_eq!(component.journal().entries(), vec!["bind:1", "validate"]);

    p1.unregister().expect("unregister should succeed");
    assert_eq!(
        component.journal().entries(),
        vec!["bind:1", "validate", "unbind:1", "invalidate"]
    );
    assert_eq!(instance.state(), InstanceState::Invalid);
    assert_eq!(dependency_state(&instance), DependencyState::Broken);

    let handler = instance
        .handler("dependency")
        .expect("dependency handler should be registered");
    let description = handler.description();
    assert!(description.dependencies[0].frozen);

    let config = InstanceConfiguration::new()
        .with(CONFIG_REQUIRES_FILTERS, json!({ HELLO: "(lang=fr)" }));
    assert!(instance.reconfigure(&config).is_err());

    component.journal().clear();
    instance.stop();
    instance.start();
    assert_eq!(component.journal().entries(), vec!["bind:3", "validate"]);
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(dependency_state(&instance), DependencyState::Resolved);
}

#[test]
fn test_static_binding_frozen_empty_waits_for_restart() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = metadata().with_requirement(
        hello_requirement()
            .with_field("hello")
            .with_policy(BindingPolicy::Static),
    );

    let instance = start_instance(&metadata, &component, &registry);
    assert_eq!(instance.state(), InstanceState::Invalid);
    instance
        .create_pojo_object()
        .expect("create_pojo_object should succeed");

    let _p1 = hello(&registry, 1, 0);
    assert_eq!(instance.state(), InstanceState::Invalid);
    assert_eq!(dependency_state(&instance), DependencyState::Unresolved);
    assert!(read_field(&instance, "hello").is_empty());
    assert!(component.journal().entries().is_empty());

    instance.stop();
    instance.start();
    assert_eq!(instance.state(), InstanceState::Valid);
    assert_eq!(dependency_state(&instance), DependencyState::Resolved);
    assert_eq!(service_value(&read_field(&instance, "hello")), Some(1));
}

#[test]
fn test_created_object_is_bound_before_creation_returns() {
    let registry = InMemoryServiceRegistry::new();
    let (gate, entered, release) = Gate::new("bind:2");
    let component = Arc::new(TestComponent::new().with_gate(gate));
    let metadata = metadata().with_requirement(hello_requirement().aggregate());

    let _p1 = hello(&registry, 1, 0);
    let instance = start_instance(&metadata, &component, &registry);
    instance
        .create_pojo_object()
        .expect("create_pojo_object should succeed");
    assert_eq!(component.journal().entries(), vec!["bind:1"]);

    // the first object blocks in bind:2 on the registering thread
    let arrival = {
        let registry = registry.clone();
        thread::spawn(move || hello(&registry, 2, 0))
    };
    entered.recv().expect("bind:2 should be reached");

    let creator = {
        let instance = Arc::clone(&instance);
        let journal = component.journal().clone();
        thread::spawn(move || {
            instance
                .create_pojo_object()
                .expect("create_pojo_object should succeed");
            journal.entries()
        })
    };
    thread::sleep(Duration::from_millis(50));
    release.send(()).expect("gate should be waiting");

    let at_return = creator.join().expect("creating thread should not panic");
    let _p2 = arrival.join().expect("registering thread should not panic");
    let count = |entry: &str| at_return.iter().filter(|e| e.as_str() == entry).count();
    assert_eq!(count("bind:1"), 2);
    assert_eq!(count("bind:2"), 2);
    assert_eq!(instance.pojo_objects().len(), 2);
}

#[test]
fn test_modified_callback_and_end_match() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = metadata()
        .with_requirement(
            hello_requirement()
                .with_filter("(lang=en)")
                .with_callback(CallbackKind::Modified, "modified"),
        )
        .immediate(true);

    let mut properties = Properties::new();
    properties.insert("lang".to_string(), json!("en"));
    let p1 = hello_with(&registry, 1, 0, properties.clone());
    let instance = start_instance(&metadata, &component, &registry);

    properties.insert("color".to_string(), json!("blue"));
    p1.set_properties(properties.clone())
        .expect("set_properties should succeed");
    assert_eq!(component.journal().entries(), vec!["bind:1", "modified:1"]);

    properties.insert("lang".to_string(), json!("fr"));
    p1.set_properties(properties)
        .expect("set_properties should succeed");
    assert_eq!(
        component.journal().entries(),
        vec!["bind:1", "modified:1", "unbind:1"]
    );
    assert_eq!(instance.state(), InstanceState::Invalid);
}

#[test]
fn test_reconfigured_filter_rebinds() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = metadata()
        .with_requirement(hello_requirement().with_filter("(lang=en)"))
        .immediate(true);

    let mut english = Properties::new();
    english.insert("lang".to_string(), json!("en"));
    let mut french = Properties::new();
    french.insert("lang".to_string(), json!("fr"));
    let _p1 = hello_with(&registry, 1, 0, english);
    let _p2 = hello_with(&registry, 2, 0, french);

    let instance = start_instance(&metadata, &component, &registry);
    assert_eq!(component.journal().entries(), vec!["bind:1"]);

    let config = InstanceConfiguration::new()
        .with(CONFIG_REQUIRES_FILTERS, json!({ HELLO: "(lang=fr)" }));
    instance
        .reconfigure(&config)
        .expect("reconfigure should succeed");

    assert_eq!(
        component.journal().entries(),
        vec!["bind:1", "unbind:1", "bind:2"]
    );
    assert_eq!(instance.state(), InstanceState::Valid);
    let handler = instance
        .handler("dependency")
        .expect("dependency handler should be registered");
    let description = handler.description();
    assert_eq!(description.dependencies[0].filter.as_deref(), Some("(lang=fr)"));
}

#[test]
fn test_reconfigure_unknown_dependency_fails() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = metadata().with_requirement(hello_requirement());
    let instance = start_instance(&metadata, &component, &registry);

    let config =
        InstanceConfiguration::new().with(CONFIG_REQUIRES_FILTERS, json!({ "missing": "(a=b)" }));
    assert!(instance.reconfigure(&config).is_err());
}

#[test]
fn test_failing_bind_stops_the_instance() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new().failing_on("bind"));
    let metadata = metadata()
        .with_requirement(hello_requirement())
        .immediate(true);

    let _p1 = hello(&registry, 1, 0);
    let instance = configured_instance(&metadata, &component, &registry);
    let log = state_log(&instance);
    instance.start();

    assert_eq!(component.journal().entries(), vec!["bind:1", "unbind:1"]);
    assert_eq!(instance.state(), InstanceState::Stopped);
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
fn test_custom_comparator_orders_matching_providers() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let metadata = metadata().with_requirement(
        hello_requirement()
            .aggregate()
            .with_comparator("lowest-rank"),
    );

    let _p1 = hello(&registry, 1, 10);
    let _p2 = hello(&registry, 2, -5);
    let _p3 = hello(&registry, 3, 0);
    let instance = start_instance(&metadata, &component, &registry);

    let handler = instance
        .handler("dependency")
        .expect("dependency handler should be registered");
    let description = handler.description();
    assert_eq!(description.dependencies[0].matching, ids(&[2, 3, 1]));
    assert_eq!(
        description.dependencies[0].comparator.as_deref(),
        Some("lowest-rank")
    );
}

#[test]
fn test_dependency_handler_is_not_needed_without_requirements() {
    let registry = InMemoryServiceRegistry::new();
    let component = Arc::new(TestComponent::new());
    let instance = start_instance(&metadata(), &component, &registry);

    assert!(instance.handler("dependency").is_none());
    assert_eq!(instance.state(), InstanceState::Valid);
}
