//! Unit tests for provider references and metadata

use dcr_domain::constants::SERVICE_RANKING;
use dcr_domain::{
    compare_by_ranking, BindingPolicy, ComponentMetadata, InstanceState, Properties, ProviderId,
    ProviderRef, RegistryId, RequirementMetadata,
};
use serde_json::json;

fn reference(origin: RegistryId, id: u64, ranking: i64) -> ProviderRef {
    let mut props = Properties::new();
    props.insert(SERVICE_RANKING.to_string(), json!(ranking));
    ProviderRef::new(origin, ProviderId::new(id), vec!["demo.Hello".to_string()], props)
}

#[test]
fn test_references_from_different_registries_differ() {
    let a = reference(RegistryId::generate(), 1, 0);
    let b = reference(RegistryId::generate(), 1, 0);
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
}

#[test]
fn test_sorting_by_ranking() {
    let origin = RegistryId::generate();
    let mut refs = vec![
        reference(origin, 1, 0),
        reference(origin, 2, 5),
        reference(origin, 3, 5),
    ];
    refs.sort_by(compare_by_ranking);

    let ids: Vec<u64> = refs.iter().map(|r| r.id().get()).collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

#[test]
fn test_provides_checks_specifications() {
    let r = reference(RegistryId::generate(), 7, 0);
    assert!(r.provides("demo.Hello"));
    assert!(!r.provides("demo.Other"));
}

#[test]
fn test_component_metadata_serialization() {
    let metadata = ComponentMetadata::new("demo.Impl")
        .with_requirement(
            RequirementMetadata::new("demo.Hello")
                .optional()
                .with_policy(BindingPolicy::Static),
        )
        .with_controller("running");
    let json = serde_json::to_string(&metadata).expect("serialization should succeed");
    let back: ComponentMetadata =
        serde_json::from_str(&json).expect("deserialization should succeed");

    assert_eq!(back, metadata);
}

#[test]
fn test_instance_state_serializes_lowercase() {
    let json = serde_json::to_string(&InstanceState::Valid).unwrap();
    assert_eq!(json, "\"valid\"");
}
