//! Property tests: validity tracks provider availability

use std::sync::Arc;

use dcr_domain::{BindingPolicy, InstanceState};
use dcr_providers::{InMemoryServiceRegistry, ServiceRegistration};
use proptest::prelude::*;

use crate::support::{hello, hello_requirement, metadata, start_instance, TestComponent};

#[derive(Debug, Clone)]
enum Step {
    Register(i64),
    Unregister(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (-5_i64..5).prop_map(Step::Register),
        (0_usize..8).prop_map(Step::Unregister),
    ]
}

fn policy() -> impl Strategy<Value = BindingPolicy> {
    prop_oneof![
        Just(BindingPolicy::Dynamic),
        Just(BindingPolicy::DynamicPriority),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_required_dependency_is_valid_iff_a_provider_exists(
        policy in policy(),
        aggregate in any::<bool>(),
        steps in prop::collection::vec(step(), 1..24),
    ) {
        let registry = InMemoryServiceRegistry::new();
        let component = Arc::new(TestComponent::new());
        let mut requirement = hello_requirement().with_policy(policy);
        if aggregate {
            requirement = requirement.aggregate();
        }
        let metadata = metadata().with_requirement(requirement).immediate(true);
        let instance = start_instance(&metadata, &component, &registry);

        let mut live: Vec<ServiceRegistration> = Vec::new();
        for (value, step) in (0_u32..).zip(steps) {
            match step {
                Step::Register(rank) => live.push(hello(&registry, value, rank)),
                Step::Unregister(index) if !live.is_empty() => {
                    let registration = live.remove(index % live.len());
                    registration.unregister().expect("unregister should succeed");
                }
                Step::Unregister(_) => {}
            }
            let expected = if live.is_empty() {
                InstanceState::Invalid
            } else {
                InstanceState::Valid
            };
            prop_assert_eq!(instance.state(), expected);
        }

        // every bind was matched by an unbind once everything left
        for registration in live.drain(..) {
            registration.unregister().expect("unregister should succeed");
        }
        let journal = component.journal().entries();
        let binds = journal.iter().filter(|e| e.starts_with("bind:")).count();
        let unbinds = journal.iter().filter(|e| e.starts_with("unbind:")).count();
        prop_assert_eq!(binds, unbinds);
    }
}
