//! Test doubles shared by the scenario tests

#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use dcr_application::{
    ComponentType, ConstructorKind, InstanceManager, InstantiationContext, ProviderComparator,
    RuntimeSettings,
};
use dcr_domain::constants::SERVICE_RANKING;
use dcr_domain::{
    compare_by_ranking, CallbackArg, CallbackKind, ComponentMetadata, ComponentObject, Error,
    FieldValue, InstanceConfiguration, InstanceState, InstanceStateListener, InvocationError,
    MethodId, Properties, ProviderObject, ProviderRef, RequirementMetadata, Result, Transition,
};
use dcr_providers::{InMemoryServiceRegistry, ServiceRegistration};
use parking_lot::Mutex;
use serde_json::json;

pub const HELLO: &str = "demo.Hello";
pub const CLIENT: &str = "demo.Client";

/// Ordered record of every callback invocation
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Holds the first invocation logged as `entry` until released
pub struct Gate {
    entry: String,
    entered: Mutex<Option<Sender<()>>>,
    release: Mutex<Option<Receiver<()>>>,
}

impl Gate {
    /// The gate, a receiver signalled once `entry` is reached and the sender releasing it
    pub fn new(entry: &str) -> (Arc<Self>, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gate = Arc::new(Self {
            entry: entry.to_string(),
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
        });
        (gate, entered_rx, release_tx)
    }

    fn pass(&self, entry: &str) {
        if entry != self.entry {
            return;
        }
        let Some(entered) = self.entered.lock().take() else {
            return;
        };
        entered.send(()).expect("gate watcher should be listening");
        let release = self.release.lock().take();
        if let Some(release) = release {
            release.recv().expect("gate should be released");
        }
    }
}

/// Component object logging `method` or `method:<provider id>`
pub struct RecordingObject {
    journal: Journal,
    fail_on: Option<String>,
    gate: Option<Arc<Gate>>,
}

impl ComponentObject for RecordingObject {
    fn invoke(&self, method: &str, args: &[CallbackArg]) -> std::result::Result<(), InvocationError> {
        let entry = match CallbackArg::reference(args) {
            Some(reference) => format!("{method}:{}", reference.id()),
            None => method.to_string(),
        };
        self.journal.push(entry.clone());
        if let Some(gate) = &self.gate {
            gate.pass(&entry);
        }
        if self.fail_on.as_deref() == Some(method) {
            return Err(InvocationError::failed(format!("{method} refused")));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Component type creating [`RecordingObject`]s
#[derive(Default)]
pub struct TestComponent {
    journal: Journal,
    fail_on: Option<String>,
    gate: Option<Arc<Gate>>,
    fail_instantiation: bool,
    constructor: ConstructorKind,
    nullable: Option<ProviderObject>,
    defaults: Vec<(String, ProviderObject)>,
    instantiations: AtomicUsize,
    saw_registry: AtomicBool,
}

impl TestComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, method: &str) -> Self {
        self.fail_on = Some(method.to_string());
        self
    }

    pub fn with_gate(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn failing_instantiation(mut self) -> Self {
        self.fail_instantiation = true;
        self
    }

    pub fn with_registry_constructor(mut self) -> Self {
        self.constructor = ConstructorKind::WithRegistry;
        self
    }

    pub fn with_nullable(mut self, object: ProviderObject) -> Self {
        self.nullable = Some(object);
        self
    }

    pub fn with_default(mut self, class_name: &str, object: ProviderObject) -> Self {
        self.defaults.push((class_name.to_string(), object));
        self
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn instantiations(&self) -> usize {
        self.instantiations.load(Ordering::SeqCst)
    }

    pub fn saw_registry(&self) -> bool {
        self.saw_registry.load(Ordering::SeqCst)
    }
}

impl ComponentType for TestComponent {
    fn class_name(&self) -> &str {
        CLIENT
    }

    fn constructor(&self) -> ConstructorKind {
        self.constructor
    }

    fn instantiate(&self, context: &InstantiationContext) -> Result<Arc<dyn ComponentObject>> {
        if self.fail_instantiation {
            return Err(Error::instantiation(CLIENT, "constructor refused"));
        }
        self.instantiations.fetch_add(1, Ordering::SeqCst);
        if context.registry().is_some() {
            self.saw_registry.store(true, Ordering::SeqCst);
        }
        Ok(Arc::new(RecordingObject {
            journal: self.journal.clone(),
            fail_on: self.fail_on.clone(),
            gate: self.gate.clone(),
        }))
    }

    fn nullable(&self, _specification: &str) -> Option<ProviderObject> {
        self.nullable.clone()
    }

    fn default_implementation(&self, class_name: &str) -> Result<ProviderObject> {
        self.defaults
            .iter()
            .find(|(name, _)| name == class_name)
            .map(|(_, object)| Arc::clone(object))
            .ok_or_else(|| Error::instantiation(class_name, "unknown default implementation"))
    }

    fn comparator(&self, name: &str) -> Option<ProviderComparator> {
        (name == "lowest-rank").then(|| {
            Arc::new(|a: &ProviderRef, b: &ProviderRef| compare_by_ranking(b, a))
                as ProviderComparator
        })
    }
}

/// Instance state listener keeping every notified state
#[derive(Default)]
pub struct StateLog(Mutex<Vec<InstanceState>>);

impl StateLog {
    pub fn states(&self) -> Vec<InstanceState> {
        self.0.lock().clone()
    }
}

impl InstanceStateListener for StateLog {
    fn state_changed(&self, _instance: &str, state: InstanceState) {
        self.0.lock().push(state);
    }
}

/// Publish a `demo.Hello` provider whose object is `value`
pub fn hello(registry: &InMemoryServiceRegistry, value: u32, ranking: i64) -> ServiceRegistration {
    hello_with(registry, value, ranking, Properties::new())
}

/// Publish a `demo.Hello` provider with extra properties
pub fn hello_with(
    registry: &InMemoryServiceRegistry,
    value: u32,
    ranking: i64,
    mut properties: Properties,
) -> ServiceRegistration {
    properties.insert(SERVICE_RANKING.to_string(), json!(ranking));
    registry
        .register([HELLO], Arc::new(value), properties)
        .expect("register should succeed")
}

/// Metadata of a component with a `run()` method
pub fn metadata() -> ComponentMetadata {
    ComponentMetadata::new(CLIENT).with_method::<&str>("run", &[])
}

pub fn run_method() -> MethodId {
    MethodId::new::<&str>("run", &[])
}

/// `demo.Hello` requirement with `bind`/`unbind` callbacks
pub fn hello_requirement() -> RequirementMetadata {
    RequirementMetadata::new(HELLO)
        .with_callback(CallbackKind::Bind, "bind")
        .with_callback(CallbackKind::Unbind, "unbind")
}

/// Add `validate`/`invalidate` lifecycle callbacks
pub fn with_lifecycle(metadata: ComponentMetadata) -> ComponentMetadata {
    metadata
        .with_lifecycle_callback(Transition::Validate, "validate")
        .with_lifecycle_callback(Transition::Invalidate, "invalidate")
}

/// Configure an instance named `test` without starting it
pub fn configured_instance(
    metadata: &ComponentMetadata,
    component: &Arc<TestComponent>,
    registry: &InMemoryServiceRegistry,
) -> Arc<InstanceManager> {
    let instance = InstanceManager::new(
        None,
        component.clone(),
        Arc::new(registry.clone()),
        RuntimeSettings::default(),
    );
    instance
        .configure(metadata, &InstanceConfiguration::named("test"))
        .expect("configure should succeed");
    instance
}

/// Configure and start an instance named `test`
pub fn start_instance(
    metadata: &ComponentMetadata,
    component: &Arc<TestComponent>,
    registry: &InMemoryServiceRegistry,
) -> Arc<InstanceManager> {
    let instance = configured_instance(metadata, component, registry);
    instance.start();
    instance
}

/// Listen to the state changes of `instance`
pub fn state_log(instance: &InstanceManager) -> Arc<StateLog> {
    let log = Arc::new(StateLog::default());
    instance.add_instance_state_listener(log.clone());
    log
}

/// Read `field` the way a component method body would
pub fn read_field(instance: &InstanceManager, field: &str) -> FieldValue {
    let handle = instance.handle();
    let _guard = handle.enter(&run_method());
    handle.get_field(field, &FieldValue::Empty)
}

/// Value of a single `u32` service object
pub fn service_value(value: &FieldValue) -> Option<u32> {
    value.downcast::<u32>().map(|v| *v)
}
