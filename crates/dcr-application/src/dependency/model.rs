//! Service dependency
//!
//! Tracks the providers matching one requirement and keeps the component
//! objects bound to the right ones.
//!
//! Registry events are turned into batches of [`Action`]s under the
//! dependency lock. Batches are then executed in order, outside the lock,
//! by a single thread at a time, so callbacks never run concurrently for
//! one dependency and always observe the order in which the registry
//! changed.
//!
//! | Event | Single | Aggregate |
//! |-------|--------|-----------|
//! | arrival | bind if nothing is selected, or if a higher ranked provider arrives under `dynamic-priority` | bind |
//! | departure | unbind, then bind the next best provider | unbind |
//! | modified | `modified` callback, re-rank under `dynamic-priority` | `modified` callback |
//!
//! Under the `static` policy the binding freezes the first time the
//! component uses it. After that, arrivals are recorded but not bound, and
//! losing a used provider breaks the dependency until the instance restarts.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use dcr_domain::{
    BindingPolicy, CallbackKind, Cardinality, ComponentObject, DependencyState, Error, FieldValue,
    Filter, ProviderObject, ProviderRef, Result, ServiceEvent, ServiceEventKind, ServiceListener,
    ServiceRegistry, SubscriptionId,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::dependency::{DependencyConfig, ServiceUsage};
use crate::description::DependencyDescription;
use crate::dispatcher::{panic_message, CallbackDispatcher};
use crate::instance::InstanceHandle;
use crate::sync::SerialQueue;

/// Objects a bind applies to
#[derive(Clone)]
enum Target {
    /// Every component object existing when the bind runs
    All,
    /// One freshly created object
    Object(Arc<dyn ComponentObject>),
}

/// Deferred binding work
#[derive(Clone)]
enum Action {
    CheckValidity,
    Bind(ProviderRef, Target),
    Unbind(ProviderRef),
    Modified(ProviderRef),
    Release(ProviderRef),
}

type Batch = Vec<Action>;

#[derive(Default)]
struct Inner {
    filter: Option<Filter>,
    started: bool,
    generation: u64,
    subscription: Option<SubscriptionId>,
    matching: Vec<ProviderRef>,
    selected: Option<ProviderRef>,
    frozen: bool,
    frozen_set: Vec<ProviderRef>,
    broken: bool,
    bindings: Vec<(ProviderRef, Vec<Arc<dyn ComponentObject>>)>,
    services: HashMap<ProviderRef, ProviderObject>,
}

/// One service requirement of an instance
pub struct Dependency {
    this: Weak<Dependency>,
    config: DependencyConfig,
    instance: InstanceHandle,
    registry: Arc<dyn ServiceRegistry>,
    dispatcher: CallbackDispatcher,
    usage: Option<ServiceUsage>,
    inner: Mutex<Inner>,
    queue: SerialQueue<Batch>,
}

impl Dependency {
    /// Create a stopped dependency
    pub fn new(
        instance: InstanceHandle,
        registry: Arc<dyn ServiceRegistry>,
        config: DependencyConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            usage: config.field.as_ref().map(|_| ServiceUsage::new()),
            inner: Mutex::new(Inner {
                filter: config.filter.clone(),
                ..Inner::default()
            }),
            dispatcher: CallbackDispatcher::new(instance.clone()),
            config,
            instance,
            registry,
            queue: SerialQueue::new(),
        })
    }

    /// Dependency id
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Required specification
    pub fn specification(&self) -> &str {
        &self.config.specification
    }

    /// Injected field
    pub fn field(&self) -> Option<&str> {
        self.config.field.as_deref()
    }

    /// Cardinality
    pub fn cardinality(&self) -> Cardinality {
        self.config.cardinality
    }

    /// Whether validity ignores this dependency
    pub fn is_optional(&self) -> bool {
        self.config.optional
    }

    /// Binding policy
    pub fn policy(&self) -> BindingPolicy {
        self.config.policy
    }

    /// Resolved declaration
    pub fn config(&self) -> &DependencyConfig {
        &self.config
    }

    /// Current filter
    pub fn filter(&self) -> Option<Filter> {
        self.inner.lock().filter.clone()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Subscribe to the registry and compute the initial matching set
    ///
    /// No callback fires here; component objects are bound when they are
    /// created.
    pub fn start(&self) -> Result<()> {
        let objects_exist = !self.instance.pojo_objects().is_empty();
        let mut inner = self.inner.lock();
        if inner.started {
            return Ok(());
        }

        let subscription = self.subscribe(&mut inner)?;
        let found = match self
            .registry
            .lookup(&self.config.specification, inner.filter.as_ref())
        {
            Ok(found) => found,
            Err(e) => {
                self.unsubscribe(subscription);
                return Err(e);
            }
        };

        inner.subscription = Some(subscription);
        inner.started = true;
        inner.broken = false;
        inner.matching.clear();
        for reference in found {
            if !inner.matching.contains(&reference) {
                self.insert_matching(&mut inner, reference);
            }
        }
        inner.selected = match self.config.cardinality {
            Cardinality::Single => self.best(&inner.matching),
            Cardinality::Aggregate => None,
        };
        if self.config.policy == BindingPolicy::Static && objects_exist {
            self.freeze(&mut inner);
        }

        debug!(
            instance = %self.instance.name(),
            dependency = %self.config.id,
            matching = inner.matching.len(),
            "Dependency started"
        );
        Ok(())
    }

    /// Unsubscribe, unbind every bound object and forget every provider
    pub fn stop(&self) {
        let batch = {
            let mut inner = self.inner.lock();
            if !inner.started {
                return;
            }
            inner.started = false;
            if let Some(subscription) = inner.subscription.take() {
                self.unsubscribe(subscription);
            }
            self.queue.clear();

            let mut batch: Batch = inner
                .bindings
                .iter()
                .map(|(reference, _)| Action::Unbind(reference.clone()))
                .collect();
            batch.extend(inner.services.keys().cloned().map(Action::Release));

            inner.matching.clear();
            inner.selected = None;
            inner.frozen = false;
            inner.frozen_set.clear();
            inner.broken = false;
            batch
        };

        if let Some(usage) = &self.usage {
            usage.clear();
        }
        if !batch.is_empty() {
            self.queue
                .run_in_order(batch, |batch| self.execute(batch));
        }
        debug!(
            instance = %self.instance.name(),
            dependency = %self.config.id,
            "Dependency stopped"
        );
    }

    fn subscribe(&self, inner: &mut Inner) -> Result<SubscriptionId> {
        inner.generation += 1;
        let listener = Arc::new(DependencyListener {
            dependency: self.this.clone(),
            generation: inner.generation,
        });
        self.registry
            .subscribe(&self.config.specification, inner.filter.clone(), listener)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        if let Err(e) = self.registry.unsubscribe(subscription) {
            warn!(
                dependency = %self.config.id,
                subscription = %subscription,
                error = %e,
                "Cannot unsubscribe from the registry"
            );
        }
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Resolution state
    pub fn state(&self) -> DependencyState {
        self.state_of(&self.inner.lock())
    }

    fn state_of(&self, inner: &Inner) -> DependencyState {
        let usable = if inner.frozen {
            // a static binding frozen with nothing in it never binds before a restart
            !inner.frozen_set.is_empty()
        } else {
            !inner.matching.is_empty()
        };
        if inner.broken {
            DependencyState::Broken
        } else if self.config.optional || usable {
            DependencyState::Resolved
        } else {
            DependencyState::Unresolved
        }
    }

    /// Whether the static binding is frozen
    pub fn is_frozen(&self) -> bool {
        self.inner.lock().frozen
    }

    /// Providers currently matching, best first when ranked
    pub fn matching_providers(&self) -> Vec<ProviderRef> {
        self.inner.lock().matching.clone()
    }

    /// Providers bound to component objects or selected for injection
    pub fn used_providers(&self) -> Vec<ProviderRef> {
        let inner = self.inner.lock();
        let mut used: Vec<ProviderRef> = inner.bindings.iter().map(|(r, _)| r.clone()).collect();
        for reference in self.injected(&inner) {
            if !used.contains(&reference) {
                used.push(reference);
            }
        }
        used
    }

    /// Introspection snapshot
    pub fn description(&self) -> DependencyDescription {
        let used = self.used_providers().iter().map(ProviderRef::id).collect();
        let inner = self.inner.lock();
        DependencyDescription {
            id: self.config.id.clone(),
            specification: self.config.specification.clone(),
            filter: inner.filter.as_ref().map(ToString::to_string),
            aggregate: self.config.cardinality == Cardinality::Aggregate,
            optional: self.config.optional,
            policy: self.config.policy,
            comparator: self.config.comparator.as_ref().map(|c| c.name.clone()),
            fallback: self.config.fallback.label(),
            frozen: inner.frozen,
            state: self.state_of(&inner),
            matching: inner.matching.iter().map(ProviderRef::id).collect(),
            used,
        }
    }

    // ------------------------------------------------------------------
    // Ranking
    // ------------------------------------------------------------------

    fn ranked(&self) -> bool {
        self.config.comparator.is_some() || self.config.policy == BindingPolicy::DynamicPriority
    }

    fn compare(&self, a: &ProviderRef, b: &ProviderRef) -> Ordering {
        match self
            .config
            .comparator
            .as_ref()
            .and_then(|c| c.compare.as_ref())
        {
            Some(compare) => compare(a, b),
            None => self.registry.compare(a, b),
        }
    }

    fn best(&self, matching: &[ProviderRef]) -> Option<ProviderRef> {
        matching.iter().min_by(|a, b| self.compare(a, b)).cloned()
    }

    fn insert_matching(&self, inner: &mut Inner, reference: ProviderRef) {
        if self.ranked() {
            let position = inner
                .matching
                .iter()
                .position(|existing| self.compare(&reference, existing) == Ordering::Less)
                .unwrap_or(inner.matching.len());
            inner.matching.insert(position, reference);
        } else {
            inner.matching.push(reference);
        }
    }

    /// Providers the component sees right now
    fn injected(&self, inner: &Inner) -> Vec<ProviderRef> {
        if inner.frozen {
            return inner.frozen_set.clone();
        }
        match self.config.cardinality {
            Cardinality::Aggregate => inner.matching.clone(),
            Cardinality::Single => inner.selected.iter().cloned().collect(),
        }
    }

    fn freeze(&self, inner: &mut Inner) {
        if inner.frozen {
            return;
        }
        inner.frozen_set = self.injected(inner);
        inner.frozen = true;
        debug!(
            instance = %self.instance.name(),
            dependency = %self.config.id,
            providers = inner.frozen_set.len(),
            "Static binding frozen"
        );
    }

    // ------------------------------------------------------------------
    // Registry events
    // ------------------------------------------------------------------

    fn handle_event(&self, generation: u64, event: &ServiceEvent) {
        if self.inner.lock().generation != generation {
            return;
        }
        match event.kind {
            ServiceEventKind::Registered => self.on_service_arrival(&event.reference),
            ServiceEventKind::Modified => self.on_service_modified(&event.reference),
            ServiceEventKind::ModifiedEndMatch | ServiceEventKind::Unregistering => {
                self.on_service_departure(&event.reference);
            }
        }
    }

    /// A provider started matching
    pub fn on_service_arrival(&self, reference: &ProviderRef) {
        {
            let mut inner = self.inner.lock();
            if !inner.started || inner.matching.contains(reference) {
                return;
            }
            let was = self.state_of(&inner);
            self.insert_matching(&mut inner, reference.clone());

            let mut batch = Batch::new();
            if !was.is_satisfied() && self.state_of(&inner).is_satisfied() {
                batch.push(Action::CheckValidity);
            }
            if inner.frozen {
                debug!(
                    dependency = %self.config.id,
                    provider = %reference,
                    bound = inner.frozen_set.len(),
                    "Static binding frozen; arrival recorded only"
                );
            } else {
                match self.config.cardinality {
                    Cardinality::Aggregate => {
                        batch.push(Action::Bind(reference.clone(), Target::All));
                    }
                    Cardinality::Single => match inner.selected.clone() {
                        None => {
                            inner.selected = Some(reference.clone());
                            batch.push(Action::Bind(reference.clone(), Target::All));
                        }
                        Some(current)
                            if self.config.policy == BindingPolicy::DynamicPriority
                                && self.compare(reference, &current) == Ordering::Less =>
                        {
                            inner.selected = Some(reference.clone());
                            batch.push(Action::Unbind(current));
                            batch.push(Action::Bind(reference.clone(), Target::All));
                        }
                        Some(_) => {}
                    },
                }
            }
            if batch.is_empty() {
                return;
            }
            self.queue.push(batch);
        }
        self.deliver();
    }

    /// A provider stopped matching
    pub fn on_service_departure(&self, reference: &ProviderRef) {
        {
            let mut inner = self.inner.lock();
            if !inner.started {
                return;
            }
            let Some(position) = inner.matching.iter().position(|r| r == reference) else {
                return;
            };
            let was = self.state_of(&inner);
            inner.matching.remove(position);

            let mut batch = Batch::new();
            if inner.frozen {
                if let Some(index) = inner.frozen_set.iter().position(|r| r == reference) {
                    inner.frozen_set.remove(index);
                    batch.push(Action::Unbind(reference.clone()));
                    if !self.config.optional && !inner.matching.is_empty() {
                        inner.broken = true;
                        warn!(
                            instance = %self.instance.name(),
                            dependency = %self.config.id,
                            provider = %reference,
                            "Static binding lost a used provider; broken until restart"
                        );
                    }
                }
                if inner.selected.as_ref() == Some(reference) {
                    inner.selected = None;
                }
            } else {
                batch.push(Action::Unbind(reference.clone()));
            }

            if was.is_satisfied() && !self.state_of(&inner).is_satisfied() {
                batch.push(Action::CheckValidity);
            }
            if !inner.frozen
                && self.config.cardinality == Cardinality::Single
                && inner.selected.as_ref() == Some(reference)
            {
                inner.selected = self.best(&inner.matching);
                if let Some(next) = inner.selected.clone() {
                    batch.push(Action::Bind(next, Target::All));
                }
            }
            batch.push(Action::Release(reference.clone()));
            self.queue.push(batch);
        }
        self.deliver();
    }

    /// A matching provider changed its properties
    pub fn on_service_modified(&self, reference: &ProviderRef) {
        {
            let mut inner = self.inner.lock();
            if !inner.started {
                return;
            }
            let Some(position) = inner.matching.iter().position(|r| r == reference) else {
                drop(inner);
                self.on_service_arrival(reference);
                return;
            };

            let mut batch = Batch::new();
            if inner.bindings.iter().any(|(r, _)| r == reference) {
                batch.push(Action::Modified(reference.clone()));
            }
            if self.ranked() {
                let moved = inner.matching.remove(position);
                self.insert_matching(&mut inner, moved);
                if !inner.frozen
                    && self.config.cardinality == Cardinality::Single
                    && self.config.policy == BindingPolicy::DynamicPriority
                {
                    let best = self.best(&inner.matching);
                    if best != inner.selected {
                        if let Some(previous) = inner.selected.take() {
                            batch.push(Action::Unbind(previous));
                        }
                        if let Some(best) = best {
                            inner.selected = Some(best.clone());
                            batch.push(Action::Bind(best, Target::All));
                        }
                    }
                }
            }
            if batch.is_empty() {
                return;
            }
            self.queue.push(batch);
        }
        self.deliver();
    }

    /// A component object was created: bind it to the injected providers
    ///
    /// The binds run on the calling thread before this returns, after any
    /// batch another thread is delivering.
    pub fn on_object_creation(&self, object: &Arc<dyn ComponentObject>) {
        let batch: Batch = {
            let mut inner = self.inner.lock();
            if !inner.started {
                return;
            }
            if self.config.policy == BindingPolicy::Static {
                self.freeze(&mut inner);
            }
            self.injected(&inner)
                .into_iter()
                .map(|reference| Action::Bind(reference, Target::Object(Arc::clone(object))))
                .collect()
        };
        if !batch.is_empty() {
            self.queue.run_in_order(batch, |batch| self.execute(batch));
        }
    }

    /// Replace the filter and reconcile the matching set
    ///
    /// Providers that no longer match depart first, then the new ones
    /// arrive. Fails once a static binding is frozen.
    pub fn set_filter(&self, filter: Option<Filter>) -> Result<()> {
        let (departures, arrivals) = {
            let mut inner = self.inner.lock();
            if inner.frozen {
                return Err(Error::unsupported(format!(
                    "dependency '{}' has a frozen static binding",
                    self.config.id
                )));
            }
            inner.filter = filter;
            if !inner.started {
                return Ok(());
            }
            if let Some(subscription) = inner.subscription.take() {
                self.unsubscribe(subscription);
            }
            let subscription = self.subscribe(&mut inner)?;
            inner.subscription = Some(subscription);
            let found = self
                .registry
                .lookup(&self.config.specification, inner.filter.as_ref())?;
            let departures: Vec<ProviderRef> = inner
                .matching
                .iter()
                .filter(|r| !found.contains(r))
                .cloned()
                .collect();
            let arrivals: Vec<ProviderRef> = found
                .into_iter()
                .filter(|r| !inner.matching.contains(r))
                .collect();
            (departures, arrivals)
        };

        info!(
            instance = %self.instance.name(),
            dependency = %self.config.id,
            departures = departures.len(),
            arrivals = arrivals.len(),
            "Dependency filter changed"
        );
        for reference in &departures {
            self.on_service_departure(reference);
        }
        for reference in &arrivals {
            self.on_service_arrival(reference);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Field injection
    // ------------------------------------------------------------------

    /// Value injected into the field, stable for the current method call
    pub fn on_field_get(&self) -> FieldValue {
        match &self.usage {
            Some(usage) => usage.snapshot_or_init(|| self.current_value()),
            None => self.current_value(),
        }
    }

    /// An intercepted method was entered
    pub fn on_method_entry(&self) {
        if let Some(usage) = &self.usage {
            usage.enter();
        }
    }

    /// An intercepted method completed
    pub fn on_method_exit(&self) {
        if let Some(usage) = &self.usage {
            usage.exit();
        }
    }

    fn current_value(&self) -> FieldValue {
        let references = {
            let mut inner = self.inner.lock();
            if inner.started && self.config.policy == BindingPolicy::Static {
                self.freeze(&mut inner);
            }
            self.injected(&inner)
        };

        match self.config.cardinality {
            Cardinality::Aggregate => {
                let objects: Vec<ProviderObject> = references
                    .iter()
                    .filter_map(|reference| self.service_object(reference))
                    .collect();
                FieldValue::Objects(objects.into())
            }
            Cardinality::Single => {
                if let Some(object) = references
                    .first()
                    .and_then(|reference| self.service_object(reference))
                {
                    return FieldValue::Object(object);
                }
                if let Some(object) = self.config.fallback.object() {
                    return FieldValue::Object(Arc::clone(object));
                }
                if !self.config.optional {
                    warn!(
                        instance = %self.instance.name(),
                        dependency = %self.config.id,
                        "Required dependency read while unresolved; injecting nothing"
                    );
                }
                FieldValue::Empty
            }
        }
    }

    /// Service object of `reference`, resolved once and cached
    fn service_object(&self, reference: &ProviderRef) -> Option<ProviderObject> {
        if let Some(object) = self.inner.lock().services.get(reference) {
            return Some(Arc::clone(object));
        }

        let object = self.registry.resolve(reference)?;
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.services.get(reference) {
            let existing = Arc::clone(existing);
            drop(inner);
            self.registry.release(reference);
            return Some(existing);
        }
        if !inner.started {
            drop(inner);
            self.registry.release(reference);
            return Some(object);
        }
        inner
            .services
            .insert(reference.clone(), Arc::clone(&object));
        Some(object)
    }

    // ------------------------------------------------------------------
    // Batch execution
    // ------------------------------------------------------------------

    fn deliver(&self) {
        self.queue.drain(|batch| self.execute(batch));
    }

    fn execute(&self, batch: Batch) {
        for action in batch {
            let outcome = match action {
                Action::CheckValidity => {
                    self.instance.check_instance_state();
                    Ok(())
                }
                Action::Bind(reference, target) => self.bind(&reference, target),
                Action::Unbind(reference) => self.unbind(&reference),
                Action::Modified(reference) => self.modified(&reference),
                Action::Release(reference) => {
                    self.release(&reference);
                    Ok(())
                }
            };
            if outcome.is_err() {
                // the dispatcher already stopped the instance
                return;
            }
        }
    }

    fn bind(&self, reference: &ProviderRef, target: Target) -> Result<()> {
        if !self.instance.state().is_started() {
            return Ok(());
        }
        let objects = match &target {
            Target::All => self.instance.pojo_objects(),
            Target::Object(object) => vec![Arc::clone(object)],
        };
        if objects.is_empty() {
            return Ok(());
        }

        let fresh = {
            let mut inner = self.inner.lock();
            if !inner.started
                || (inner.frozen && matches!(target, Target::All))
                || !self.injected(&inner).contains(reference)
            {
                return Ok(());
            }
            let index = match inner.bindings.iter().position(|(r, _)| r == reference) {
                Some(index) => index,
                None => {
                    inner.bindings.push((reference.clone(), Vec::new()));
                    inner.bindings.len() - 1
                }
            };
            let bound = &mut inner.bindings[index].1;
            let fresh: Vec<Arc<dyn ComponentObject>> = objects
                .into_iter()
                .filter(|object| !bound.iter().any(|b| Arc::ptr_eq(b, object)))
                .collect();
            bound.extend(fresh.iter().cloned());
            fresh
        };
        if fresh.is_empty() {
            return Ok(());
        }

        let Some(service) = self.service_object(reference) else {
            // the provider is going away; its departure follows
            self.forget_binding(reference, &fresh);
            return Ok(());
        };
        for object in &fresh {
            for method in self.config.callbacks(CallbackKind::Bind) {
                self.dispatcher.invoke_binding(
                    object,
                    CallbackKind::Bind,
                    method,
                    reference,
                    Some(&service),
                )?;
            }
        }
        Ok(())
    }

    fn forget_binding(&self, reference: &ProviderRef, objects: &[Arc<dyn ComponentObject>]) {
        let mut inner = self.inner.lock();
        if let Some(index) = inner.bindings.iter().position(|(r, _)| r == reference) {
            inner.bindings[index]
                .1
                .retain(|b| !objects.iter().any(|o| Arc::ptr_eq(b, o)));
            if inner.bindings[index].1.is_empty() {
                inner.bindings.remove(index);
            }
        }
    }

    fn unbind(&self, reference: &ProviderRef) -> Result<()> {
        let (objects, service) = {
            let mut inner = self.inner.lock();
            let Some(index) = inner.bindings.iter().position(|(r, _)| r == reference) else {
                return Ok(());
            };
            let (_, objects) = inner.bindings.remove(index);
            (objects, inner.services.get(reference).cloned())
        };
        for object in &objects {
            for method in self.config.callbacks(CallbackKind::Unbind) {
                self.dispatcher.invoke_binding(
                    object,
                    CallbackKind::Unbind,
                    method,
                    reference,
                    service.as_ref(),
                )?;
            }
        }
        Ok(())
    }

    fn modified(&self, reference: &ProviderRef) -> Result<()> {
        let (objects, service) = {
            let inner = self.inner.lock();
            let Some((_, objects)) = inner.bindings.iter().find(|(r, _)| r == reference) else {
                return Ok(());
            };
            (objects.clone(), inner.services.get(reference).cloned())
        };
        for object in &objects {
            for method in self.config.callbacks(CallbackKind::Modified) {
                self.dispatcher.invoke_binding(
                    object,
                    CallbackKind::Modified,
                    method,
                    reference,
                    service.as_ref(),
                )?;
            }
        }
        Ok(())
    }

    fn release(&self, reference: &ProviderRef) {
        let released = {
            let mut inner = self.inner.lock();
            let in_use = (inner.started && inner.matching.contains(reference))
                || inner.bindings.iter().any(|(r, _)| r == reference);
            !in_use && inner.services.remove(reference).is_some()
        };
        if released {
            self.registry.release(reference);
        }
    }
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependency")
            .field("id", &self.config.id)
            .field("specification", &self.config.specification)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Forwards registry events of one subscription generation
struct DependencyListener {
    dependency: Weak<Dependency>,
    generation: u64,
}

impl ServiceListener for DependencyListener {
    fn service_changed(&self, event: &ServiceEvent) {
        let Some(dependency) = self.dependency.upgrade() else {
            return;
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            dependency.handle_event(self.generation, event);
        }));
        if let Err(payload) = outcome {
            error!(
                dependency = %dependency.config.id,
                provider = %event.reference,
                panic = %panic_message(payload.as_ref()),
                "Panic while processing a registry event"
            );
        }
    }
}
