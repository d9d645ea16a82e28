//! Instance manager
//!
//! Owns the lifecycle of one component instance: its handlers, its
//! component objects and its state machine.
//!
//! ```text
//!            start                  all handlers valid
//!  STOPPED ─────────► INVALID ◄───────────────────────► VALID
//!     ▲                  │        some handler invalid    │
//!     └──────── stop ────┴────────────────────────────────┘
//!
//!  dispose / kill: any state ──► DISPOSED (terminal)
//! ```
//!
//! State changes are recorded under the lifecycle lock and delivered in
//! order, once the lock is released: handlers in reverse order first, then
//! the registered listeners. A change made while a notification is being
//! delivered (a callback stopping the instance) is delivered after it.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, Weak};

use arc_swap::ArcSwap;
use dcr_domain::{
    ComponentMetadata, ComponentObject, Error, FieldValue, InstanceConfiguration, InstanceState,
    InstanceStateListener, MethodId, MethodOutcome, Result, ServiceRegistry,
};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::description::InstanceDescription;
use crate::dispatcher::panic_message;
use crate::handler::{internal_handlers, resolve_handler, Handler, HandlerRegistration};
use crate::instance::InstanceHandle;
use crate::ports::{ComponentType, ConstructorKind, InstanceOwner, InstantiationContext};
use crate::settings::RuntimeSettings;
use crate::sync::SerialQueue;

type HandlerList = Vec<Arc<dyn Handler>>;

#[derive(Debug, Default)]
struct Lifecycle {
    state: InstanceState,
    stopping: bool,
}

/// One pending state notification
struct Notification {
    state: InstanceState,
    handlers: HandlerList,
    listeners: Vec<Arc<dyn InstanceStateListener>>,
}

/// Lifecycle owner of one component instance
pub struct InstanceManager {
    this: Weak<InstanceManager>,
    owner: Option<Weak<dyn InstanceOwner>>,
    component_type: Arc<dyn ComponentType>,
    registry: Arc<dyn ServiceRegistry>,
    settings: RuntimeSettings,
    name: OnceLock<String>,
    handlers: ArcSwap<HandlerList>,
    fields: ArcSwap<HashMap<String, HandlerList>>,
    methods: ArcSwap<HashMap<MethodId, HandlerList>>,
    lifecycle: Mutex<Lifecycle>,
    objects: RwLock<Vec<Arc<dyn ComponentObject>>>,
    creation: ReentrantMutex<()>,
    listeners: RwLock<Vec<Arc<dyn InstanceStateListener>>>,
    notifications: SerialQueue<Notification>,
}

impl InstanceManager {
    /// Create an unconfigured, stopped instance
    pub fn new(
        owner: Option<Weak<dyn InstanceOwner>>,
        component_type: Arc<dyn ComponentType>,
        registry: Arc<dyn ServiceRegistry>,
        settings: RuntimeSettings,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            owner,
            component_type,
            registry,
            settings,
            name: OnceLock::new(),
            handlers: ArcSwap::from_pointee(Vec::new()),
            fields: ArcSwap::from_pointee(HashMap::new()),
            methods: ArcSwap::from_pointee(HashMap::new()),
            lifecycle: Mutex::new(Lifecycle::default()),
            objects: RwLock::new(Vec::new()),
            creation: ReentrantMutex::new(()),
            listeners: RwLock::new(Vec::new()),
            notifications: SerialQueue::new(),
        })
    }

    /// Build and configure the handlers
    ///
    /// A handler that cannot be resolved or configured is logged and
    /// skipped; the instance may then run in a degraded state.
    pub fn configure(
        &self,
        metadata: &ComponentMetadata,
        config: &InstanceConfiguration,
    ) -> Result<()> {
        if metadata.class_name.trim().is_empty() {
            return Err(Error::configuration("component metadata has no class name"));
        }
        let name = config.name().unwrap_or(&metadata.class_name).to_string();
        self.name.set(name).map_err(|_| {
            Error::invalid_state(format!("instance '{}' is already configured", self.name()))
        })?;

        let handle = self.handle();
        let mut candidates = internal_handlers();
        for namespace in &metadata.handlers {
            match resolve_handler(namespace) {
                Ok(handler) => candidates.push(handler),
                Err(e) => error!(
                    instance = %self.name(),
                    namespace = %namespace,
                    error = %e,
                    "Cannot resolve handler; skipping it"
                ),
            }
        }

        for mut handler in candidates {
            match handler.configure(&handle, metadata, config, &self.settings) {
                Ok(Some(registration)) => self.register(Arc::from(handler), registration),
                Ok(None) => {
                    debug!(instance = %self.name(), handler = handler.name(), "Handler not needed");
                }
                Err(e) => error!(
                    instance = %self.name(),
                    handler = handler.name(),
                    error = %e,
                    "Handler configuration failed; skipping it"
                ),
            }
        }

        debug!(
            instance = %self.name(),
            handlers = self.handlers.load().len(),
            "Instance configured"
        );
        Ok(())
    }

    /// Start the handlers and compute the initial validity
    pub fn start(&self) {
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state != InstanceState::Stopped || lifecycle.stopping {
                return;
            }
            lifecycle.state = InstanceState::Invalid;
            self.notifications
                .push(self.notification(InstanceState::Invalid, false));
        }
        self.deliver();

        info!(instance = %self.name(), "Starting instance");
        for handler in self.handlers.load_full().iter() {
            self.guarded(handler.name(), "start", || handler.start());
        }
        self.check_instance_state();
    }

    /// Stop the handlers and drop the component objects
    pub fn stop(&self) {
        {
            let mut lifecycle = self.lifecycle.lock();
            if !lifecycle.state.is_started() || lifecycle.stopping {
                return;
            }
            lifecycle.stopping = true;
            if lifecycle.state != InstanceState::Invalid {
                lifecycle.state = InstanceState::Invalid;
                self.notifications
                    .push(self.notification(InstanceState::Invalid, true));
            }
        }
        self.deliver();

        for handler in self.handlers.load_full().iter().rev() {
            self.guarded(handler.name(), "stop", || handler.stop());
        }
        self.objects.write().clear();

        {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.stopping = false;
            if lifecycle.state != InstanceState::Disposed {
                lifecycle.state = InstanceState::Stopped;
                self.notifications
                    .push(self.notification(InstanceState::Stopped, false));
            }
        }
        self.deliver();
        info!(instance = %self.name(), "Instance stopped");
    }

    /// Stop, notify the owner and release everything
    pub fn dispose(&self) {
        self.shutdown(true);
    }

    /// Like [`dispose`](Self::dispose), without notifying the owner
    pub fn kill(&self) {
        self.shutdown(false);
    }

    fn shutdown(&self, notify_owner: bool) {
        self.stop();
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state == InstanceState::Disposed {
                return;
            }
            lifecycle.state = InstanceState::Disposed;
            self.notifications
                .push(self.notification(InstanceState::Disposed, false));
        }
        self.deliver();

        if notify_owner {
            if let Some(owner) = self.owner.as_ref().and_then(Weak::upgrade) {
                owner.disposed(self.name());
            }
        }

        self.handlers.store(Arc::new(Vec::new()));
        self.fields.store(Arc::new(HashMap::new()));
        self.methods.store(Arc::new(HashMap::new()));
        self.objects.write().clear();
        self.listeners.write().clear();
        info!(instance = %self.name(), "Instance disposed");
    }

    /// Recompute validity from the handlers and move to VALID or INVALID
    pub fn check_instance_state(&self) {
        {
            let mut lifecycle = self.lifecycle.lock();
            if !lifecycle.state.is_started() || lifecycle.stopping {
                return;
            }
            let valid = self.handlers.load().iter().all(|h| h.is_valid());
            let target = if valid {
                InstanceState::Valid
            } else {
                InstanceState::Invalid
            };
            if lifecycle.state != target {
                lifecycle.state = target;
                self.notifications.push(self.notification(target, true));
            }
        }
        self.deliver();
    }

    fn notification(&self, state: InstanceState, with_handlers: bool) -> Notification {
        Notification {
            state,
            handlers: if with_handlers {
                self.handlers.load_full().as_ref().clone()
            } else {
                Vec::new()
            },
            listeners: self.listeners.read().clone(),
        }
    }

    fn deliver(&self) {
        self.notifications.drain(|notification| self.notify(notification));
    }

    fn notify(&self, notification: Notification) {
        let state = notification.state;
        match state {
            InstanceState::Valid => info!(instance = %self.name(), "Instance is valid"),
            InstanceState::Invalid if !notification.handlers.is_empty() => {
                info!(instance = %self.name(), "Instance is invalid");
            }
            _ => debug!(instance = %self.name(), state = %state, "Instance state changed"),
        }
        for handler in notification.handlers.iter().rev() {
            self.guarded(handler.name(), "state_changed", || handler.state_changed(state));
        }
        for listener in &notification.listeners {
            self.guarded("listener", "state_changed", || {
                listener.state_changed(self.name(), state);
            });
        }
    }

    fn guarded<F: FnOnce()>(&self, target: &str, operation: &str, f: F) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
            error!(
                instance = %self.name(),
                target,
                operation,
                panic = %panic_message(payload.as_ref()),
                "Panic caught while driving the instance"
            );
        }
    }

    /// Create a component object and announce it to the handlers
    pub fn create_pojo_object(&self) -> Result<Arc<dyn ComponentObject>> {
        let _creation = self.creation.lock();
        if self.state() == InstanceState::Disposed {
            return Err(Error::invalid_state(format!(
                "instance '{}' is disposed",
                self.name()
            )));
        }

        let context = match self.component_type.constructor() {
            ConstructorKind::Plain => InstantiationContext::plain(self.handle()),
            ConstructorKind::WithRegistry => {
                InstantiationContext::with_registry(self.handle(), Arc::clone(&self.registry))
            }
        };
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.component_type.instantiate(&context)));
        let object = match outcome {
            Ok(Ok(object)) => object,
            Ok(Err(e)) => {
                error!(instance = %self.name(), error = %e, "Cannot create component object");
                return Err(e);
            }
            Err(payload) => {
                let err = Error::instantiation(
                    self.class_name(),
                    panic_message(payload.as_ref()),
                );
                error!(instance = %self.name(), error = %err, "Cannot create component object");
                return Err(err);
            }
        };

        {
            let mut objects = self.objects.write();
            if !objects.iter().any(|o| Arc::ptr_eq(o, &object)) {
                objects.push(Arc::clone(&object));
            }
        }
        for handler in self.handlers.load_full().iter() {
            handler.create_instance(&object);
        }
        debug!(instance = %self.name(), "Component object created");
        Ok(object)
    }

    /// First component object, created when none exists
    pub fn pojo_object(&self) -> Result<Arc<dyn ComponentObject>> {
        // an object still being announced is returned without waiting for its creator
        if let Some(object) = self.objects.read().first() {
            return Ok(Arc::clone(object));
        }
        let _creation = self.creation.lock();
        if let Some(object) = self.objects.read().first() {
            return Ok(Arc::clone(object));
        }
        self.create_pojo_object()
    }

    /// Created component objects, in creation order
    pub fn pojo_objects(&self) -> Vec<Arc<dyn ComponentObject>> {
        self.objects.read().clone()
    }

    /// Forget a component object; returns whether it was known
    pub fn delete_pojo_object(&self, object: &Arc<dyn ComponentObject>) -> bool {
        let mut objects = self.objects.write();
        let before = objects.len();
        objects.retain(|o| !Arc::ptr_eq(o, object));
        objects.len() != before
    }

    /// Push a new configuration to every handler
    ///
    /// Every handler is reconfigured; the first failure is returned.
    pub fn reconfigure(&self, config: &InstanceConfiguration) -> Result<()> {
        let mut first_error = None;
        for handler in self.handlers.load_full().iter() {
            if let Err(e) = handler.reconfigure(config) {
                warn!(
                    instance = %self.name(),
                    handler = handler.name(),
                    error = %e,
                    "Reconfiguration failed"
                );
                first_error.get_or_insert(e);
            }
        }
        self.check_instance_state();
        first_error.map_or(Ok(()), Err)
    }

    /// Register a handler and its interception points
    pub fn register(&self, handler: Arc<dyn Handler>, registration: HandlerRegistration) {
        self.handlers.rcu(|current| {
            let mut next = Vec::clone(current);
            if !next.iter().any(|h| Arc::ptr_eq(h, &handler)) {
                next.push(Arc::clone(&handler));
            }
            next
        });
        if !registration.fields.is_empty() {
            self.fields.rcu(|current| {
                let mut next = HashMap::clone(current);
                for field in &registration.fields {
                    add_unique(next.entry(field.clone()).or_default(), &handler);
                }
                next
            });
        }
        if !registration.methods.is_empty() {
            self.methods.rcu(|current| {
                let mut next = HashMap::clone(current);
                for method in &registration.methods {
                    add_unique(next.entry(method.clone()).or_default(), &handler);
                }
                next
            });
        }
    }

    /// Remove a handler from every interception point
    pub fn unregister(&self, handler: &Arc<dyn Handler>) {
        self.handlers.rcu(|current| {
            let mut next = Vec::clone(current);
            next.retain(|h| !Arc::ptr_eq(h, handler));
            next
        });
        self.fields.rcu(|current| without(current, handler));
        self.methods.rcu(|current| without(current, handler));
    }

    /// Value of `field` after every registered handler saw the read
    ///
    /// Each handler receives `current`; the last handler returning a
    /// different value wins.
    pub fn getter_callback(&self, field: &str, current: &FieldValue) -> FieldValue {
        let fields = self.fields.load_full();
        let Some(handlers) = fields.get(field) else {
            return current.clone();
        };
        let mut result = current.clone();
        for handler in handlers {
            let value = handler.on_field_get(field, current);
            if !value.same(current) {
                result = value;
            }
        }
        result
    }

    /// Announce a write of `field`
    pub fn setter_callback(&self, field: &str, value: &FieldValue) {
        if let Some(handlers) = self.fields.load_full().get(field) {
            for handler in handlers {
                handler.on_field_set(field, value);
            }
        }
    }

    /// Announce the entry of `method`
    pub fn entry_callback(&self, method: &MethodId) {
        if let Some(handlers) = self.methods.load_full().get(method) {
            for handler in handlers {
                handler.on_method_entry(method);
            }
        }
    }

    /// Announce the completion of `method`
    pub fn exit_callback(&self, method: &MethodId, outcome: &MethodOutcome) {
        let methods = self.methods.load_full();
        let Some(handlers) = methods.get(method) else {
            return;
        };
        for handler in handlers {
            match outcome {
                MethodOutcome::Failed(message) => handler.on_method_error(method, message),
                MethodOutcome::Returned(_) => handler.on_method_exit(method, outcome),
            }
        }
        for handler in handlers {
            handler.on_method_finally(method);
        }
    }

    /// Fields with at least one registered handler
    pub fn registered_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.fields.load().keys().cloned().collect();
        fields.sort();
        fields
    }

    /// Methods with at least one registered handler
    pub fn registered_methods(&self) -> Vec<MethodId> {
        let mut methods: Vec<MethodId> = self.methods.load().keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Handler by name, ignoring ASCII case
    pub fn handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers
            .load()
            .iter()
            .find(|h| h.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Registered handlers, in order
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers.load_full().as_ref().clone()
    }

    /// Introspection snapshot
    pub fn description(&self) -> InstanceDescription {
        InstanceDescription {
            name: self.name().to_string(),
            class_name: self.class_name().to_string(),
            state: self.state(),
            created_objects: self.objects.read().len(),
            handlers: self
                .handlers
                .load()
                .iter()
                .map(|h| h.description())
                .collect(),
        }
    }

    /// Instance name; the class name until configured
    pub fn name(&self) -> &str {
        self.name
            .get()
            .map_or_else(|| self.component_type.class_name(), String::as_str)
    }

    /// Implementation class name
    pub fn class_name(&self) -> &str {
        self.component_type.class_name()
    }

    /// Current state
    pub fn state(&self) -> InstanceState {
        self.lifecycle.lock().state
    }

    /// Whether the instance is INVALID or VALID
    pub fn is_started(&self) -> bool {
        self.state().is_started()
    }

    /// Observe state changes
    pub fn add_instance_state_listener(&self, listener: Arc<dyn InstanceStateListener>) {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Stop observing state changes
    pub fn remove_instance_state_listener(&self, listener: &Arc<dyn InstanceStateListener>) {
        self.listeners.write().retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Weak handle for handlers and component objects
    pub fn handle(&self) -> InstanceHandle {
        InstanceHandle::new(self.this.clone())
    }

    /// Component type
    pub fn component_type(&self) -> &Arc<dyn ComponentType> {
        &self.component_type
    }

    /// Registry
    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    /// Runtime settings the handlers were configured with
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }
}

fn add_unique(handlers: &mut HandlerList, handler: &Arc<dyn Handler>) {
    if !handlers.iter().any(|h| Arc::ptr_eq(h, handler)) {
        handlers.push(Arc::clone(handler));
    }
}

fn without<K: Clone + Eq + std::hash::Hash>(
    current: &Arc<HashMap<K, HandlerList>>,
    handler: &Arc<dyn Handler>,
) -> HashMap<K, HandlerList> {
    current
        .iter()
        .filter_map(|(key, handlers)| {
            let kept: HandlerList = handlers
                .iter()
                .filter(|h| !Arc::ptr_eq(h, handler))
                .cloned()
                .collect();
            (!kept.is_empty()).then(|| (key.clone(), kept))
        })
        .collect()
}

impl std::fmt::Debug for InstanceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceManager")
            .field("name", &self.name())
            .field("class_name", &self.class_name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
