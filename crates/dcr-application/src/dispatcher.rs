//! Callback dispatcher
//!
//! Invokes lifecycle and binding callbacks on component objects. A failing
//! callback is logged and stops the owning instance; the failure is
//! returned so the caller can abandon the remaining work.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use dcr_domain::{
    CallbackArg, CallbackKind, ComponentObject, Error, InvocationError, ProviderObject,
    ProviderRef, Result,
};
use tracing::{debug, error};

use crate::instance::InstanceHandle;

/// Invokes component callbacks on behalf of one instance
#[derive(Clone, Default)]
pub struct CallbackDispatcher {
    instance: InstanceHandle,
}

impl CallbackDispatcher {
    /// Dispatcher for `instance`
    pub fn new(instance: InstanceHandle) -> Self {
        Self { instance }
    }

    /// Invoke a validate/invalidate callback
    pub fn invoke_lifecycle(&self, object: &Arc<dyn ComponentObject>, method: &str) -> Result<()> {
        self.invoke(object, method, &[])
    }

    /// Invoke a bind/unbind/modified callback
    ///
    /// The callback receives the service object (when resolved), the
    /// provider reference and the provider properties, in that order.
    pub fn invoke_binding(
        &self,
        object: &Arc<dyn ComponentObject>,
        kind: CallbackKind,
        method: &str,
        reference: &ProviderRef,
        service: Option<&ProviderObject>,
    ) -> Result<()> {
        let mut args = Vec::with_capacity(3);
        if let Some(service) = service {
            args.push(CallbackArg::Service(Arc::clone(service)));
        }
        args.push(CallbackArg::Reference(reference.clone()));
        args.push(CallbackArg::Properties(reference.properties()));

        debug!(
            instance = %self.instance.name(),
            callback = %kind,
            method,
            provider = %reference,
            "Invoking binding callback"
        );
        self.invoke(object, method, &args)
    }

    fn invoke(
        &self,
        object: &Arc<dyn ComponentObject>,
        method: &str,
        args: &[CallbackArg],
    ) -> Result<()> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| object.invoke(method, args)));
        let message = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(InvocationError::Failed(source))) => format!("{source:#}"),
            Ok(Err(other)) => other.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        let class_name = self.instance.class_name();
        let err = Error::callback(method, class_name, message);
        error!(
            instance = %self.instance.name(),
            error = %err,
            "Callback failed; stopping the instance"
        );
        self.instance.stop();
        Err(err)
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
