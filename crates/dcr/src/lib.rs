//! # Dynamic Component Runtime
//!
//! Service-oriented component instances with a managed lifecycle. Each
//! instance declares service requirements; the runtime binds it to
//! matching providers in a service registry, tracks provider churn and
//! moves the instance between INVALID and VALID as requirements come and
//! go.
//!
//! ## Example
//!
//! ```ignore
//! use dcr::{ConfigLoader, InstanceConfiguration, RuntimeContext};
//!
//! let context = dcr::bootstrap(&ConfigLoader::new())?;
//! let factory = context.register_factory(metadata, Arc::new(MyComponent))?;
//! let instance = factory.create_instance(InstanceConfiguration::named("client"))?;
//! context.global_registry().register(["demo.Hello"], Arc::new(hello), Properties::new())?;
//! assert_eq!(instance.state(), InstanceState::Valid);
//! context.shutdown();
//! ```
//!
//! ## Architecture
//!
//! - `domain` - value objects, ports and the error type
//! - `application` - instance manager, handlers and dependency binding
//! - `providers` - service registry adapters
//! - `infrastructure` - configuration, logging and the runtime context

/// Domain layer - value objects, ports and errors
pub mod domain {
    pub use dcr_domain::*;
}

/// Application layer - the engine
pub mod application {
    pub use dcr_application::*;
}

/// Registry adapters
pub mod providers {
    pub use dcr_providers::*;
}

/// Infrastructure layer - configuration, logging and composition root
pub mod infrastructure {
    pub use dcr_infrastructure::*;
}

// Re-export commonly used types at the crate root
pub use dcr_application::{
    ComponentFactory, ComponentType, Handler, HandlerFactoryEntry, HandlerRegistration,
    InstanceHandle, InstanceManager, InstantiationContext, RuntimeSettings, HANDLER_FACTORIES,
};
pub use dcr_domain::{
    BindingPolicy, ComponentMetadata, ComponentObject, Error, InstanceConfiguration,
    InstanceState, Properties, RequirementMetadata, Result,
};
pub use dcr_infrastructure::{AppConfig, ConfigLoader, RuntimeContext};
pub use dcr_providers::{InMemoryServiceRegistry, ScopePolicy, ServiceRegistration};

/// Load the configuration, install logging and build a runtime context
pub fn bootstrap(loader: &ConfigLoader) -> Result<RuntimeContext> {
    let config = loader.load()?;
    dcr_infrastructure::logging::init_logging(&config.logging)?;
    Ok(RuntimeContext::new(config))
}
