//! Service wiring protocol.
//!
//! A library is a named bundle of service factories. During bootstrap the
//! kernel walks each library's services in declaration order, registers the
//! name, builds the per-service context, and invokes the factory. A factory
//! failure is boot-blocking: the error is logged fatal and escalated rather
//! than returned to the registering code.

pub mod error;
pub mod loader;
pub mod logger;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ConfigAccessor, SharedConfigStore};
use crate::event::EventBus;
use crate::kernel::error::BoxError;
use crate::kernel::fatal::FatalHandler;
use crate::lifecycle::LifecycleHandle;
use crate::lifecycle::engine::SharedStageEngine;
use crate::registry::{ServiceInstance, SharedModuleRegistry};
use crate::wiring::error::WiringError;

/// Everything a factory gets to work with while building its service.
#[derive(Clone, Debug)]
pub struct ServiceContext {
    /// Logger tagged `project:service`
    pub logger: ScopedLogger,
    /// Config reads scoped to the owning project
    pub config: ConfigAccessor,
    /// Process-wide publish/subscribe channel for this boot
    pub events: EventBus,
    /// Access to other already-resolved services
    pub loader: ServiceLoader,
    /// This service's view onto the global lifecycle stages
    pub lifecycle: LifecycleHandle,
}

/// Builds one service instance from its context.
#[async_trait]
pub trait ServiceFactory: Send + Sync {
    async fn build(&self, context: ServiceContext) -> Result<ServiceInstance, BoxError>;
}

struct FnFactory<F> {
    function: F,
}

#[async_trait]
impl<F, Fut> ServiceFactory for FnFactory<F>
where
    F: Fn(ServiceContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<ServiceInstance, BoxError>> + Send,
{
    async fn build(&self, context: ServiceContext) -> Result<ServiceInstance, BoxError> {
        (self.function)(context).await
    }
}

/// Adapter turning an async closure into a [`ServiceFactory`]
pub fn service_fn<F, Fut>(function: F) -> impl ServiceFactory
where
    F: Fn(ServiceContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<ServiceInstance, BoxError>> + Send,
{
    FnFactory { function }
}

pub(crate) struct ServiceEntry {
    pub(crate) name: String,
    pub(crate) factory: Box<dyn ServiceFactory>,
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A named bundle of service factories contributed by one library.
#[derive(Debug)]
pub struct LibraryDefinition {
    name: String,
    services: Vec<ServiceEntry>,
}

impl LibraryDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            services: Vec::new(),
        }
    }

    /// Declare a service. Declaration order is wiring order.
    pub fn service(mut self, name: impl Into<String>, factory: impl ServiceFactory + 'static) -> Self {
        self.services.push(ServiceEntry {
            name: name.into(),
            factory: Box::new(factory),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (String, Vec<ServiceEntry>) {
        (self.name, self.services)
    }
}

/// The application handed to bootstrap: its libraries plus any services
/// declared inline on the application itself (wired under the application's
/// own name, after every library).
#[derive(Debug)]
pub struct ApplicationDefinition {
    name: String,
    libraries: Vec<LibraryDefinition>,
    services: Vec<ServiceEntry>,
}

impl ApplicationDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            libraries: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Attach a library. Attachment order is wiring order.
    pub fn library(mut self, library: LibraryDefinition) -> Self {
        self.libraries.push(library);
        self
    }

    /// Declare an inline application service
    pub fn service(mut self, name: impl Into<String>, factory: impl ServiceFactory + 'static) -> Self {
        self.services.push(ServiceEntry {
            name: name.into(),
            factory: Box::new(factory),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (String, Vec<LibraryDefinition>, Vec<ServiceEntry>) {
        (self.name, self.libraries, self.services)
    }
}

/// Shared collaborators the wiring walk threads into every context.
#[derive(Clone)]
pub(crate) struct WiringDeps {
    pub(crate) registry: SharedModuleRegistry,
    pub(crate) config: SharedConfigStore,
    pub(crate) events: EventBus,
    pub(crate) engine: SharedStageEngine,
    pub(crate) fatal: Arc<dyn FatalHandler>,
}

/// Wire one project's services sequentially in declaration order. The first
/// failure short-circuits the remainder of this project's list; other
/// projects are unaffected by design.
pub(crate) async fn wire_services(
    deps: &WiringDeps,
    project: &str,
    services: Vec<ServiceEntry>,
) -> Result<(), WiringError> {
    for entry in services {
        let handle = deps.registry.register(project, &entry.name).await?;
        let scope = format!("{}:{}", project, entry.name);
        log::debug!("wiring service {}", scope);

        let context = ServiceContext {
            logger: ScopedLogger::new(&scope),
            config: ConfigAccessor::new(deps.config.clone(), project),
            events: deps.events.clone(),
            loader: ServiceLoader::new(deps.registry.clone(), project),
            lifecycle: LifecycleHandle::new(deps.engine.clone(), &scope, deps.fatal.clone()),
        };

        match entry.factory.build(context).await {
            Ok(instance) => deps.registry.store_resolved(handle, instance).await,
            Err(source) => {
                return Err(WiringError::ServiceInitialization {
                    project: project.to_string(),
                    service: entry.name,
                    source,
                });
            }
        }
    }
    Ok(())
}

// Re-export important types
pub use loader::ServiceLoader;
pub use logger::ScopedLogger;
