//! Service loader: the per-service view into the resolved-module maps.

use std::fmt;

use crate::registry::error::RegistryError;
use crate::registry::{ServiceHandle, ServiceInstance, SharedModuleRegistry};

/// Resolves other already-resolved services, either by name (scoped to the
/// owning project), by name globally, or by registration handle.
#[derive(Clone)]
pub struct ServiceLoader {
    registry: SharedModuleRegistry,
    project: String,
}

impl fmt::Debug for ServiceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceLoader")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

impl ServiceLoader {
    pub(crate) fn new(registry: SharedModuleRegistry, project: impl Into<String>) -> Self {
        Self {
            registry,
            project: project.into(),
        }
    }

    /// Resolve a service of the owning project by name. `None` while unwired.
    pub async fn get(&self, service: &str) -> Option<ServiceInstance> {
        self.registry.resolve(&self.project, service).await
    }

    /// Resolve and downcast in one step
    pub async fn get_as<T: Send + Sync + 'static>(&self, service: &str) -> Option<std::sync::Arc<T>> {
        self.get(service).await.and_then(|instance| instance.downcast::<T>().ok())
    }

    /// Resolve by name across all projects, first declaring project (in
    /// registration order) wins.
    pub async fn find(&self, service: &str) -> Option<ServiceInstance> {
        let project = self.registry.find_project_for(service).await?;
        self.registry.resolve(&project, service).await
    }

    /// Resolve by registration handle (global). Errors only for handles that
    /// were never registered.
    pub async fn get_by_handle(&self, handle: ServiceHandle) -> Result<Option<ServiceInstance>, RegistryError> {
        self.registry.resolve_by_handle(handle).await
    }

    /// Identity behind a handle: `(project, service)`
    pub async fn identity_of(&self, handle: ServiceHandle) -> Result<(String, String), RegistryError> {
        self.registry.identity_of(handle).await
    }

    pub fn project(&self) -> &str {
        &self.project
    }
}
