//! Module registry: per-project service declarations, resolved instances, and
//! the reverse index from registration handles back to identity.
//!
//! Projects are namespaces created implicitly on first registration and kept
//! for the life of the process (until a teardown wipes the registry). Service
//! names are unique within a project; a duplicate registration is a hard
//! error and never overwrites the first.

pub mod error;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::registry::error::RegistryError;

/// Opaque identity of a registered service, returned at registration time.
///
/// Stands in for factory-reference identity: anywhere a caller would want to
/// look a service up "by its definition", it holds one of these instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceHandle(u64);

impl ServiceHandle {
    #[cfg(test)]
    pub(crate) fn test_handle(raw: u64) -> Self {
        Self(raw)
    }
}

/// A resolved service instance. Type-erased; callers downcast through
/// [`crate::wiring::ServiceLoader::get_as`] or [`Arc::downcast`].
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Registry for service declarations and resolved instances
pub struct ModuleRegistry {
    /// project -> (service name -> handle)
    declared: HashMap<String, HashMap<String, ServiceHandle>>,
    /// Projects in first-registration order, for global name lookup
    project_order: Vec<String>,
    /// handle -> (project, service name), built at registration time
    reverse: HashMap<ServiceHandle, (String, String)>,
    /// handle -> resolved instance, populated only after successful wiring
    resolved: HashMap<ServiceHandle, ServiceInstance>,
    next_handle: u64,
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("projects", &self.project_order)
            .field("declared", &self.reverse.len())
            .field("resolved", &self.resolved.len())
            .finish()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            declared: HashMap::new(),
            project_order: Vec::new(),
            reverse: HashMap::new(),
            resolved: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Register a service name under a project. Does not invoke the factory;
    /// the only side effect is the mapping entry and its reverse-index record.
    pub fn register(&mut self, project: &str, service: &str) -> Result<ServiceHandle, RegistryError> {
        if !self.declared.contains_key(project) {
            self.project_order.push(project.to_string());
        }
        let services = self.declared.entry(project.to_string()).or_default();
        if services.contains_key(service) {
            return Err(RegistryError::DuplicateService {
                project: project.to_string(),
                service: service.to_string(),
            });
        }
        let handle = ServiceHandle(self.next_handle);
        self.next_handle += 1;
        services.insert(service.to_string(), handle);
        self.reverse.insert(handle, (project.to_string(), service.to_string()));
        Ok(handle)
    }

    /// Record the resolved instance for a previously registered service.
    pub fn store_resolved(&mut self, handle: ServiceHandle, instance: ServiceInstance) {
        self.resolved.insert(handle, instance);
    }

    /// Look up a resolved instance. `None` means unknown or not yet wired;
    /// a merely-unwired service is not an error here.
    pub fn resolve(&self, project: &str, service: &str) -> Option<ServiceInstance> {
        let handle = self.declared.get(project)?.get(service)?;
        self.resolved.get(handle).cloned()
    }

    /// Reverse lookup: handle back to its (project, service) identity.
    pub fn identity_of(&self, handle: ServiceHandle) -> Result<(String, String), RegistryError> {
        self.reverse
            .get(&handle)
            .cloned()
            .ok_or(RegistryError::UnknownHandle { handle })
    }

    /// Resolve by registration handle (global, project-agnostic).
    pub fn resolve_by_handle(&self, handle: ServiceHandle) -> Result<Option<ServiceInstance>, RegistryError> {
        if !self.reverse.contains_key(&handle) {
            return Err(RegistryError::UnknownHandle { handle });
        }
        Ok(self.resolved.get(&handle).cloned())
    }

    /// Global name lookup: the first project (in registration order) that
    /// declares `service`. Deliberately first-wins when several projects
    /// declare the same name.
    pub fn find_project_for(&self, service: &str) -> Option<&str> {
        self.project_order
            .iter()
            .find(|project| {
                self.declared
                    .get(project.as_str())
                    .is_some_and(|services| services.contains_key(service))
            })
            .map(|project| project.as_str())
    }

    /// All projects in first-registration order
    pub fn project_names(&self) -> Vec<String> {
        self.project_order.clone()
    }

    /// Number of declared services across all projects
    pub fn declared_count(&self) -> usize {
        self.reverse.len()
    }

    /// Wipe all declarations and resolved instances (teardown path)
    pub fn clear(&mut self) {
        self.declared.clear();
        self.project_order.clear();
        self.reverse.clear();
        self.resolved.clear();
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe module registry handle
#[derive(Clone, Debug)]
pub struct SharedModuleRegistry {
    registry: Arc<Mutex<ModuleRegistry>>,
}

impl SharedModuleRegistry {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(ModuleRegistry::new())),
        }
    }

    pub async fn register(&self, project: &str, service: &str) -> Result<ServiceHandle, RegistryError> {
        let mut registry = self.registry.lock().await;
        registry.register(project, service)
    }

    pub async fn store_resolved(&self, handle: ServiceHandle, instance: ServiceInstance) {
        let mut registry = self.registry.lock().await;
        registry.store_resolved(handle, instance);
    }

    pub async fn resolve(&self, project: &str, service: &str) -> Option<ServiceInstance> {
        let registry = self.registry.lock().await;
        registry.resolve(project, service)
    }

    pub async fn identity_of(&self, handle: ServiceHandle) -> Result<(String, String), RegistryError> {
        let registry = self.registry.lock().await;
        registry.identity_of(handle)
    }

    pub async fn resolve_by_handle(&self, handle: ServiceHandle) -> Result<Option<ServiceInstance>, RegistryError> {
        let registry = self.registry.lock().await;
        registry.resolve_by_handle(handle)
    }

    pub async fn find_project_for(&self, service: &str) -> Option<String> {
        let registry = self.registry.lock().await;
        registry.find_project_for(service).map(str::to_string)
    }

    pub async fn project_names(&self) -> Vec<String> {
        let registry = self.registry.lock().await;
        registry.project_names()
    }

    pub async fn clear(&self) {
        let mut registry = self.registry.lock().await;
        registry.clear();
    }
}

impl Default for SharedModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Test module declaration
#[cfg(test)]
mod tests;
