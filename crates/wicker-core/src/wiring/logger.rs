//! Scope-tagged logger handed to each service.

use std::sync::Arc;

/// Thin wrapper over the `log` facade that prefixes every record with the
/// owning `project:service` scope.
#[derive(Clone, Debug)]
pub struct ScopedLogger {
    scope: Arc<str>,
}

impl ScopedLogger {
    pub fn new(scope: impl AsRef<str>) -> Self {
        Self {
            scope: Arc::from(scope.as_ref()),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Derive a logger for a sub-component of this service
    pub fn child(&self, suffix: &str) -> ScopedLogger {
        ScopedLogger::new(format!("{}:{}", self.scope, suffix))
    }

    pub fn trace(&self, message: &str) {
        log::trace!("[{}] {}", self.scope, message);
    }

    pub fn debug(&self, message: &str) {
        log::debug!("[{}] {}", self.scope, message);
    }

    pub fn info(&self, message: &str) {
        log::info!("[{}] {}", self.scope, message);
    }

    pub fn warn(&self, message: &str) {
        log::warn!("[{}] {}", self.scope, message);
    }

    pub fn error(&self, message: &str) {
        log::error!("[{}] {}", self.scope, message);
    }
}
