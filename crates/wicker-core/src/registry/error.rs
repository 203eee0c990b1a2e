//! Error types for the module registry.

use thiserror::Error;

use crate::registry::ServiceHandle;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("service '{service}' is already registered under project '{project}'")]
    DuplicateService { project: String, service: String },

    #[error("service handle {handle:?} was never registered")]
    UnknownHandle { handle: ServiceHandle },
}
