//! Error types for the service wiring protocol.

use thiserror::Error;

use crate::kernel::error::BoxError;
use crate::registry::error::RegistryError;

#[derive(Debug, Error)]
pub enum WiringError {
    /// A factory failed while building its service. Treated as a
    /// boot-blocking condition, not a recoverable per-service fault.
    #[error("failed to initialize service '{project}:{service}': {source}")]
    ServiceInitialization {
        project: String,
        service: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
