//! Top-level kernel error type.
//!
//! Subsystems own their error enums ([`RegistryError`], [`LifecycleError`],
//! [`WiringError`], [`ConfigError`]); this module aggregates them into the
//! [`Error`] type the orchestrator works with, plus the two recoverable
//! orchestration errors (`DualBoot`, `NoActiveApplication`).

use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::error::ConfigError;
use crate::lifecycle::error::LifecycleError;
use crate::registry::error::RegistryError;
use crate::wiring::error::WiringError;

/// Boxed error used at the boundaries where service code hands failures back
/// to the kernel (factories, lifecycle callbacks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Module registry error
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Lifecycle stage engine error
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Service wiring error
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),

    /// Configuration store error
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Bootstrap was invoked while another application is already active.
    /// Returned before any state is mutated.
    #[error("application '{active}' is already active; refusing to bootstrap '{attempted}'")]
    DualBoot { active: String, attempted: String },

    /// Teardown was invoked while no application is active
    #[error("no active application")]
    NoActiveApplication,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Shorthand for Result with the kernel error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
