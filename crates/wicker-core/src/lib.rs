//! # Wicker Core
//!
//! Application-wiring and lifecycle kernel. Independently authored libraries
//! register named services (factory functions); the kernel resolves them in a
//! controlled order and drives the process through a fixed sequence of
//! lifecycle stages from bootstrap to teardown.

pub mod config;
pub mod event;
pub mod kernel;
pub mod lifecycle;
pub mod registry;
pub mod wiring;

// Re-export the types most callers need
pub use kernel::Kernel;
pub use kernel::bootstrap::BootstrapOptions;
pub use kernel::error::{BoxError, Error, Result};
pub use kernel::fatal::{ExitFatalHandler, FatalHandler, RecordingFatalHandler};
pub use lifecycle::{LifecycleHandle, LifecycleStage};
pub use registry::{ServiceHandle, ServiceInstance};
pub use wiring::{ApplicationDefinition, LibraryDefinition, ServiceContext, ServiceFactory, service_fn};
pub use event::{Event, EventBus, EventResult};
