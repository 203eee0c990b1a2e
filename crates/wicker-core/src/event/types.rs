//! Events the kernel itself publishes on the process-wide bus.

use std::any::Any;
use std::time::Duration;

use crate::event::Event;

/// Published after the `Ready` stage completes during bootstrap.
#[derive(Debug, Clone)]
pub struct ApplicationReadyEvent {
    pub application: String,
    /// Wall time from bootstrap entry to the end of the `Ready` stage
    pub boot_time: Duration,
}

impl Event for ApplicationReadyEvent {
    fn name(&self) -> &'static str {
        "kernel::application_ready"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Published when a shutdown is initiated, before the shutdown stages run.
#[derive(Debug, Clone)]
pub struct ShutdownRequestedEvent {
    pub application: String,
}

impl Event for ShutdownRequestedEvent {
    fn name(&self) -> &'static str {
        "kernel::shutdown_requested"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
