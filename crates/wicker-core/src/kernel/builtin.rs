//! The kernel's own built-in library.
//!
//! Wired before any consumer library so its stage registrations land ahead
//! of everything else. Currently contributes the heartbeat service, which
//! pins itself first on `PreInit` and reports total boot time at `Ready`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::kernel::constants::{BUILTIN_PRIORITY, KERNEL_PROJECT, KERNEL_VERSION};
use crate::registry::ServiceInstance;
use crate::wiring::{LibraryDefinition, ServiceContext, service_fn};

/// Tracks when the boot sequence started.
#[derive(Debug)]
pub struct Heartbeat {
    started: Instant,
}

impl Heartbeat {
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

pub(crate) fn library() -> LibraryDefinition {
    LibraryDefinition::new(KERNEL_PROJECT).service("heartbeat", service_fn(heartbeat_factory))
}

async fn heartbeat_factory(context: ServiceContext) -> Result<ServiceInstance, crate::kernel::error::BoxError> {
    let heartbeat = Arc::new(Heartbeat { started: Instant::now() });

    let logger = context.logger.clone();
    context
        .lifecycle
        .on_pre_init(Some(BUILTIN_PRIORITY), move || async move {
            logger.debug(&format!("kernel v{} entering boot sequence", KERNEL_VERSION));
            Ok(())
        })
        .await;

    let logger = context.logger.clone();
    let tracker = heartbeat.clone();
    context
        .lifecycle
        .on_ready(None, move || async move {
            logger.info(&format!("application ready after {:?}", tracker.uptime()));
            Ok(())
        })
        .await;

    let instance: ServiceInstance = heartbeat;
    Ok(instance)
}
