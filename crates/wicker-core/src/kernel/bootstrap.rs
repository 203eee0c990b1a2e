//! Bootstrap/teardown orchestrator.
//!
//! The kernel owns the single active-application slot and sequences library
//! wiring, configuration loading, and the lifecycle stages. It is an
//! explicit value handed to whoever needs it, never ambient global state;
//! clones share the same underlying slot, registry, engine, and config.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::{ConfigOverrides, SharedConfigStore};
use crate::event::types::{ApplicationReadyEvent, ShutdownRequestedEvent};
use crate::event::EventBus;
use crate::kernel::builtin;
use crate::kernel::constants::KERNEL_PROJECT;
use crate::kernel::error::{Error, Result};
use crate::kernel::fatal::{ExitFatalHandler, FatalHandler};
use crate::lifecycle::LifecycleStage;
use crate::lifecycle::engine::SharedStageEngine;
use crate::registry::{ServiceInstance, SharedModuleRegistry};
use crate::wiring::{ApplicationDefinition, WiringDeps, wire_services};

/// Options accepted by [`Kernel::bootstrap`].
#[derive(Debug, Default)]
pub struct BootstrapOptions {
    /// Inline configuration overrides: project -> property -> value.
    /// Outrank every loaded configuration source.
    pub config: ConfigOverrides,
    /// Optional TOML configuration file loaded between `PreInit` and
    /// `PostConfig` (lowest precedence). Ignored without the `toml-config`
    /// feature.
    pub config_file: Option<PathBuf>,
}

impl BootstrapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, project: &str, property: &str, value: serde_json::Value) -> Self {
        self.config
            .entry(project.to_string())
            .or_default()
            .insert(property.to_string(), value);
        self
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }
}

struct ActiveApplication {
    name: String,
    booted_at: Instant,
}

/// Application-wiring and lifecycle kernel.
///
/// At most one application is active per kernel at a time. `bootstrap` wires
/// the built-in library, then every application library sequentially, then
/// runs `PreInit -> PostConfig -> Bootstrap -> Ready`. The shutdown stages
/// run only through [`Kernel::shutdown`] (or the installed signal handler),
/// never automatically.
#[derive(Clone)]
pub struct Kernel {
    registry: SharedModuleRegistry,
    engine: SharedStageEngine,
    config: SharedConfigStore,
    events: Arc<Mutex<Option<EventBus>>>,
    active: Arc<Mutex<Option<ActiveApplication>>>,
    signal_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    fatal: Arc<dyn FatalHandler>,
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Kernel {
    /// Kernel with the production fail-fast handler (process exit).
    pub fn new() -> Self {
        Self::with_fatal_handler(Arc::new(ExitFatalHandler))
    }

    /// Kernel with an injected fail-fast handler, for tests and embedders
    /// that manage process lifetime themselves.
    pub fn with_fatal_handler(fatal: Arc<dyn FatalHandler>) -> Self {
        Self {
            registry: SharedModuleRegistry::new(),
            engine: SharedStageEngine::new(),
            config: SharedConfigStore::new(),
            events: Arc::new(Mutex::new(None)),
            active: Arc::new(Mutex::new(None)),
            signal_task: Arc::new(Mutex::new(None)),
            fatal,
        }
    }

    /// Bootstrap an application.
    ///
    /// Returns `DualBoot` (without mutating anything) if an application is
    /// already active. Any failure past that point is logged fatal and
    /// routed to the fatal handler instead of propagating: this call is the
    /// top of the escalation chain, and a failed boot leaves the kernel in a
    /// degraded active state with a fail-fast already triggered.
    pub async fn bootstrap(&self, application: ApplicationDefinition, options: BootstrapOptions) -> Result<()> {
        {
            let mut active = self.active.lock().await;
            if let Some(current) = active.as_ref() {
                return Err(Error::DualBoot {
                    active: current.name.clone(),
                    attempted: application.name().to_string(),
                });
            }
            *active = Some(ActiveApplication {
                name: application.name().to_string(),
                booted_at: Instant::now(),
            });
        }

        // Fresh channel per boot
        let events = EventBus::new();
        *self.events.lock().await = Some(events.clone());

        let app_name = application.name().to_string();
        log::info!("bootstrapping application '{}'", app_name);
        if let Err(err) = self.run_boot_sequence(application, options, events).await {
            log::error!("bootstrap of '{}' failed: {}", app_name, err);
            self.fatal.on_fatal(&format!("bootstrap of '{}' failed: {}", app_name, err));
        }
        Ok(())
    }

    async fn run_boot_sequence(
        &self,
        application: ApplicationDefinition,
        options: BootstrapOptions,
        events: EventBus,
    ) -> Result<()> {
        let deps = WiringDeps {
            registry: self.registry.clone(),
            config: self.config.clone(),
            events: events.clone(),
            engine: self.engine.clone(),
            fatal: self.fatal.clone(),
        };

        // The kernel's own library goes first so its stage registrations
        // land ahead of all consumer code
        let (_, builtin_services) = builtin::library().into_parts();
        wire_services(&deps, KERNEL_PROJECT, builtin_services).await?;

        self.config.merge(options.config).await;
        self.install_signal_handler().await;

        let (app_name, libraries, inline_services) = application.into_parts();
        for library in libraries {
            let (project, services) = library.into_parts();
            wire_services(&deps, &project, services).await?;
        }
        if !inline_services.is_empty() {
            wire_services(&deps, &app_name, inline_services).await?;
        }

        self.engine.run(LifecycleStage::PreInit).await?;
        self.load_external_config(options.config_file.as_deref()).await?;
        self.engine.run(LifecycleStage::PostConfig).await?;
        self.engine.run(LifecycleStage::Bootstrap).await?;
        self.engine.run(LifecycleStage::Ready).await?;

        let boot_time = {
            let active = self.active.lock().await;
            active.as_ref().map(|app| app.booted_at.elapsed()).unwrap_or_default()
        };
        log::info!("application '{}' ready in {:?}", app_name, boot_time);
        events
            .publish(&ApplicationReadyEvent {
                application: app_name,
                boot_time,
            })
            .await;
        Ok(())
    }

    /// Load the external configuration sources between `PreInit` and
    /// `PostConfig`. Values already present (bootstrap overrides) keep
    /// their place; environment outranks the file.
    async fn load_external_config(&self, config_file: Option<&std::path::Path>) -> Result<()> {
        let projects = self.registry.project_names().await;
        self.config.load_environment(&projects).await;

        #[cfg(feature = "toml-config")]
        if let Some(path) = config_file {
            self.config.load_file(path).await?;
        }
        #[cfg(not(feature = "toml-config"))]
        if let Some(path) = config_file {
            log::warn!(
                "config file {} ignored: built without the 'toml-config' feature",
                path.display()
            );
        }
        Ok(())
    }

    #[cfg(unix)]
    async fn install_signal_handler(&self) {
        use tokio::signal::unix::{SignalKind, signal};

        // The streams must exist before this returns: a signal arriving
        // between bootstrap completing and the listener's first poll would
        // otherwise hit the default disposition and kill the process
        let mut term = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                log::error!("failed to install SIGTERM handler: {}", err);
                return;
            }
        };
        let mut int = match signal(SignalKind::interrupt()) {
            Ok(stream) => stream,
            Err(err) => {
                log::error!("failed to install SIGINT handler: {}", err);
                return;
            }
        };

        let kernel = self.clone();
        // Hold the slot across the spawn so the listener can never observe
        // it empty once a signal arrives
        let mut slot = self.signal_task.lock().await;
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = term.recv() => log::warn!("received SIGTERM"),
                _ = int.recv() => log::warn!("received SIGINT"),
            }
            kernel.on_termination_signal().await;
        });
        *slot = Some(task);
    }

    #[cfg(not(unix))]
    async fn install_signal_handler(&self) {
        let kernel = self.clone();
        let mut slot = self.signal_task.lock().await;
        let task = tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                log::error!("failed to install ctrl-c handler: {}", err);
                return;
            }
            log::warn!("received ctrl-c");
            kernel.on_termination_signal().await;
        });
        *slot = Some(task);
    }

    /// The path the signal listener takes after a termination signal: run a
    /// full shutdown, then escalate. The listener's own task handle is
    /// dropped first so teardown never aborts the task that is running it.
    pub(crate) async fn on_termination_signal(&self) {
        self.signal_task.lock().await.take();
        if let Err(err) = self.shutdown().await {
            log::error!("shutdown after signal failed: {}", err);
        }
        self.fail_fast("terminated by signal");
    }

    /// Run both shutdown stages in order, then tear down. This is the path
    /// the signal handler takes; embedders stopping cleanly call it too.
    pub async fn shutdown(&self) -> Result<()> {
        let name = {
            let active = self.active.lock().await;
            active.as_ref().map(|app| app.name.clone()).ok_or(Error::NoActiveApplication)?
        };
        log::info!("shutting down application '{}'", name);

        if let Some(events) = self.events().await {
            events.publish(&ShutdownRequestedEvent { application: name }).await;
        }
        for stage in [LifecycleStage::ShutdownStart, LifecycleStage::ShutdownComplete] {
            if let Err(err) = self.engine.run(stage).await {
                // Keep going; a failing shutdown callback must not block teardown
                log::error!("{} stage failed during shutdown: {}", stage, err);
            }
        }
        self.teardown().await
    }

    /// Clear the active slot and reset kernel state: stages reopen with
    /// empty pending lists, the signal handler is removed, the event bus and
    /// all registrations are dropped. Does not run the shutdown stages.
    pub async fn teardown(&self) -> Result<()> {
        let application = {
            let mut active = self.active.lock().await;
            active.take().ok_or(Error::NoActiveApplication)?
        };
        if let Some(task) = self.signal_task.lock().await.take() {
            task.abort();
        }
        self.engine.reset().await;
        self.registry.clear().await;
        self.config.clear().await;
        *self.events.lock().await = None;
        log::info!("application '{}' torn down", application.name);
        Ok(())
    }

    /// Escalate a non-recoverable condition. The production handler never
    /// returns from this.
    pub fn fail_fast(&self, reason: &str) {
        self.fatal.on_fatal(reason);
    }

    /// Execute a single lifecycle stage through the engine. Exposed for
    /// callers driving the shutdown stages manually before teardown.
    pub async fn run_stage(&self, stage: LifecycleStage) -> Result<()> {
        self.engine.run(stage).await.map_err(Error::from)
    }

    /// Resolve a service instance by project and name
    pub async fn resolve(&self, project: &str, service: &str) -> Option<ServiceInstance> {
        self.registry.resolve(project, service).await
    }

    pub async fn active_application(&self) -> Option<String> {
        let active = self.active.lock().await;
        active.as_ref().map(|app| app.name.clone())
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// The event bus of the current boot, if an application is active
    pub async fn events(&self) -> Option<EventBus> {
        self.events.lock().await.clone()
    }

    pub fn registry(&self) -> SharedModuleRegistry {
        self.registry.clone()
    }

    pub fn config(&self) -> SharedConfigStore {
        self.config.clone()
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}
