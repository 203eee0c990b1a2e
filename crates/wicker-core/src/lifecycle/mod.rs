//! Lifecycle stage engine.
//!
//! Six fixed stages drive an application from start-up to shutdown. Each
//! stage holds a pending list of (callback, priority) registrations and a
//! closed flag set permanently once the stage executes (until a teardown
//! reopens everything). Prioritized callbacks run strictly in ascending
//! priority order; unprioritized callbacks run afterwards as one concurrent
//! batch with no ordering guarantee between them.

pub mod engine;
pub mod error;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::kernel::error::BoxError;
use crate::kernel::fatal::FatalHandler;

/// The fixed lifecycle stage sequence.
///
/// `PreInit` through `Ready` run during bootstrap, in this order. The two
/// shutdown stages never run automatically; they are executed by whoever
/// initiates shutdown (typically the signal handler) before teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    PreInit,
    PostConfig,
    Bootstrap,
    Ready,
    ShutdownStart,
    ShutdownComplete,
}

impl LifecycleStage {
    /// All stages, in execution order
    pub const ALL: [LifecycleStage; 6] = [
        LifecycleStage::PreInit,
        LifecycleStage::PostConfig,
        LifecycleStage::Bootstrap,
        LifecycleStage::Ready,
        LifecycleStage::ShutdownStart,
        LifecycleStage::ShutdownComplete,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            LifecycleStage::PreInit => 0,
            LifecycleStage::PostConfig => 1,
            LifecycleStage::Bootstrap => 2,
            LifecycleStage::Ready => 3,
            LifecycleStage::ShutdownStart => 4,
            LifecycleStage::ShutdownComplete => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LifecycleStage::PreInit => "PreInit",
            LifecycleStage::PostConfig => "PostConfig",
            LifecycleStage::Bootstrap => "Bootstrap",
            LifecycleStage::Ready => "Ready",
            LifecycleStage::ShutdownStart => "ShutdownStart",
            LifecycleStage::ShutdownComplete => "ShutdownComplete",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Future returned by a stage callback
pub type CallbackFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

/// A one-shot stage callback
pub type StageCallback = Box<dyn FnOnce() -> CallbackFuture + Send>;

/// Per-service (or per-library) view onto the global stage engine.
///
/// Every service context carries one of these. Registrations are merged into
/// the single global per-stage lists; there is one global execution per
/// stage, not one per library. A registration against an already-closed
/// stage is logged fatal, dropped, and escalated through the fatal handler.
#[derive(Clone)]
pub struct LifecycleHandle {
    engine: SharedStageEngine,
    scope: String,
    fatal: Arc<dyn FatalHandler>,
}

impl fmt::Debug for LifecycleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHandle")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl LifecycleHandle {
    pub(crate) fn new(engine: SharedStageEngine, scope: impl Into<String>, fatal: Arc<dyn FatalHandler>) -> Self {
        Self {
            engine,
            scope: scope.into(),
            fatal,
        }
    }

    /// Attach a callback to a stage. `priority: None` places it in the
    /// unordered concurrent batch; `Some(n)` in the strictly ordered batch.
    pub async fn attach<F, Fut>(&self, stage: LifecycleStage, priority: Option<i64>, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let boxed: StageCallback = Box::new(move || Box::pin(callback()) as CallbackFuture);
        if let Err(err) = self.engine.register(stage, priority, boxed).await {
            log::error!("[{}] {}", self.scope, err);
            self.fatal.on_fatal(&format!("{}: {}", self.scope, err));
        }
    }

    pub async fn on_pre_init<F, Fut>(&self, priority: Option<i64>, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.attach(LifecycleStage::PreInit, priority, callback).await
    }

    pub async fn on_post_config<F, Fut>(&self, priority: Option<i64>, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.attach(LifecycleStage::PostConfig, priority, callback).await
    }

    pub async fn on_bootstrap<F, Fut>(&self, priority: Option<i64>, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.attach(LifecycleStage::Bootstrap, priority, callback).await
    }

    pub async fn on_ready<F, Fut>(&self, priority: Option<i64>, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.attach(LifecycleStage::Ready, priority, callback).await
    }

    pub async fn on_shutdown_start<F, Fut>(&self, priority: Option<i64>, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.attach(LifecycleStage::ShutdownStart, priority, callback).await
    }

    pub async fn on_shutdown_complete<F, Fut>(&self, priority: Option<i64>, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.attach(LifecycleStage::ShutdownComplete, priority, callback).await
    }
}

// Re-export important types
pub use engine::{SharedStageEngine, StageEngine};

// Test module declaration
#[cfg(test)]
mod tests;
