//! Stage engine: per-stage pending lists, closed flags, and execution.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::{LifecycleStage, StageCallback};

struct PendingCallback {
    /// Registration order, used as the tie-break for equal priorities
    seq: u64,
    /// `None` means the unordered concurrent batch
    priority: Option<i64>,
    callback: StageCallback,
}

#[derive(Default)]
struct StageSlot {
    closed: bool,
    pending: Vec<PendingCallback>,
}

/// Stage engine state: one slot per lifecycle stage
pub struct StageEngine {
    slots: [StageSlot; 6],
    next_seq: u64,
}

impl fmt::Debug for StageEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("StageEngine");
        for stage in LifecycleStage::ALL {
            let slot = &self.slots[stage.index()];
            dbg.field(stage.name(), &format!("closed={} pending={}", slot.closed, slot.pending.len()));
        }
        dbg.finish()
    }
}

impl StageEngine {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            next_seq: 0,
        }
    }

    /// Queue a callback on a stage. Rejected once the stage has executed.
    pub fn register(
        &mut self,
        stage: LifecycleStage,
        priority: Option<i64>,
        callback: StageCallback,
    ) -> Result<(), LifecycleError> {
        let seq = self.next_seq;
        self.next_seq += 1;
        let slot = &mut self.slots[stage.index()];
        if slot.closed {
            return Err(LifecycleError::LateRegistration { stage });
        }
        slot.pending.push(PendingCallback { seq, priority, callback });
        Ok(())
    }

    /// Close the stage and take its pending callbacks. Closing happens
    /// before execution so that callbacks registering against their own
    /// stage are caught as late registrations.
    fn close_and_drain(&mut self, stage: LifecycleStage) -> Result<Vec<PendingCallback>, LifecycleError> {
        let slot = &mut self.slots[stage.index()];
        if slot.closed {
            return Err(LifecycleError::StageClosed { stage });
        }
        slot.closed = true;
        Ok(std::mem::take(&mut slot.pending))
    }

    pub fn is_closed(&self, stage: LifecycleStage) -> bool {
        self.slots[stage.index()].closed
    }

    pub fn pending_count(&self, stage: LifecycleStage) -> usize {
        self.slots[stage.index()].pending.len()
    }

    /// Reopen every stage with an empty pending list (teardown path)
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.closed = false;
            slot.pending.clear();
        }
    }
}

impl Default for StageEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe stage engine handle.
///
/// `run` holds the lock only long enough to close the stage and drain its
/// callbacks; execution happens unlocked so callbacks can register against
/// later stages or resolve services.
#[derive(Clone)]
pub struct SharedStageEngine {
    engine: Arc<Mutex<StageEngine>>,
}

impl fmt::Debug for SharedStageEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStageEngine").finish_non_exhaustive()
    }
}

impl SharedStageEngine {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(Mutex::new(StageEngine::new())),
        }
    }

    pub async fn register(
        &self,
        stage: LifecycleStage,
        priority: Option<i64>,
        callback: StageCallback,
    ) -> Result<(), LifecycleError> {
        let mut engine = self.engine.lock().await;
        engine.register(stage, priority, callback)
    }

    /// Execute a stage: prioritized callbacks strictly sequentially in
    /// ascending (priority, registration) order, each awaited to completion
    /// before the next starts; then the unprioritized batch concurrently.
    /// The stage is finished only once every batch member has completed;
    /// batch failures are collected and raised together afterwards.
    pub async fn run(&self, stage: LifecycleStage) -> Result<(), LifecycleError> {
        let drained = {
            let mut engine = self.engine.lock().await;
            engine.close_and_drain(stage)?
        };

        let total = drained.len();
        let (mut ordered, unordered): (Vec<_>, Vec<_>) =
            drained.into_iter().partition(|pending| pending.priority.is_some());
        ordered.sort_by_key(|pending| (pending.priority, pending.seq));

        log::debug!(
            "running stage {}: {} ordered, {} concurrent of {} total",
            stage,
            ordered.len(),
            unordered.len(),
            total
        );

        for pending in ordered {
            (pending.callback)()
                .await
                .map_err(|source| LifecycleError::CallbackFailed { stage, source })?;
        }

        let batch = unordered.into_iter().map(|pending| (pending.callback)());
        let failures: Vec<String> = join_all(batch)
            .await
            .into_iter()
            .filter_map(|result| result.err())
            .map(|err| err.to_string())
            .collect();
        if !failures.is_empty() {
            return Err(LifecycleError::BatchFailed { stage, failures });
        }
        Ok(())
    }

    pub async fn is_closed(&self, stage: LifecycleStage) -> bool {
        let engine = self.engine.lock().await;
        engine.is_closed(stage)
    }

    pub async fn pending_count(&self, stage: LifecycleStage) -> usize {
        let engine = self.engine.lock().await;
        engine.pending_count(stage)
    }

    pub async fn reset(&self) {
        let mut engine = self.engine.lock().await;
        engine.reset();
    }
}

impl Default for SharedStageEngine {
    fn default() -> Self {
        Self::new()
    }
}
