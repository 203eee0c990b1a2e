//! Error types for the lifecycle stage engine.

use thiserror::Error;

use crate::kernel::error::BoxError;
use crate::lifecycle::LifecycleStage;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A callback was registered after its stage already ran. The callback
    /// would silently never execute, so this is a programming error the
    /// kernel escalates to the fail-fast path.
    #[error("stage {stage} has already run; late callback registration dropped")]
    LateRegistration { stage: LifecycleStage },

    #[error("stage {stage} has already been executed")]
    StageClosed { stage: LifecycleStage },

    /// A prioritized callback failed; the rest of the ordered sequence is
    /// not executed.
    #[error("callback failed during stage {stage}: {source}")]
    CallbackFailed {
        stage: LifecycleStage,
        #[source]
        source: BoxError,
    },

    /// One or more callbacks in the concurrent batch failed. The whole batch
    /// ran to completion before this was raised.
    #[error("{} callback(s) failed during stage {stage}: {}", failures.len(), failures.join("; "))]
    BatchFailed {
        stage: LifecycleStage,
        failures: Vec<String>,
    },
}
