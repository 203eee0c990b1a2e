//! Fail-fast escalation.
//!
//! The kernel classifies some conditions as non-recoverable: duplicate
//! service registration, a lifecycle callback attached after its stage ran,
//! a factory failing during wiring. Those are routed here rather than
//! propagated as ordinary results. The production handler terminates the
//! process; embedders and tests can inject their own.

use std::fmt;
use std::sync::Mutex;

/// Receives conditions the kernel considers non-recoverable.
pub trait FatalHandler: Send + Sync {
    /// Called with a fully formatted description after the originating site
    /// has logged the error. The default implementation does not return.
    fn on_fatal(&self, message: &str);
}

/// Production handler: logs and exits the process immediately. No cleanup
/// beyond whatever synchronous work has already run.
#[derive(Debug, Default)]
pub struct ExitFatalHandler;

impl FatalHandler for ExitFatalHandler {
    fn on_fatal(&self, message: &str) {
        log::error!("fatal: {} - terminating", message);
        std::process::exit(1);
    }
}

/// Handler that records fatal messages instead of exiting. Intended for
/// tests and embedders that manage process lifetime themselves.
#[derive(Debug, Default)]
pub struct RecordingFatalHandler {
    messages: Mutex<Vec<String>>,
}

impl RecordingFatalHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("fatal message lock poisoned").clone()
    }

    pub fn fatal_count(&self) -> usize {
        self.messages.lock().expect("fatal message lock poisoned").len()
    }
}

impl FatalHandler for RecordingFatalHandler {
    fn on_fatal(&self, message: &str) {
        log::error!("fatal: {}", message);
        self.messages.lock().expect("fatal message lock poisoned").push(message.to_string());
    }
}

impl fmt::Display for RecordingFatalHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordingFatalHandler({} fatal records)", self.fatal_count())
    }
}
