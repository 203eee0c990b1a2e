pub mod bootstrap;
pub mod builtin;
pub mod constants;
pub mod error;
pub mod fatal;

// Re-export important types
pub use bootstrap::{BootstrapOptions, Kernel};
pub use error::{Error, Result};
pub use fatal::{ExitFatalHandler, FatalHandler, RecordingFatalHandler};
