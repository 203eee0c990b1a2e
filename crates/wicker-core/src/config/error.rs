//! Error types for the configuration store.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to convert config value for '{project}.{property}': {source}")]
    InvalidValue {
        project: String,
        property: String,
        #[source]
        source: serde_json::Error,
    },
}
