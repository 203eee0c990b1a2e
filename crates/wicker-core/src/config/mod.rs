//! Configuration store and the per-service accessor.
//!
//! Values are namespaced by project and stored as JSON values; typed reads
//! deserialize on demand. The full schema/CLI loader lives outside the
//! kernel; this module carries the store, the `get(property)` accessor
//! contract, and the external sources loaded between `PreInit` and
//! `PostConfig` (environment variables and, feature-gated, a TOML file).
//! Precedence: file < environment < bootstrap overrides.

pub mod error;

use std::collections::HashMap;
use std::fmt;
#[cfg(feature = "toml-config")]
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

#[cfg(feature = "toml-config")]
use crate::config::error::ConfigError;

/// Inline overrides handed to bootstrap: project -> property -> value
pub type ConfigOverrides = HashMap<String, HashMap<String, Value>>;

/// In-memory configuration data, namespaced by project
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    values: HashMap<String, HashMap<String, Value>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, project: &str, property: &str, value: Value) {
        self.values
            .entry(project.to_string())
            .or_default()
            .insert(property.to_string(), value);
    }

    /// Insert only when the property is not already present. Loaded sources
    /// fill gaps underneath values that outrank them.
    pub fn set_default(&mut self, project: &str, property: &str, value: Value) {
        self.values
            .entry(project.to_string())
            .or_default()
            .entry(property.to_string())
            .or_insert(value);
    }

    pub fn get(&self, project: &str, property: &str) -> Option<Value> {
        self.values.get(project)?.get(property).cloned()
    }

    pub fn get_as<T: DeserializeOwned>(&self, project: &str, property: &str) -> Option<T> {
        self.get(project, property)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Merge a block of overrides; incoming values win
    pub fn merge(&mut self, overrides: ConfigOverrides) {
        for (project, properties) in overrides {
            for (property, value) in properties {
                self.set(&project, &property, value);
            }
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Thread-safe configuration store handle
#[derive(Clone, Debug, Default)]
pub struct SharedConfigStore {
    store: Arc<Mutex<ConfigStore>>,
}

impl SharedConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, project: &str, property: &str, value: Value) {
        let mut store = self.store.lock().await;
        store.set(project, property, value);
    }

    pub async fn get(&self, project: &str, property: &str) -> Option<Value> {
        let store = self.store.lock().await;
        store.get(project, property)
    }

    pub async fn get_as<T: DeserializeOwned>(&self, project: &str, property: &str) -> Option<T> {
        let store = self.store.lock().await;
        store.get_as(project, property)
    }

    pub async fn merge(&self, overrides: ConfigOverrides) {
        let mut store = self.store.lock().await;
        store.merge(overrides);
    }

    pub async fn clear(&self) {
        let mut store = self.store.lock().await;
        store.clear();
    }

    /// Pull values from the process environment for the given projects.
    /// A variable `MYPROJ_CACHE_TTL` feeds property `cache_ttl` of project
    /// `myproj`; values parse as JSON scalars falling back to plain strings.
    /// Existing entries are left untouched.
    pub async fn load_environment(&self, projects: &[String]) {
        let mut store = self.store.lock().await;
        for (key, raw) in std::env::vars() {
            for project in projects {
                let prefix = format!("{}_", env_segment(project));
                if let Some(rest) = key.strip_prefix(&prefix) {
                    if rest.is_empty() {
                        continue;
                    }
                    let property = rest.to_lowercase();
                    let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw.clone()));
                    store.set_default(project, &property, value);
                }
            }
        }
    }

    /// Load a TOML file whose top-level tables are projects. Existing
    /// entries are left untouched.
    #[cfg(feature = "toml-config")]
    pub async fn load_file(&self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: toml::Value = toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        let mut store = self.store.lock().await;
        if let toml::Value::Table(projects) = parsed {
            for (project, section) in projects {
                let toml::Value::Table(properties) = section else {
                    // Top-level scalars have no project namespace to live in
                    log::warn!("ignoring non-table config entry '{}' in {}", project, path.display());
                    continue;
                };
                for (property, value) in properties {
                    let json = serde_json::to_value(value).map_err(|source| ConfigError::InvalidValue {
                        project: project.clone(),
                        property: property.clone(),
                        source,
                    })?;
                    store.set_default(&project, &property, json);
                }
            }
        }
        Ok(())
    }
}

/// Environment-variable segment for a project name: uppercased, with
/// anything outside `[A-Za-z0-9]` folded to underscores.
fn env_segment(project: &str) -> String {
    project
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Per-service configuration view, scoped to the owning project.
#[derive(Clone)]
pub struct ConfigAccessor {
    store: SharedConfigStore,
    project: String,
}

impl fmt::Debug for ConfigAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigAccessor")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

impl ConfigAccessor {
    pub(crate) fn new(store: SharedConfigStore, project: impl Into<String>) -> Self {
        Self {
            store,
            project: project.into(),
        }
    }

    /// Read a property of the owning project
    pub async fn get(&self, property: &str) -> Option<Value> {
        self.store.get(&self.project, property).await
    }

    /// Read a property across project boundaries (the explicit two-part key)
    pub async fn get_scoped(&self, project: &str, property: &str) -> Option<Value> {
        self.store.get(project, property).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, property: &str) -> Option<T> {
        self.store.get_as(&self.project, property).await
    }

    pub async fn get_scoped_as<T: DeserializeOwned>(&self, project: &str, property: &str) -> Option<T> {
        self.store.get_as(project, property).await
    }

    pub fn project(&self) -> &str {
        &self.project
    }
}
