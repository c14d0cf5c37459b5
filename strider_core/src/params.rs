//! Runtime tuning parameters.
//!
//! A small key-value store for numbers the robot code reads while wiring
//! bindings and building routines (thresholds, timeouts, limits).

use crate::error::StriderResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Default location, relative to the working directory
pub const PARAMS_PATH: &str = ".strider/params.yaml";

fn defaults() -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();

    // Operator input
    params.insert("trigger_threshold".to_string(), Value::from(0.5));
    params.insert("intake_trigger_threshold".to_string(), Value::from(0.8));
    params.insert("stick_deadband".to_string(), Value::from(0.2));
    params.insert("stick_flick_threshold".to_string(), Value::from(0.8));

    // Shooting
    params.insert("shot_timeout_s".to_string(), Value::from(1.0));
    params.insert("shot_settle_s".to_string(), Value::from(0.1));
    params.insert("max_shot_distance_m".to_string(), Value::from(4.0));
    params.insert("flywheel_max_idle_rpm".to_string(), Value::from(2000.0));

    // Climbing
    params.insert("climber_manual_power".to_string(), Value::from(0.2));

    params
}

/// Shared parameter store; clones see the same values
#[derive(Clone)]
pub struct RuntimeParams {
    params: Arc<RwLock<BTreeMap<String, Value>>>,
    persist_path: Option<PathBuf>,
}

impl RuntimeParams {
    /// Load `.strider/params.yaml` if present, otherwise start from defaults
    pub fn init() -> StriderResult<Self> {
        let path = PathBuf::from(PARAMS_PATH);
        let params = Self::with_defaults();
        if path.exists() {
            params.load_from_disk(&path)?;
        }
        Ok(Self {
            persist_path: Some(path),
            ..params
        })
    }

    /// Defaults only, nothing read from disk
    pub fn with_defaults() -> Self {
        Self {
            params: Arc::new(RwLock::new(defaults())),
            persist_path: None,
        }
    }

    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let params = self.params.read();
        let value = params.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get_or(key, default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_or(key, default)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> StriderResult<()> {
        let value = serde_json::to_value(value)?;
        self.params.write().insert(key.to_string(), value);
        Ok(())
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.read().contains_key(key)
    }

    pub fn list_keys(&self) -> Vec<String> {
        self.params.read().keys().cloned().collect()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.params.write().remove(key)
    }

    /// Drop every override and go back to the built-in defaults
    pub fn reset(&self) {
        *self.params.write() = defaults();
    }

    /// Write every value to the persist path (or the default location)
    pub fn save_to_disk(&self) -> StriderResult<()> {
        let path = self
            .persist_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(PARAMS_PATH));
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> StriderResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(&*self.params.read())?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Merge values from a YAML file over the current ones
    pub fn load_from_disk(&self, path: &Path) -> StriderResult<()> {
        let yaml = std::fs::read_to_string(path)?;
        let loaded: BTreeMap<String, Value> = serde_yaml::from_str(&yaml)?;
        self.params.write().extend(loaded);
        Ok(())
    }
}

impl Default for RuntimeParams {
    fn default() -> Self {
        Self::init().unwrap_or_else(|e| {
            warn!("failed to load runtime params: {}; using defaults", e);
            Self::with_defaults()
        })
    }
}

impl std::fmt::Debug for RuntimeParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeParams")
            .field("keys", &self.list_keys())
            .field("persist_path", &self.persist_path)
            .finish()
    }
}
