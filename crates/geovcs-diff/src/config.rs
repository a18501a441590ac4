//! Diff engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// Tree walk scheduling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Worker threads for the walk pool. `None` picks half the available
    /// cores, at least two.
    pub threads: Option<usize>,
    /// Run every walk task on the calling thread, in canonical order.
    pub preserve_order: bool,
    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            threads: None,
            preserve_order: false,
            thread_name_prefix: "diff-walk".to_string(),
        }
    }
}

impl WalkConfig {
    /// Number of worker threads the pool will be built with.
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
            (cores / 2).max(2)
        })
        .max(1)
    }
}

/// Top-level configuration for diff operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub walk: WalkConfig,
    /// Stop walks after this many feature events.
    pub max_feature_diffs: Option<u64>,
    /// Include unchanged attributes when building feature diffs.
    pub report_all_attributes: bool,
}

impl DiffConfig {
    /// Deterministic configuration: serial walks in canonical order.
    ///
    /// Used for fixtures and anywhere output order matters more than
    /// throughput.
    pub fn serial() -> Self {
        Self {
            walk: WalkConfig {
                preserve_order: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> DiffResult<Self> {
        toml::from_str(text).map_err(|e| DiffError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> DiffResult<String> {
        toml::to_string(self).map_err(|e| DiffError::Config(e.to_string()))
    }
}
