use serde::{Serialize, Deserialize};

/// Batch generation tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchConfig {
    /// Upper bound on simultaneous generation attempts; unbounded when absent
    pub max_concurrency: Option<usize>,
}

impl BatchConfig {
    pub fn with_max_concurrency(limit: usize) -> Self {
        Self { max_concurrency: Some(limit) }
    }
}
