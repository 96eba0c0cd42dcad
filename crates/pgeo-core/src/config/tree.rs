//! Tree engine configuration.

use serde::{Deserialize, Serialize};

/// Settings for the folder tree mutation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum number of delete-then-recheck rounds when clearing an
    /// owner's roots. Exceeding it means a concurrent writer keeps
    /// recreating roots and the operation fails with a conflict.
    #[serde(default = "default_max_context_rounds")]
    pub max_context_rounds: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_context_rounds: default_max_context_rounds(),
        }
    }
}

fn default_max_context_rounds() -> u32 {
    16
}
