//! Build configuration.

use serde::{Deserialize, Serialize};

/// Configuration for container emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Human-readable text at the head of the container file.
    pub prefix: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            prefix: "This is a Cranea story file. Open it with a Cranea player.\n".to_string(),
        }
    }
}
