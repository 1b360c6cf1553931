//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a play session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How many levels of `{variable}` expansion are performed before
    /// placeholders are dropped.
    pub expansion_depth: u32,
    /// Length of the `{d}` pause.
    pub pause: Duration,
    /// Directory save files are written to and read from.
    pub save_dir: PathBuf,
    /// Extension appended to save names.
    pub save_extension: String,
    /// Directory files are extracted into.
    pub extract_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expansion_depth: 5,
            pause: Duration::from_millis(500),
            save_dir: PathBuf::from("."),
            save_extension: "crs".to_string(),
            extract_dir: PathBuf::from("extracted"),
        }
    }
}

impl EngineConfig {
    /// Place saves and extracted files under `root`.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            extract_dir: root.join("extracted"),
            save_dir: root,
            ..Default::default()
        }
    }
}
