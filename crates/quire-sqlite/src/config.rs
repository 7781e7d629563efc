//! SQLite connection settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a read-only SQLite connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file; must already exist
    pub path: PathBuf,

    /// How long a read waits on a locked database before failing
    pub busy_timeout_ms: u64,

    /// Page cache size (negative values are KiB, per SQLite)
    pub cache_size: i64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            busy_timeout_ms: 5000,
            cache_size: -2000,
        }
    }
}

impl SqliteConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_busy_timeout(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = millis;
        self
    }
}
