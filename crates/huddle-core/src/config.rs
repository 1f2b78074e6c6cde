//! Application configuration.
//!
//! Loaded from `config.toml` in the platform config directory; every field
//! has a default so a missing file behaves like an empty one.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default cap on mention-triggered sessions per cascade.
pub const DEFAULT_MAX_SESSIONS: u32 = 3;

/// Default bound on the transcript snapshot handed to agents.
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
    /// Mention-session cap applied by the engine entry points.
    pub max_sessions: u32,
    /// How many recent messages each agent sees.
    pub snapshot_limit: usize,
    /// Timeout for non-roaming provider runs, in milliseconds.
    pub default_timeout_ms: u64,
    /// Timeout for roaming provider runs, in milliseconds.
    pub roaming_timeout_ms: u64,
    /// Debug run records retained per chat.
    pub debug_runs_per_chat: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_sessions: DEFAULT_MAX_SESSIONS,
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
            default_timeout_ms: 90_000,
            roaming_timeout_ms: 240_000,
            debug_runs_per_chat: 50,
        }
    }
}
