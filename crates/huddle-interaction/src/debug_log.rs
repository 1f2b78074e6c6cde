//! Bounded in-memory record of recent agent runs, for inspection.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use huddle_core::chat::{MessageTrigger, ProviderKind};
use huddle_core::event::RunStatus;

pub const DEFAULT_MAX_RUNS_PER_CHAT: usize = 50;

/// Cap on the prompt excerpt retained per run.
pub const PROMPT_PREVIEW_CHARS: usize = 4000;

/// One agent run, upserted at start and again at completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugRun {
    pub id: String,
    pub chat_id: String,
    pub participant_id: String,
    pub participant_display_name: String,
    pub provider: ProviderKind,
    pub trigger: MessageTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_by_message_id: Option<String>,
    #[serde(rename = "tagSessionIndex", skip_serializing_if = "Option::is_none")]
    pub session_index: Option<u32>,
    pub status: RunStatus,
    pub ts_start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts_end: Option<String>,
    pub command: String,
    pub args: Vec<String>,
    pub cwd: String,
    pub timeout_ms: u64,
    pub roaming: bool,
    pub prompt_length: usize,
    pub prompt_preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Truncates a prompt to its retained preview.
pub fn prompt_preview(prompt: &str) -> String {
    prompt.chars().take(PROMPT_PREVIEW_CHARS).collect()
}

/// Keeps the most recent runs per chat, bounded; old runs are evicted in
/// insertion order.
pub struct DebugLogStore {
    runs_by_chat: RwLock<HashMap<String, Vec<DebugRun>>>,
    max_runs_per_chat: usize,
}

impl Default for DebugLogStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RUNS_PER_CHAT)
    }
}

impl DebugLogStore {
    pub fn new(max_runs_per_chat: usize) -> Self {
        Self {
            runs_by_chat: RwLock::new(HashMap::new()),
            max_runs_per_chat: max_runs_per_chat.max(1),
        }
    }

    /// Inserts the run, or replaces an existing record with the same id.
    pub fn upsert_run(&self, run: DebugRun) {
        let mut by_chat = self.runs_by_chat.write().unwrap();
        let runs = by_chat.entry(run.chat_id.clone()).or_default();
        if let Some(existing) = runs.iter_mut().find(|r| r.id == run.id) {
            *existing = run;
        } else {
            runs.push(run);
            if runs.len() > self.max_runs_per_chat {
                let excess = runs.len() - self.max_runs_per_chat;
                runs.drain(..excess);
            }
        }
    }

    /// Recent runs for a chat, newest first.
    pub fn list_runs(&self, chat_id: &str) -> Vec<DebugRun> {
        let by_chat = self.runs_by_chat.read().unwrap();
        let mut runs = by_chat.get(chat_id).cloned().unwrap_or_default();
        runs.sort_by(|a, b| b.ts_start.cmp(&a.ts_start));
        runs
    }

    pub fn clear_runs(&self, chat_id: &str) {
        self.runs_by_chat.write().unwrap().remove(chat_id);
    }
}
