//! Observability events emitted by the orchestration core.
//!
//! Delivery is synchronous and ordered relative to the state transition it
//! reports; a missing or misbehaving sink never affects orchestration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::chat::{Message, ProviderKind};

/// Lifecycle state of one agent run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunStatus {
    Running,
    Finished,
    Error,
    Timeout,
}

/// Events published by the agent service and the mention engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// An agent run started or settled.
    #[serde(rename_all = "camelCase")]
    RunStatus {
        run_id: String,
        chat_id: String,
        participant_id: String,
        participant_display_name: String,
        provider: ProviderKind,
        status: RunStatus,
        ts: String,
    },
    /// A message landed in the chat log.
    #[serde(rename_all = "camelCase")]
    MessageAppended { chat_id: String, message: Message },
    /// The mention chain for a chat paused or drained.
    #[serde(rename_all = "camelCase")]
    MentionState {
        chat_id: String,
        paused: bool,
        pending_participant_ids: Vec<String>,
    },
}

/// A synchronous observer for [`ChatEvent`]s.
///
/// Implementations must not block for long and must not panic; the core
/// treats emission as fire-and-forget.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ChatEvent);
}

/// A sink that drops every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ChatEvent) {}
}
