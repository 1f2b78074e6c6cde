//! Message and tombstone types for the append-only chat log.
//!
//! A log line is either a [`Message`] or a [`DeleteEvent`], distinguished by
//! the `kind` discriminator (only tombstones carry it). Messages are
//! immutable once appended; deletion is a tombstone appended to the same log.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::model::ProviderKind;
use crate::ids::{new_id, now_iso};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuthorKind {
    User,
    Agent,
}

/// What caused an agent run: an explicit user action or an `@mention`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageTrigger {
    #[default]
    Manual,
    Mention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessageMeta {
    pub trigger: MessageTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_by_message_id: Option<String>,
    /// Mention-round index within a cascade, persisted as `tagSessionIndex`.
    #[serde(rename = "tagSessionIndex", skip_serializing_if = "Option::is_none")]
    pub session_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
}

/// A single message in a chat.
///
/// `author_display_name` is a snapshot at send time and is never re-resolved
/// when a participant is renamed later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub ts: String,
    pub author_kind: AuthorKind,
    /// `"user"` for the human, otherwise a participant id.
    pub author_id: String,
    pub author_display_name: String,
    pub text: String,
    pub meta: MessageMeta,
}

impl Message {
    /// Creates a user-authored message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: new_id("m"),
            ts: now_iso(),
            author_kind: AuthorKind::User,
            author_id: "user".to_string(),
            author_display_name: "You".to_string(),
            text: text.into(),
            meta: MessageMeta::default(),
        }
    }
}

/// Discriminator value for tombstone lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeleteKind {
    #[default]
    Delete,
}

/// An append-only marker that logically deletes a prior message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEvent {
    pub kind: DeleteKind,
    pub id: String,
    pub ts: String,
    pub target_message_id: String,
}

impl DeleteEvent {
    pub fn new(target_message_id: impl Into<String>) -> Self {
        Self {
            kind: DeleteKind::Delete,
            id: new_id("del"),
            ts: now_iso(),
            target_message_id: target_message_id.into(),
        }
    }
}

/// One line of the per-chat JSONL log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogRecord {
    Delete(DeleteEvent),
    Message(Message),
}

/// Collapses a raw log into its visible messages: tombstoned messages are
/// filtered out (idempotent, no matter how often a tombstone repeats) and
/// only the most recent `limit` survivors are returned, oldest first.
pub fn visible_messages(records: &[LogRecord], limit: usize) -> Vec<Message> {
    let mut deleted: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for record in records {
        if let LogRecord::Delete(evt) = record {
            deleted.insert(evt.target_message_id.as_str());
        }
    }
    let filtered: Vec<&Message> = records
        .iter()
        .filter_map(|record| match record {
            LogRecord::Message(m) if !deleted.contains(m.id.as_str()) => Some(m),
            _ => None,
        })
        .collect();
    let skip = filtered.len().saturating_sub(limit);
    filtered.into_iter().skip(skip).cloned().collect()
}
