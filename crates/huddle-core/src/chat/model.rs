//! Chat and participant models.
//!
//! Participants are part of a chat's identity: renaming one is a chat-level
//! update that re-derives handles and rewrites historical `@mentions`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::{Display, EnumString};

/// The external CLI tool backing an agent participant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    Codex,
    Claude,
    Gemini,
}

/// How much filesystem/command access a roaming agent is granted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoamingMode {
    #[default]
    Safe,
    Yolo,
}

/// Per-participant workspace access configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoamingConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_dir: Option<PathBuf>,
    pub mode: RoamingMode,
}

/// An agent participant in a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    /// Provider backend, persisted under the `type` key.
    #[serde(rename = "type")]
    pub provider: ProviderKind,
    pub display_name: String,
    /// Unique, mention-friendly identifier within the chat.
    /// Prefer `@handle` mentions (but `@DisplayName` is also supported).
    pub handle: String,
    pub color_hex: String,
    pub persona: String,
    pub roaming: RoamingConfig,
}

/// A group chat: metadata plus its participant roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    /// Free-text context shared with every agent's prompt.
    pub context: String,
    pub participants: Vec<Participant>,
}

impl Chat {
    /// Looks up a participant by id.
    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }
}

/// Sidebar-level chat metadata kept in the index file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a participant along with a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParticipant {
    #[serde(rename = "type")]
    pub provider: ProviderKind,
    pub display_name: String,
    pub color_hex: String,
    pub persona: String,
    pub roaming: RoamingConfig,
}

/// Input for creating a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChat {
    pub title: Option<String>,
    pub context: String,
    pub participants: Vec<NewParticipant>,
}

/// Input for updating a chat's title, context and roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUpdate {
    pub chat_id: String,
    pub title: String,
    pub context: String,
    pub participants: Vec<Participant>,
}

/// Derives a slug-form handle from a display name: lowercase, runs of
/// non-alphanumeric characters collapsed to a single hyphen, no leading or
/// trailing hyphen. Falls back to `agent` when nothing survives.
pub fn slugify_handle(display_name: &str) -> String {
    let mut out = String::new();
    let mut pending_hyphen = false;
    for ch in display_name.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    if out.is_empty() {
        "agent".to_string()
    } else {
        out
    }
}

/// Derives unique handles for a roster, in order. The first occupant of a
/// slug keeps it bare; later collisions get `-2`, `-3`, … suffixes.
pub fn derive_unique_handles<S: AsRef<str>>(display_names: &[S]) -> Vec<String> {
    let mut used: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    display_names
        .iter()
        .map(|name| {
            let base = slugify_handle(name.as_ref());
            let count = used.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}-{}", base, count)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify_handle("Alice"), "alice");
        assert_eq!(slugify_handle("Bob Senior"), "bob-senior");
        assert_eq!(slugify_handle("  C3-PO!  "), "c3-po");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify_handle(""), "agent");
        assert_eq!(slugify_handle("!!!"), "agent");
    }

    #[test]
    fn test_unique_handles_suffix_collisions() {
        let handles = derive_unique_handles(&["Alice", "alice", "Alice!"]);
        assert_eq!(handles, vec!["alice", "alice-2", "alice-3"]);
    }

    #[test]
    fn test_unique_handles_distinct_names() {
        let handles = derive_unique_handles(&["Alice", "Bob"]);
        assert_eq!(handles, vec!["alice", "bob"]);
    }

    #[test]
    fn test_provider_kind_round_trip() {
        let json = serde_json::to_string(&ProviderKind::Claude).unwrap();
        assert_eq!(json, "\"claude\"");
        assert_eq!(ProviderKind::Codex.to_string(), "codex");
    }

    #[test]
    fn test_participant_serializes_camel_case() {
        let p = Participant {
            id: "a_1".to_string(),
            provider: ProviderKind::Gemini,
            display_name: "Gem".to_string(),
            handle: "gem".to_string(),
            color_hex: "#aabbcc".to_string(),
            persona: "helpful".to_string(),
            roaming: RoamingConfig::default(),
        };
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["type"], "gemini");
        assert_eq!(value["displayName"], "Gem");
        assert_eq!(value["colorHex"], "#aabbcc");
        assert_eq!(value["roaming"]["mode"], "safe");
        assert!(value["roaming"].get("workspaceDir").is_none());
    }
}
