//! Provider-agnostic prompt assembly.
//!
//! The prompt is a fixed sequence of markdown sections: role, chat context,
//! roster, instructions, transcript, and a trailing "your turn" marker. Only
//! the transcript is size-bounded; it is truncated from the front so the most
//! recent conversation always survives.

use std::collections::HashMap;

use crate::chat::{AuthorKind, Chat, Message, Participant};

/// Character budget for the rendered transcript. Keeps prompts under typical
/// CLI argument limits.
pub const TRANSCRIPT_CHAR_BUDGET: usize = 25_000;

/// Marker prefixed to a transcript truncated from the front.
pub const TRUNCATION_MARKER: &str = "…(truncated)\n";

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn format_roster(chat: &Chat) -> String {
    chat.participants
        .iter()
        .map(|p| format!("- {} (@{}): {}", p.display_name, p.handle, one_line(&p.persona)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_transcript(chat: &Chat, messages: &[Message], limit_chars: usize) -> String {
    let id_to_handle: HashMap<&str, &str> = chat
        .participants
        .iter()
        .map(|p| (p.id.as_str(), p.handle.as_str()))
        .collect();

    let lines: Vec<String> = messages
        .iter()
        .map(|m| match m.author_kind {
            AuthorKind::Agent => match id_to_handle.get(m.author_id.as_str()) {
                Some(handle) => {
                    format!("**{} (@{})**: {}", m.author_display_name, handle, m.text)
                }
                None => format!("**{}**: {}", m.author_display_name, m.text),
            },
            AuthorKind::User => format!("**{}**: {}", m.author_display_name, m.text),
        })
        .collect();

    let out = lines.join("\n");
    let total = out.chars().count();
    if total <= limit_chars {
        return out;
    }
    // Keep the tail; recency matters most for context.
    let tail: String = out.chars().skip(total - limit_chars).collect();
    format!("{}{}", TRUNCATION_MARKER, tail)
}

/// Builds the full prompt for one agent turn. Pure and deterministic given
/// its inputs.
pub fn build_agent_prompt(chat: &Chat, participant: &Participant, messages: &[Message]) -> String {
    let context = chat.context.trim();
    let roster = format_roster(chat);

    let roaming_line = if participant.roaming.enabled {
        "- You may read files and run commands in the configured workspace directory if needed for accuracy."
    } else {
        "- Do not claim you ran commands or read files; you do not have workspace access in this mode."
    };

    let sections = [
        "# Role".to_string(),
        participant.persona.trim().to_string(),
        String::new(),
        "# Chat Context".to_string(),
        if context.is_empty() {
            "(No context provided.)".to_string()
        } else {
            context.to_string()
        },
        String::new(),
        "# Participants".to_string(),
        if roster.is_empty() {
            "(No other participants.)".to_string()
        } else {
            roster
        },
        String::new(),
        "# Instructions".to_string(),
        format!(
            "- You are {} (@{}). Respond in character.",
            participant.display_name, participant.handle
        ),
        "- Write a single chat message that moves the discussion forward.".to_string(),
        "- Be concise unless more detail is necessary to be correct.".to_string(),
        "- Do not @mention others unless you actually need their input or you are directly responding to them.".to_string(),
        "- If you do @mention someone, mention them at most once per message (or use @everyone to address all agents).".to_string(),
        "- Output only the message body (no prefix like \"Name:\").".to_string(),
        roaming_line.to_string(),
        String::new(),
        "# Transcript".to_string(),
        format_transcript(chat, messages, TRANSCRIPT_CHAR_BUDGET),
        String::new(),
        "# Your turn".to_string(),
    ];

    sections.join("\n")
}
