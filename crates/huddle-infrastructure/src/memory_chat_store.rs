//! In-memory [`ChatStore`] with the same semantics as the file-backed one.
//!
//! Used by tests and by callers that want a throwaway store without touching
//! the filesystem.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use huddle_core::chat::{
    Chat, ChatStore, ChatSummary, ChatUpdate, DeleteEvent, LogRecord, Message, NewChat,
    Participant, derive_unique_handles, visible_messages,
};
use huddle_core::ids::{new_id, now_iso};
use huddle_core::mention::{MentionRewrite, rewrite_mentions};
use huddle_core::{HuddleError, Result};

struct ChatEntry {
    chat: Chat,
    log: Vec<LogRecord>,
}

#[derive(Default)]
pub struct MemoryChatStore {
    chats: Mutex<HashMap<String, ChatEntry>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a chat directly, bypassing handle derivation. Test helper.
    pub fn insert_chat(&self, chat: Chat) {
        let mut chats = self.chats.lock().unwrap();
        chats.insert(
            chat.id.clone(),
            ChatEntry {
                chat,
                log: Vec::new(),
            },
        );
    }
}

fn resolve_roster(
    participants: Vec<Participant>,
    existing: Option<&Chat>,
) -> (Vec<Participant>, Vec<MentionRewrite>) {
    let display_names: Vec<String> = participants
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let trimmed = p.display_name.trim();
            if trimmed.is_empty() {
                format!("Agent {}", i + 1)
            } else {
                trimmed.to_string()
            }
        })
        .collect();
    let handles = derive_unique_handles(&display_names);

    let mut rewrites = Vec::new();
    let roster = participants
        .into_iter()
        .zip(display_names)
        .zip(handles)
        .map(|((mut p, display_name), handle)| {
            if p.id.trim().is_empty() {
                p.id = new_id("a");
            } else if let Some(old) = existing.and_then(|c| c.participant(&p.id)) {
                if old.handle != handle || old.display_name != display_name {
                    rewrites.push(MentionRewrite {
                        old_handle: old.handle.clone(),
                        old_display_name: old.display_name.clone(),
                        new_handle: handle.clone(),
                        new_display_name: display_name.clone(),
                    });
                }
            }
            p.display_name = display_name;
            p.handle = handle;
            p
        })
        .collect();
    (roster, rewrites)
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let chats = self.chats.lock().unwrap();
        let mut summaries: Vec<ChatSummary> = chats
            .values()
            .map(|entry| ChatSummary {
                id: entry.chat.id.clone(),
                title: entry.chat.title.clone(),
                created_at: entry.chat.created_at.clone(),
                updated_at: entry.chat.updated_at.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        let chats = self.chats.lock().unwrap();
        chats
            .get(chat_id)
            .map(|entry| entry.chat.clone())
            .ok_or_else(|| HuddleError::not_found("chat", chat_id))
    }

    async fn create_chat(&self, input: NewChat) -> Result<Chat> {
        let ts = now_iso();
        let title = match input.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("New chat {}", &ts[..10]),
        };
        let seed: Vec<Participant> = input
            .participants
            .into_iter()
            .map(|p| Participant {
                id: new_id("a"),
                provider: p.provider,
                display_name: p.display_name,
                handle: String::new(),
                color_hex: p.color_hex,
                persona: p.persona,
                roaming: p.roaming,
            })
            .collect();
        let (participants, _) = resolve_roster(seed, None);

        let chat = Chat {
            id: new_id("c"),
            title,
            created_at: ts.clone(),
            updated_at: ts,
            context: input.context,
            participants,
        };
        self.insert_chat(chat.clone());
        Ok(chat)
    }

    async fn update_chat(&self, input: ChatUpdate) -> Result<Chat> {
        let mut chats = self.chats.lock().unwrap();
        let entry = chats
            .get_mut(&input.chat_id)
            .ok_or_else(|| HuddleError::not_found("chat", &input.chat_id))?;

        let (participants, rewrites) = resolve_roster(input.participants, Some(&entry.chat));
        if !rewrites.is_empty() {
            for record in &mut entry.log {
                if let LogRecord::Message(m) = record {
                    m.text = rewrite_mentions(&m.text, &rewrites);
                }
            }
        }

        // An emptied title keeps the current one.
        if !input.title.trim().is_empty() {
            entry.chat.title = input.title;
        }
        entry.chat.context = input.context;
        entry.chat.participants = participants;
        entry.chat.updated_at = now_iso();
        Ok(entry.chat.clone())
    }

    async fn list_messages(&self, chat_id: &str, limit: usize) -> Result<Vec<Message>> {
        let chats = self.chats.lock().unwrap();
        let entry = chats
            .get(chat_id)
            .ok_or_else(|| HuddleError::not_found("chat", chat_id))?;
        Ok(visible_messages(&entry.log, limit))
    }

    async fn append_message(&self, chat_id: &str, message: &Message) -> Result<()> {
        let mut chats = self.chats.lock().unwrap();
        let entry = chats
            .get_mut(chat_id)
            .ok_or_else(|| HuddleError::not_found("chat", chat_id))?;
        entry.log.push(LogRecord::Message(message.clone()));
        entry.chat.updated_at = message.ts.clone();
        Ok(())
    }

    async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<()> {
        let mut chats = self.chats.lock().unwrap();
        let entry = chats
            .get_mut(chat_id)
            .ok_or_else(|| HuddleError::not_found("chat", chat_id))?;
        let tombstone = DeleteEvent::new(message_id);
        entry.chat.updated_at = tombstone.ts.clone();
        entry.log.push(LogRecord::Delete(tombstone));
        Ok(())
    }
}
