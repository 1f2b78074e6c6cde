//! File-backed [`ChatStore`] implementation.
//!
//! Chat metadata lives in one JSON file per chat plus a shared index file;
//! the message history is an append-only JSONL log. All mutations take a
//! store-wide write lock so index and log updates never interleave.

use serde::{Deserialize, Serialize};

use async_trait::async_trait;
use huddle_core::chat::{
    Chat, ChatStore, ChatSummary, ChatUpdate, DeleteEvent, LogRecord, Message, NewChat,
    Participant, derive_unique_handles, visible_messages,
};
use huddle_core::ids::{new_id, now_iso};
use huddle_core::mention::{MentionRewrite, rewrite_mentions};
use huddle_core::{HuddleError, Result};

use crate::paths::DataPaths;
use crate::storage;

const INDEX_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ChatsIndexFile {
    version: u32,
    chats: Vec<ChatSummary>,
}

pub struct JsonChatStore {
    paths: DataPaths,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonChatStore {
    /// Opens the store rooted at the given layout, creating the chats
    /// directory and index file on first use.
    pub async fn open(paths: DataPaths) -> Result<Self> {
        storage::ensure_dir(paths.chats_root()).await?;
        let index_file = paths.chats_index_file();
        if !storage::path_exists(&index_file).await {
            let index = ChatsIndexFile {
                version: INDEX_VERSION,
                chats: Vec::new(),
            };
            storage::write_json_file_atomic(&index_file, &index).await?;
        }
        Ok(Self {
            paths,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    async fn load_index(&self) -> Result<ChatsIndexFile> {
        storage::read_json_file(&self.paths.chats_index_file()).await
    }

    async fn save_index(&self, index: &ChatsIndexFile) -> Result<()> {
        storage::write_json_file_atomic(&self.paths.chats_index_file(), index).await
    }

    async fn touch_index(&self, chat_id: &str, ts: &str) -> Result<()> {
        let mut index = self.load_index().await?;
        if let Some(entry) = index.chats.iter_mut().find(|c| c.id == chat_id) {
            entry.updated_at = ts.to_string();
        }
        self.save_index(&index).await
    }

    async fn require_chat_dir(&self, chat_id: &str) -> Result<()> {
        if storage::path_exists(&self.paths.chat_meta_file(chat_id)).await {
            Ok(())
        } else {
            Err(HuddleError::not_found("chat", chat_id))
        }
    }
}

#[async_trait]
impl ChatStore for JsonChatStore {
    async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let mut chats = self.load_index().await?.chats;
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(chats)
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        self.require_chat_dir(chat_id).await?;
        storage::read_json_file(&self.paths.chat_meta_file(chat_id)).await
    }

    async fn create_chat(&self, input: NewChat) -> Result<Chat> {
        let _guard = self.write_lock.lock().await;

        let ts = now_iso();
        let title = match input.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("New chat {}", &ts[..10]),
        };

        let display_names: Vec<String> = input
            .participants
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

        let participants: Vec<Participant> = input
            .participants
            .into_iter()
            .zip(display_names)
            .zip(handles)
            .map(|((p, display_name), handle)| Participant {
                id: new_id("a"),
                provider: p.provider,
                display_name,
                handle,
                color_hex: p.color_hex,
                persona: p.persona,
                roaming: p.roaming,
            })
            .collect();

        let chat = Chat {
            id: new_id("c"),
            title,
            created_at: ts.clone(),
            updated_at: ts.clone(),
            context: input.context,
            participants,
        };

        storage::ensure_dir(&self.paths.chat_dir(&chat.id)).await?;
        storage::ensure_dir(&self.paths.chat_workspace_dir(&chat.id)).await?;
        storage::write_json_file_atomic(&self.paths.chat_meta_file(&chat.id), &chat).await?;
        let log: Vec<LogRecord> = Vec::new();
        storage::write_jsonl_file_atomic(&self.paths.chat_messages_file(&chat.id), &log).await?;

        let mut index = self.load_index().await?;
        index.chats.insert(
            0,
            ChatSummary {
                id: chat.id.clone(),
                title: chat.title.clone(),
                created_at: ts.clone(),
                updated_at: ts,
            },
        );
        self.save_index(&index).await?;

        tracing::info!(chat_id = %chat.id, participants = chat.participants.len(), "created chat");
        Ok(chat)
    }

    async fn update_chat(&self, input: ChatUpdate) -> Result<Chat> {
        let _guard = self.write_lock.lock().await;

        let existing = {
            self.require_chat_dir(&input.chat_id).await?;
            storage::read_json_file::<Chat>(&self.paths.chat_meta_file(&input.chat_id)).await?
        };

        let display_names: Vec<String> = input
            .participants
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

        let mut rewrites: Vec<MentionRewrite> = Vec::new();
        let participants: Vec<Participant> = input
            .participants
            .into_iter()
            .zip(display_names)
            .zip(handles)
            .map(|((mut p, display_name), handle)| {
                if p.id.trim().is_empty() {
                    p.id = new_id("a");
                } else if let Some(old) = existing.participant(&p.id) {
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

        if !rewrites.is_empty() {
            let log_file = self.paths.chat_messages_file(&input.chat_id);
            let mut records: Vec<LogRecord> = storage::read_jsonl_file(&log_file).await?;
            for record in &mut records {
                if let LogRecord::Message(m) = record {
                    m.text = rewrite_mentions(&m.text, &rewrites);
                }
            }
            storage::write_jsonl_file_atomic(&log_file, &records).await?;
            tracing::info!(
                chat_id = %input.chat_id,
                renames = rewrites.len(),
                "rewrote mentions after participant rename"
            );
        }

        let ts = now_iso();
        // An emptied title keeps the current one.
        let title = if input.title.trim().is_empty() {
            existing.title.clone()
        } else {
            input.title
        };
        let chat = Chat {
            id: existing.id,
            title,
            created_at: existing.created_at,
            updated_at: ts.clone(),
            context: input.context,
            participants,
        };
        storage::write_json_file_atomic(&self.paths.chat_meta_file(&chat.id), &chat).await?;

        let mut index = self.load_index().await?;
        if let Some(entry) = index.chats.iter_mut().find(|c| c.id == chat.id) {
            entry.title = chat.title.clone();
            entry.updated_at = ts;
        }
        self.save_index(&index).await?;

        Ok(chat)
    }

    async fn list_messages(&self, chat_id: &str, limit: usize) -> Result<Vec<Message>> {
        self.require_chat_dir(chat_id).await?;
        let records: Vec<LogRecord> =
            storage::read_jsonl_file(&self.paths.chat_messages_file(chat_id)).await?;
        Ok(visible_messages(&records, limit))
    }

    async fn append_message(&self, chat_id: &str, message: &Message) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.require_chat_dir(chat_id).await?;
        storage::append_jsonl_line(&self.paths.chat_messages_file(chat_id), message).await?;
        self.touch_index(chat_id, &message.ts).await
    }

    async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.require_chat_dir(chat_id).await?;
        let tombstone = DeleteEvent::new(message_id);
        storage::append_jsonl_line(&self.paths.chat_messages_file(chat_id), &tombstone).await?;
        self.touch_index(chat_id, &tombstone.ts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::chat::{NewParticipant, ProviderKind, RoamingConfig};

    fn participant_input(name: &str) -> NewParticipant {
        NewParticipant {
            provider: ProviderKind::Claude,
            display_name: name.to_string(),
            color_hex: "#336699".to_string(),
            persona: "a test agent".to_string(),
            roaming: RoamingConfig::default(),
        }
    }

    async fn store_in(dir: &std::path::Path) -> JsonChatStore {
        JsonChatStore::open(DataPaths::new(dir)).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_chat() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let chat = store
            .create_chat(NewChat {
                title: Some("Standup".to_string()),
                context: "daily sync".to_string(),
                participants: vec![participant_input("Alice"), participant_input("alice")],
            })
            .await
            .unwrap();

        assert!(chat.id.starts_with("c_"));
        assert!(chat.participants.iter().all(|p| p.id.starts_with("a_")));
        assert_eq!(chat.participants[0].handle, "alice");
        assert_eq!(chat.participants[1].handle, "alice-2");

        let loaded = store.get_chat(&chat.id).await.unwrap();
        assert_eq!(loaded, chat);
        assert!(storage::path_exists(&store.paths().chat_workspace_dir(&chat.id)).await);
    }

    #[tokio::test]
    async fn test_create_chat_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let chat = store
            .create_chat(NewChat {
                title: None,
                context: String::new(),
                participants: vec![participant_input("  ")],
            })
            .await
            .unwrap();
        assert!(chat.title.starts_with("New chat "));
        assert_eq!(chat.participants[0].display_name, "Agent 1");
        assert_eq!(chat.participants[0].handle, "agent");
    }

    #[tokio::test]
    async fn test_get_missing_chat_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let err = store.get_chat("chat_missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_append_list_delete_messages() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let chat = store
            .create_chat(NewChat {
                title: None,
                context: String::new(),
                participants: vec![participant_input("Alice")],
            })
            .await
            .unwrap();

        let m1 = Message::user("one");
        let m2 = Message::user("two");
        store.append_message(&chat.id, &m1).await.unwrap();
        store.append_message(&chat.id, &m2).await.unwrap();

        let all = store.list_messages(&chat.id, 200).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].text, "one");

        store.delete_message(&chat.id, &m1.id).await.unwrap();
        let left = store.list_messages(&chat.id, 200).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, m2.id);
    }

    #[tokio::test]
    async fn test_rename_rewrites_mentions_in_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let chat = store
            .create_chat(NewChat {
                title: None,
                context: String::new(),
                participants: vec![participant_input("Alice"), participant_input("Bob")],
            })
            .await
            .unwrap();

        store
            .append_message(&chat.id, &Message::user("ping @alice and @Bob"))
            .await
            .unwrap();

        let mut participants = chat.participants.clone();
        participants[0].display_name = "Alicia".to_string();
        store
            .update_chat(ChatUpdate {
                chat_id: chat.id.clone(),
                title: chat.title.clone(),
                context: chat.context.clone(),
                participants,
            })
            .await
            .unwrap();

        let messages = store.list_messages(&chat.id, 200).await.unwrap();
        assert_eq!(messages[0].text, "ping @alicia and @Bob");

        let updated = store.get_chat(&chat.id).await.unwrap();
        assert_eq!(updated.participants[0].handle, "alicia");
    }

    #[tokio::test]
    async fn test_update_with_blank_title_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let chat = store
            .create_chat(NewChat {
                title: Some("Standup".to_string()),
                context: String::new(),
                participants: vec![participant_input("Alice")],
            })
            .await
            .unwrap();

        let updated = store
            .update_chat(ChatUpdate {
                chat_id: chat.id.clone(),
                title: "   ".to_string(),
                context: "new context".to_string(),
                participants: chat.participants.clone(),
            })
            .await
            .unwrap();
        assert_eq!(updated.title, "Standup");
        assert_eq!(updated.context, "new context");

        let chats = store.list_chats().await.unwrap();
        assert_eq!(chats[0].title, "Standup");
    }

    #[tokio::test]
    async fn test_list_chats_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;
        let first = store
            .create_chat(NewChat {
                title: Some("First".to_string()),
                context: String::new(),
                participants: vec![],
            })
            .await
            .unwrap();
        let _second = store
            .create_chat(NewChat {
                title: Some("Second".to_string()),
                context: String::new(),
                participants: vec![],
            })
            .await
            .unwrap();

        // Touching the first chat moves it back to the top.
        let mut msg = Message::user("bump");
        msg.ts = "2999-01-01T00:00:00.000Z".to_string();
        store.append_message(&first.id, &msg).await.unwrap();

        let chats = store.list_chats().await.unwrap();
        assert_eq!(chats[0].title, "First");
    }
}
