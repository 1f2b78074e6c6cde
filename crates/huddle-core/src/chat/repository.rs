//! Chat store trait.
//!
//! Defines the interface the orchestration core uses to read and mutate
//! conversation state, decoupling it from the on-disk layout.

use async_trait::async_trait;

use super::message::Message;
use super::model::{Chat, ChatSummary, ChatUpdate, NewChat};
use crate::error::Result;

/// An abstract store for chats and their append-only message logs.
///
/// Implementations must guarantee that `append_message` is durable and that
/// `list_messages` never returns a message targeted by a delete tombstone.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Lists chat summaries, most recently updated first.
    async fn list_chats(&self) -> Result<Vec<ChatSummary>>;

    /// Loads a chat by id.
    ///
    /// # Errors
    ///
    /// Returns `HuddleError::NotFound` if the chat does not exist.
    async fn get_chat(&self, chat_id: &str) -> Result<Chat>;

    /// Creates a chat, deriving unique handles for its participants.
    async fn create_chat(&self, input: NewChat) -> Result<Chat>;

    /// Updates a chat's title, context and roster.
    ///
    /// Handles are re-derived; when a participant's handle or display name
    /// changed, historical `@mentions` in the message log are rewritten to
    /// the new tokens.
    async fn update_chat(&self, input: ChatUpdate) -> Result<Chat>;

    /// Returns the most recent `limit` non-deleted messages, oldest first.
    async fn list_messages(&self, chat_id: &str, limit: usize) -> Result<Vec<Message>>;

    /// Durably appends a message and bumps the chat's last-activity time.
    async fn append_message(&self, chat_id: &str, message: &Message) -> Result<()>;

    /// Appends a delete tombstone for the given message id.
    async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<()>;
}
