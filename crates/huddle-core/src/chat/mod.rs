//! Chat domain: models, messages, and the store trait.

pub mod message;
pub mod model;
pub mod repository;

pub use message::{
    AuthorKind, DeleteEvent, DeleteKind, LogRecord, Message, MessageMeta, MessageTrigger,
    visible_messages,
};
pub use model::{
    Chat, ChatSummary, ChatUpdate, NewChat, NewParticipant, Participant, ProviderKind,
    RoamingConfig, RoamingMode, derive_unique_handles, slugify_handle,
};
pub use repository::ChatStore;
