//! Core domain types for Huddle: chats, messages, mentions, prompts, and the
//! traits the orchestration layers are built against.

pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod mention;
pub mod prompt;

pub use error::{HuddleError, Result};
