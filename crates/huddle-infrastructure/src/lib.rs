//! Infrastructure layer: on-disk layout, chat persistence, and config.

pub mod config_service;
pub mod json_chat_store;
pub mod memory_chat_store;
pub mod paths;
pub mod storage;

pub use config_service::{default_config_file, load_config, save_config};
pub use json_chat_store::JsonChatStore;
pub use memory_chat_store::MemoryChatStore;
pub use paths::{DataPaths, default_data_dir};
