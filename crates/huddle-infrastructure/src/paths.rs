//! Filesystem layout for Huddle's on-disk data.
//!
//! Everything lives under a single user data directory:
//!
//! ```text
//! <data_dir>/
//!   data/
//!     v1/
//!       chats/
//!         index.json
//!         <chat_id>/
//!           chat.json
//!           messages.jsonl
//!           workspace/
//! ```

use std::path::{Path, PathBuf};

use huddle_core::{HuddleError, Result};

/// Resolved locations for on-disk chat data.
#[derive(Debug, Clone)]
pub struct DataPaths {
    data_root: PathBuf,
    chats_root: PathBuf,
}

impl DataPaths {
    /// Build the path layout rooted at the given user data directory.
    pub fn new(user_data_dir: impl Into<PathBuf>) -> Self {
        let data_root = user_data_dir.into().join("data");
        let chats_root = data_root.join("v1").join("chats");
        Self {
            data_root,
            chats_root,
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn chats_root(&self) -> &Path {
        &self.chats_root
    }

    pub fn chats_index_file(&self) -> PathBuf {
        self.chats_root.join("index.json")
    }

    pub fn chat_dir(&self, chat_id: &str) -> PathBuf {
        self.chats_root.join(chat_id)
    }

    pub fn chat_meta_file(&self, chat_id: &str) -> PathBuf {
        self.chat_dir(chat_id).join("chat.json")
    }

    pub fn chat_messages_file(&self, chat_id: &str) -> PathBuf {
        self.chat_dir(chat_id).join("messages.jsonl")
    }

    pub fn chat_workspace_dir(&self, chat_id: &str) -> PathBuf {
        self.chat_dir(chat_id).join("workspace")
    }
}

/// Default user data directory (`~/.local/share/huddle` on Linux).
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join("huddle"))
        .ok_or_else(|| HuddleError::config("could not determine a user data directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = DataPaths::new("/tmp/huddle-test");
        assert_eq!(
            paths.chats_index_file(),
            PathBuf::from("/tmp/huddle-test/data/v1/chats/index.json")
        );
        assert_eq!(
            paths.chat_meta_file("chat_1"),
            PathBuf::from("/tmp/huddle-test/data/v1/chats/chat_1/chat.json")
        );
        assert_eq!(
            paths.chat_messages_file("chat_1"),
            PathBuf::from("/tmp/huddle-test/data/v1/chats/chat_1/messages.jsonl")
        );
        assert_eq!(
            paths.chat_workspace_dir("chat_1"),
            PathBuf::from("/tmp/huddle-test/data/v1/chats/chat_1/workspace")
        );
    }
}
