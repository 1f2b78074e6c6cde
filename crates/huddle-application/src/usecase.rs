//! Chat use cases: the operations a front end calls.

use std::sync::Arc;

use huddle_core::chat::{ChatStore, Message};
use huddle_core::event::{ChatEvent, EventSink};
use huddle_core::Result;
use huddle_interaction::{AgentService, RunOptions};

use crate::engine::{MentionEngine, MentionOutcome};

pub struct ChatUsecase {
    store: Arc<dyn ChatStore>,
    agent_service: Arc<AgentService>,
    engine: Arc<MentionEngine>,
    sink: Arc<dyn EventSink>,
}

impl ChatUsecase {
    pub fn new(
        store: Arc<dyn ChatStore>,
        agent_service: Arc<AgentService>,
        engine: Arc<MentionEngine>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            agent_service,
            engine,
            sink,
        }
    }

    pub fn engine(&self) -> &MentionEngine {
        &self.engine
    }

    /// Appends a user message and drives any mention cascade it starts.
    ///
    /// The user message is durable before the cascade begins; an engine
    /// failure afterward is logged, not returned.
    pub async fn send_user_message(&self, chat_id: &str, text: &str) -> Result<Message> {
        let message = Message::user(text);
        self.store.append_message(chat_id, &message).await?;
        self.sink.emit(ChatEvent::MessageAppended {
            chat_id: chat_id.to_string(),
            message: message.clone(),
        });

        if let Err(e) = self.engine.run_from_trigger_message(chat_id, &message).await {
            tracing::warn!(chat_id, error = %e, "mention cascade failed");
        }
        Ok(message)
    }

    /// Runs one agent manually, then feeds its reply through the engine.
    pub async fn run_participant(&self, chat_id: &str, participant_id: &str) -> Result<Message> {
        let message = self
            .agent_service
            .run_agent(chat_id, participant_id, RunOptions::default())
            .await?;
        self.sink.emit(ChatEvent::MessageAppended {
            chat_id: chat_id.to_string(),
            message: message.clone(),
        });

        if let Err(e) = self.engine.run_from_trigger_message(chat_id, &message).await {
            tracing::warn!(chat_id, error = %e, "mention cascade failed");
        }
        Ok(message)
    }

    /// Continues a paused mention cascade.
    pub async fn resume(&self, chat_id: &str) -> Result<MentionOutcome> {
        self.engine.resume(chat_id).await
    }

    pub async fn list_messages(&self, chat_id: &str, limit: usize) -> Result<Vec<Message>> {
        self.store.list_messages(chat_id, limit).await
    }

    pub async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<()> {
        self.store.delete_message(chat_id, message_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use async_trait::async_trait;
    use huddle_core::HuddleError;
    use huddle_core::chat::{
        AuthorKind, Chat, ChatSummary, ChatUpdate, NewChat, NewParticipant, ProviderKind,
        RoamingConfig,
    };
    use huddle_core::event::NullSink;
    use huddle_infrastructure::MemoryChatStore;
    use huddle_interaction::runner::StartCallback;
    use huddle_interaction::{
        DebugLogStore, ExecInfo, ProviderInvocation, ProviderOutcome, ProviderRunner, StartInfo,
    };

    /// Always replies with the same text, like a well-behaved provider CLI.
    struct EchoRunner;

    #[async_trait]
    impl ProviderRunner for EchoRunner {
        async fn run(
            &self,
            invocation: ProviderInvocation,
            on_start: StartCallback,
        ) -> Result<ProviderOutcome> {
            on_start(StartInfo {
                command: "claude".to_string(),
                args: vec!["-p".to_string()],
                cwd: invocation.default_work_dir.clone(),
                timeout: Duration::from_secs(90),
            });
            Ok(ProviderOutcome {
                text: "on it".to_string(),
                exec: ExecInfo {
                    command: "claude".to_string(),
                    args: vec!["-p".to_string()],
                    cwd: invocation.default_work_dir,
                    timeout: Duration::from_secs(90),
                    stdout: "on it".to_string(),
                    stderr: String::new(),
                    exit_code: Some(0),
                    signal: None,
                    timed_out: false,
                },
            })
        }
    }

    /// Delegates to a memory store but rejects agent-authored appends, so
    /// the user message lands while the cascade's writes fail.
    struct AgentAppendFails {
        inner: MemoryChatStore,
    }

    #[async_trait]
    impl ChatStore for AgentAppendFails {
        async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
            self.inner.list_chats().await
        }

        async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
            self.inner.get_chat(chat_id).await
        }

        async fn create_chat(&self, input: NewChat) -> Result<Chat> {
            self.inner.create_chat(input).await
        }

        async fn update_chat(&self, input: ChatUpdate) -> Result<Chat> {
            self.inner.update_chat(input).await
        }

        async fn list_messages(&self, chat_id: &str, limit: usize) -> Result<Vec<Message>> {
            self.inner.list_messages(chat_id, limit).await
        }

        async fn append_message(&self, chat_id: &str, message: &Message) -> Result<()> {
            if message.author_kind == AuthorKind::Agent {
                return Err(HuddleError::io("disk full"));
            }
            self.inner.append_message(chat_id, message).await
        }

        async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<()> {
            self.inner.delete_message(chat_id, message_id).await
        }
    }

    async fn one_agent_chat(store: &MemoryChatStore) -> Chat {
        store
            .create_chat(NewChat {
                title: Some("Usecase".to_string()),
                context: String::new(),
                participants: vec![NewParticipant {
                    provider: ProviderKind::Claude,
                    display_name: "Rev".to_string(),
                    color_hex: "#112233".to_string(),
                    persona: "reviews things".to_string(),
                    roaming: RoamingConfig::default(),
                }],
            })
            .await
            .unwrap()
    }

    fn usecase(store: Arc<dyn ChatStore>) -> ChatUsecase {
        let sink: Arc<dyn EventSink> = Arc::new(NullSink);
        let agent_service = Arc::new(AgentService::new(
            Arc::clone(&store),
            Arc::new(EchoRunner),
            Arc::new(DebugLogStore::default()),
            Arc::clone(&sink),
            PathBuf::from("/tmp/huddle-test-chats"),
            200,
        ));
        let engine = Arc::new(MentionEngine::new(
            Arc::clone(&store),
            Arc::clone(&agent_service) as Arc<dyn huddle_interaction::AgentRunner>,
            Arc::clone(&sink),
            200,
            3,
        ));
        ChatUsecase::new(store, agent_service, engine, sink)
    }

    #[tokio::test]
    async fn test_send_user_message_drives_mentions() {
        let store = Arc::new(MemoryChatStore::new());
        let chat = one_agent_chat(&store).await;
        let usecase = usecase(Arc::clone(&store) as Arc<dyn ChatStore>);

        let sent = usecase.send_user_message(&chat.id, "hi @rev").await.unwrap();
        assert_eq!(sent.author_kind, AuthorKind::User);

        let messages = store.list_messages(&chat.id, 10).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, sent.id);
        assert_eq!(messages[1].text, "on it");
    }

    #[tokio::test]
    async fn test_send_succeeds_when_cascade_fails() {
        let inner = MemoryChatStore::new();
        let chat = one_agent_chat(&inner).await;
        let store = Arc::new(AgentAppendFails { inner });
        let usecase = usecase(Arc::clone(&store) as Arc<dyn ChatStore>);

        // The agent runs but its reply cannot be stored; the user's send
        // still succeeds and their message is durable.
        let sent = usecase.send_user_message(&chat.id, "hi @rev").await.unwrap();

        let messages = store.list_messages(&chat.id, 10).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, sent.id);
    }
}
