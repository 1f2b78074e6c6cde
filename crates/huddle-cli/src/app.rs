//! Wires the store, runner, engine and use cases into one app handle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use huddle_application::{ChatUsecase, MentionEngine};
use huddle_core::chat::ChatStore;
use huddle_core::config::AppConfig;
use huddle_core::event::{ChatEvent, EventSink};
use huddle_infrastructure::{DataPaths, JsonChatStore, default_config_file, default_data_dir, load_config};
use huddle_interaction::{AgentService, CliProviderRunner, DebugLogStore};

/// Prints orchestration events as they happen.
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: ChatEvent) {
        match &event {
            ChatEvent::RunStatus {
                participant_display_name,
                provider,
                status,
                ..
            } => {
                eprintln!("[{status}] {participant_display_name} ({provider})");
            }
            ChatEvent::MessageAppended { message, .. } => {
                println!("{}: {}", message.author_display_name, message.text);
            }
            ChatEvent::MentionState {
                paused,
                pending_participant_ids,
                ..
            } => {
                if *paused {
                    eprintln!(
                        "[paused] {} agent(s) pending; run `huddle resume` to continue",
                        pending_participant_ids.len()
                    );
                }
            }
        }
    }
}

pub struct App {
    pub config: AppConfig,
    pub store: Arc<JsonChatStore>,
    pub agent_service: Arc<AgentService>,
    pub usecase: ChatUsecase,
}

impl App {
    pub async fn open() -> Result<Self> {
        let config = load_config(&default_config_file()?).await?;
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        let paths = DataPaths::new(data_dir);
        let chats_root = paths.chats_root().to_path_buf();
        let store = Arc::new(JsonChatStore::open(paths).await?);
        let sink: Arc<dyn EventSink> = Arc::new(ConsoleSink);

        let agent_service = Arc::new(
            AgentService::new(
                Arc::clone(&store) as Arc<dyn ChatStore>,
                Arc::new(CliProviderRunner::new()),
                Arc::new(DebugLogStore::new(config.debug_runs_per_chat)),
                Arc::clone(&sink),
                chats_root,
                config.snapshot_limit,
            )
            .with_timeouts(
                Duration::from_millis(config.default_timeout_ms),
                Duration::from_millis(config.roaming_timeout_ms),
            ),
        );
        let engine = Arc::new(MentionEngine::new(
            Arc::clone(&store) as Arc<dyn ChatStore>,
            Arc::clone(&agent_service) as Arc<dyn huddle_interaction::AgentRunner>,
            Arc::clone(&sink),
            config.snapshot_limit,
            config.max_sessions,
        ));
        let usecase = ChatUsecase::new(
            Arc::clone(&store) as Arc<dyn ChatStore>,
            Arc::clone(&agent_service),
            engine,
            sink,
        );

        Ok(Self {
            config,
            store,
            agent_service,
            usecase,
        })
    }
}
