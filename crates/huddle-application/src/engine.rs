//! The mention engine: turns `@mentions` into agent runs.
//!
//! Each chat has a FIFO queue (a fair async mutex held for the whole task)
//! and a transient pending-trigger map. A cascade runs at most
//! `max_sessions` rounds; leftover triggers are parked as pending until the
//! user resumes or sends a new message.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::stream::{FuturesUnordered, StreamExt};

use huddle_core::chat::{AuthorKind, ChatStore, Message, MessageTrigger};
use huddle_core::event::{ChatEvent, EventSink};
use huddle_core::mention::extract_mentions;
use huddle_core::Result;
use huddle_interaction::{AgentRunner, RunOptions};

/// What one engine entry produced.
#[derive(Debug, Clone, Default)]
pub struct MentionOutcome {
    /// Messages appended, in completion order.
    pub appended: Vec<Message>,
    /// True when the session cap left triggers unserved.
    pub paused: bool,
    pub pending_participant_ids: Vec<String>,
}

/// `participant_id -> triggering message id` for one session round.
type TriggerMap = HashMap<String, String>;

pub struct MentionEngine {
    store: Arc<dyn ChatStore>,
    agents: Arc<dyn AgentRunner>,
    sink: Arc<dyn EventSink>,
    snapshot_limit: usize,
    max_sessions: u32,
    queues: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    pending: Mutex<HashMap<String, TriggerMap>>,
}

impl MentionEngine {
    pub fn new(
        store: Arc<dyn ChatStore>,
        agents: Arc<dyn AgentRunner>,
        sink: Arc<dyn EventSink>,
        snapshot_limit: usize,
        max_sessions: u32,
    ) -> Self {
        Self {
            store,
            agents,
            sink,
            snapshot_limit,
            max_sessions,
            queues: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn queue_for(&self, chat_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut queues = self.queues.lock().unwrap();
        Arc::clone(queues.entry(chat_id.to_string()).or_default())
    }

    fn take_pending(&self, chat_id: &str) -> Option<TriggerMap> {
        self.pending.lock().unwrap().remove(chat_id)
    }

    fn store_pending(&self, chat_id: &str, triggers: TriggerMap) {
        self.pending
            .lock()
            .unwrap()
            .insert(chat_id.to_string(), triggers);
    }

    /// Pending participant ids for a chat, for surfacing in UIs.
    pub fn pending_participants(&self, chat_id: &str) -> Vec<String> {
        self.pending
            .lock()
            .unwrap()
            .get(chat_id)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn emit_mention_state(&self, chat_id: &str, paused: bool, pending: Vec<String>) {
        self.sink.emit(ChatEvent::MentionState {
            chat_id: chat_id.to_string(),
            paused,
            pending_participant_ids: pending,
        });
    }

    /// Drives the cascade started by a freshly appended message.
    ///
    /// Any previously parked triggers for the chat are discarded first; a
    /// new message supersedes a paused cascade.
    pub async fn run_from_trigger_message(
        &self,
        chat_id: &str,
        trigger: &Message,
    ) -> Result<MentionOutcome> {
        self.take_pending(chat_id);
        self.emit_mention_state(chat_id, false, Vec::new());

        let queue = self.queue_for(chat_id);
        let result = {
            let _slot = queue.lock().await;
            // A queued predecessor may have parked triggers while we waited.
            self.take_pending(chat_id);
            self.run_triggered(chat_id, trigger).await
        };
        self.release_queue(chat_id, &queue);
        result
    }

    async fn run_triggered(&self, chat_id: &str, trigger: &Message) -> Result<MentionOutcome> {
        let chat = self.store.get_chat(chat_id).await?;
        let mut triggers = TriggerMap::new();
        for pid in extract_mentions(&trigger.text, &chat.participants) {
            if trigger.author_kind == AuthorKind::Agent && trigger.author_id == pid {
                continue;
            }
            triggers.insert(pid, trigger.id.clone());
        }

        self.run_sessions(chat_id, triggers).await
    }

    /// Continues a paused cascade. No-op when nothing is pending.
    pub async fn resume(&self, chat_id: &str) -> Result<MentionOutcome> {
        let queue = self.queue_for(chat_id);
        let result = {
            let _slot = queue.lock().await;
            match self.take_pending(chat_id) {
                Some(triggers) if !triggers.is_empty() => {
                    self.run_sessions(chat_id, triggers).await
                }
                _ => Ok(MentionOutcome::default()),
            }
        };
        self.release_queue(chat_id, &queue);
        result
    }

    /// Drops the chat's queue entry once we are the last holder. Clones
    /// are only handed out under the `queues` lock, so the count check
    /// cannot race a new arrival: 2 means the map's copy plus ours.
    fn release_queue(&self, chat_id: &str, queue: &Arc<tokio::sync::Mutex<()>>) {
        let mut queues = self.queues.lock().unwrap();
        if Arc::strong_count(queue) == 2 {
            queues.remove(chat_id);
        }
    }

    #[cfg(test)]
    fn queue_entries(&self) -> usize {
        self.queues.lock().unwrap().len()
    }

    /// The session loop. Caller must hold the chat's queue slot.
    async fn run_sessions(&self, chat_id: &str, mut triggers: TriggerMap) -> Result<MentionOutcome> {
        let mut appended: Vec<Message> = Vec::new();

        for session_index in 1..=self.max_sessions {
            if triggers.is_empty() {
                break;
            }
            tracing::debug!(
                chat_id,
                session_index,
                agents = triggers.len(),
                "running mention session"
            );

            let chat = self.store.get_chat(chat_id).await?;
            let snapshot: Arc<Vec<Message>> =
                Arc::new(self.store.list_messages(chat_id, self.snapshot_limit).await?);

            let mut in_flight = FuturesUnordered::new();
            for (participant_id, trigger_id) in triggers.drain() {
                let agents = Arc::clone(&self.agents);
                let snapshot = Arc::clone(&snapshot);
                let chat_id = chat_id.to_string();
                in_flight.push(async move {
                    agents
                        .build_agent_message(
                            &chat_id,
                            &participant_id,
                            &snapshot,
                            RunOptions {
                                trigger: MessageTrigger::Mention,
                                triggered_by_message_id: Some(trigger_id),
                                session_index: Some(session_index),
                            },
                        )
                        .await
                });
            }

            // First completed, first appended.
            let mut replies: Vec<Message> = Vec::new();
            while let Some(result) = in_flight.next().await {
                let message = result?;
                self.store.append_message(chat_id, &message).await?;
                self.sink.emit(ChatEvent::MessageAppended {
                    chat_id: chat_id.to_string(),
                    message: message.clone(),
                });
                replies.push(message);
            }

            // Next round: mentions found in this round's replies, in
            // completion order; first writer wins per participant.
            for reply in &replies {
                for pid in extract_mentions(&reply.text, &chat.participants) {
                    if reply.author_kind == AuthorKind::Agent && reply.author_id == pid {
                        continue;
                    }
                    triggers.entry(pid).or_insert_with(|| reply.id.clone());
                }
            }
            appended.extend(replies);
        }

        let paused = !triggers.is_empty();
        let pending_participant_ids: Vec<String> = triggers.keys().cloned().collect();
        if paused {
            self.store_pending(chat_id, triggers);
        }
        self.emit_mention_state(chat_id, paused, pending_participant_ids.clone());

        Ok(MentionOutcome {
            appended,
            paused,
            pending_participant_ids,
        })
    }
}
