//! The agent run service: prompt → provider CLI → chat message.
//!
//! Provider failures are absorbed into the produced message's text; the
//! only hard errors out of `build_agent_message` are unknown chat or
//! participant and store failures.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use huddle_core::chat::{ChatStore, Message, MessageMeta, MessageTrigger, Participant};
use huddle_core::event::{ChatEvent, EventSink, RunStatus};
use huddle_core::ids::{new_id, now_iso};
use huddle_core::prompt::build_agent_prompt;
use huddle_core::{HuddleError, Result};

use crate::debug_log::{DebugLogStore, DebugRun, prompt_preview};
use crate::runner::{ProviderInvocation, ProviderOutcome, ProviderRunner, StartInfo};

/// How one run was initiated; attached to the produced message's meta.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub trigger: MessageTrigger,
    pub triggered_by_message_id: Option<String>,
    pub session_index: Option<u32>,
}

/// Produces one agent reply from a transcript snapshot.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Builds the agent's reply message without appending it anywhere.
    ///
    /// # Errors
    ///
    /// Fails on unknown chat or participant; provider-level failures are
    /// folded into the returned message text instead.
    async fn build_agent_message(
        &self,
        chat_id: &str,
        participant_id: &str,
        snapshot: &[Message],
        opts: RunOptions,
    ) -> Result<Message>;
}

pub struct AgentService {
    store: Arc<dyn ChatStore>,
    runner: Arc<dyn ProviderRunner>,
    debug_log: Arc<DebugLogStore>,
    sink: Arc<dyn EventSink>,
    /// Root under which per-chat default workspaces live.
    chats_root: PathBuf,
    snapshot_limit: usize,
    default_timeout: Duration,
    roaming_timeout: Duration,
}

impl AgentService {
    pub fn new(
        store: Arc<dyn ChatStore>,
        runner: Arc<dyn ProviderRunner>,
        debug_log: Arc<DebugLogStore>,
        sink: Arc<dyn EventSink>,
        chats_root: PathBuf,
        snapshot_limit: usize,
    ) -> Self {
        Self {
            store,
            runner,
            debug_log,
            sink,
            chats_root,
            snapshot_limit,
            default_timeout: crate::runner::DEFAULT_TIMEOUT,
            roaming_timeout: crate::runner::ROAMING_TIMEOUT,
        }
    }

    /// Overrides the provider timeouts. Config hook.
    pub fn with_timeouts(mut self, default: Duration, roaming: Duration) -> Self {
        self.default_timeout = default;
        self.roaming_timeout = roaming;
        self
    }

    pub fn debug_log(&self) -> &DebugLogStore {
        &self.debug_log
    }

    fn default_work_dir(&self, chat_id: &str) -> PathBuf {
        self.chats_root.join(chat_id).join("workspace")
    }

    /// Manual entry point: snapshot the transcript, build the reply, and
    /// append it to the store.
    pub async fn run_agent(
        &self,
        chat_id: &str,
        participant_id: &str,
        opts: RunOptions,
    ) -> Result<Message> {
        let snapshot = self.store.list_messages(chat_id, self.snapshot_limit).await?;
        let message = self
            .build_agent_message(chat_id, participant_id, &snapshot, opts)
            .await?;
        self.store.append_message(chat_id, &message).await?;
        Ok(message)
    }

    fn emit_status(&self, run: &DebugRun, status: RunStatus) {
        self.sink.emit(ChatEvent::RunStatus {
            run_id: run.id.clone(),
            chat_id: run.chat_id.clone(),
            participant_id: run.participant_id.clone(),
            participant_display_name: run.participant_display_name.clone(),
            provider: run.provider,
            status,
            ts: now_iso(),
        });
    }
}

/// Reply text for an outcome the provider did not answer cleanly.
fn classify_text(participant: &Participant, outcome: &ProviderOutcome) -> String {
    if !outcome.text.is_empty() {
        return outcome.text.clone();
    }
    if outcome.exec.timed_out {
        let secs = outcome.exec.timeout.as_secs_f64().round() as u64;
        return format!("{} timed out after {}s", participant.provider, secs);
    }
    let code = outcome.exec.exit_code.unwrap_or(0);
    if code != 0 {
        return format!("{} exited with code {}", participant.provider, code);
    }
    String::new()
}

#[async_trait]
impl AgentRunner for AgentService {
    async fn build_agent_message(
        &self,
        chat_id: &str,
        participant_id: &str,
        snapshot: &[Message],
        opts: RunOptions,
    ) -> Result<Message> {
        let chat = self.store.get_chat(chat_id).await?;
        let participant = chat
            .participant(participant_id)
            .ok_or_else(|| HuddleError::not_found("participant", participant_id))?
            .clone();

        let prompt = build_agent_prompt(&chat, &participant, snapshot);

        let run_id = new_id("run");
        let ts_start = now_iso();
        let base_run = DebugRun {
            id: run_id.clone(),
            chat_id: chat_id.to_string(),
            participant_id: participant.id.clone(),
            participant_display_name: participant.display_name.clone(),
            provider: participant.provider,
            trigger: opts.trigger,
            triggered_by_message_id: opts.triggered_by_message_id.clone(),
            session_index: opts.session_index,
            status: RunStatus::Running,
            ts_start: ts_start.clone(),
            ts_end: None,
            command: String::new(),
            args: Vec::new(),
            cwd: String::new(),
            timeout_ms: 0,
            roaming: participant.roaming.enabled,
            prompt_length: prompt.chars().count(),
            prompt_preview: prompt_preview(&prompt),
            stdout: None,
            stderr: None,
            exit_code: None,
            signal: None,
            timed_out: None,
            error: None,
        };

        let invocation = ProviderInvocation {
            provider: participant.provider,
            prompt,
            roaming: participant.roaming.clone(),
            default_work_dir: self.default_work_dir(chat_id),
            timeout: Some(if participant.roaming.enabled {
                self.roaming_timeout
            } else {
                self.default_timeout
            }),
        };

        let on_start = {
            let debug_log = Arc::clone(&self.debug_log);
            let sink = Arc::clone(&self.sink);
            let run = base_run.clone();
            Box::new(move |info: StartInfo| {
                let mut started = run;
                started.command = info.command;
                started.args = info.args;
                started.cwd = info.cwd.to_string_lossy().into_owned();
                started.timeout_ms = info.timeout.as_millis() as u64;
                debug_log.upsert_run(started.clone());
                sink.emit(ChatEvent::RunStatus {
                    run_id: started.id.clone(),
                    chat_id: started.chat_id.clone(),
                    participant_id: started.participant_id.clone(),
                    participant_display_name: started.participant_display_name.clone(),
                    provider: started.provider,
                    status: RunStatus::Running,
                    ts: now_iso(),
                });
            })
        };

        let (text, final_run) = match self.runner.run(invocation, on_start).await {
            Ok(outcome) => {
                let status = if outcome.exec.timed_out {
                    RunStatus::Timeout
                } else if outcome.exec.exit_code.unwrap_or(0) != 0 && outcome.text.is_empty() {
                    RunStatus::Error
                } else {
                    RunStatus::Finished
                };
                let mut run = self
                    .debug_log
                    .list_runs(chat_id)
                    .into_iter()
                    .find(|r| r.id == run_id)
                    .unwrap_or(base_run);
                run.status = status;
                run.ts_end = Some(now_iso());
                run.stdout = Some(outcome.exec.stdout.clone());
                run.stderr = Some(outcome.exec.stderr.clone());
                run.exit_code = outcome.exec.exit_code;
                run.signal = outcome.exec.signal;
                run.timed_out = Some(outcome.exec.timed_out);
                if status != RunStatus::Finished {
                    run.error = Some(match status {
                        RunStatus::Timeout => format!("timed out after {:?}", outcome.exec.timeout),
                        _ => format!("exit code {:?}", outcome.exec.exit_code),
                    });
                }
                (classify_text(&participant, &outcome), run)
            }
            Err(e) => {
                tracing::warn!(
                    chat_id,
                    participant_id,
                    error = %e,
                    "provider invocation failed"
                );
                let mut run = self
                    .debug_log
                    .list_runs(chat_id)
                    .into_iter()
                    .find(|r| r.id == run_id)
                    .unwrap_or(base_run);
                run.status = RunStatus::Error;
                run.ts_end = Some(now_iso());
                run.error = Some(e.to_string());
                if run.command.is_empty() {
                    run.command = participant.provider.to_string();
                }
                (
                    format!("Error running {}: {}", participant.provider, e),
                    run,
                )
            }
        };

        let status = final_run.status;
        self.debug_log.upsert_run(final_run.clone());
        self.emit_status(&final_run, status);

        Ok(Message {
            id: new_id("m"),
            ts: now_iso(),
            author_kind: huddle_core::chat::AuthorKind::Agent,
            author_id: participant.id.clone(),
            author_display_name: participant.display_name.clone(),
            text,
            meta: MessageMeta {
                trigger: opts.trigger,
                triggered_by_message_id: opts.triggered_by_message_id,
                session_index: opts.session_index,
                provider: Some(participant.provider),
            },
        })
    }
}
