//! The provider runner: resolves where and how long a CLI runs, executes
//! it, and normalizes its output.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;

use huddle_core::chat::{ProviderKind, RoamingConfig};
use huddle_core::{HuddleError, Result};

use crate::process::{ProcessResult, RunRequest, run_process};
use crate::provider::build_command;

/// Timeout for non-roaming runs.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);
/// Roaming runs do real filesystem work and get a longer leash.
pub const ROAMING_TIMEOUT: Duration = Duration::from_secs(240);

/// One resolved provider run.
#[derive(Debug, Clone)]
pub struct ProviderInvocation {
    pub provider: ProviderKind,
    pub prompt: String,
    pub roaming: RoamingConfig,
    /// Working directory when roaming is off or unconfigured.
    pub default_work_dir: PathBuf,
    pub timeout: Option<Duration>,
}

/// What was about to run, reported just before waiting on the child.
#[derive(Debug, Clone)]
pub struct StartInfo {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
}

/// Everything observed about a finished run, for debug records.
#[derive(Debug, Clone)]
pub struct ExecInfo {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub timed_out: bool,
}

#[derive(Debug, Clone)]
pub struct ProviderOutcome {
    /// Normalized reply text (may be empty).
    pub text: String,
    pub exec: ExecInfo,
}

pub type StartCallback = Box<dyn FnOnce(StartInfo) + Send>;

/// Executes provider invocations. The production impl shells out to the
/// provider CLIs; tests substitute scripted outcomes.
#[async_trait]
pub trait ProviderRunner: Send + Sync {
    /// Runs the invocation, calling `on_start` once the command line and
    /// working directory are resolved and the child is being launched.
    async fn run(&self, invocation: ProviderInvocation, on_start: StartCallback)
    -> Result<ProviderOutcome>;
}

#[derive(Debug, Default)]
pub struct CliProviderRunner;

impl CliProviderRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProviderRunner for CliProviderRunner {
    async fn run(
        &self,
        invocation: ProviderInvocation,
        on_start: StartCallback,
    ) -> Result<ProviderOutcome> {
        let cwd = match (&invocation.roaming.enabled, &invocation.roaming.workspace_dir) {
            (true, Some(dir)) => dir.clone(),
            _ => invocation.default_work_dir.clone(),
        };
        fs::create_dir_all(&cwd).await?;

        let timeout = invocation.timeout.unwrap_or(if invocation.roaming.enabled {
            ROAMING_TIMEOUT
        } else {
            DEFAULT_TIMEOUT
        });

        let spec = build_command(invocation.provider, &invocation.prompt, &invocation.roaming);
        on_start(StartInfo {
            command: spec.program.clone(),
            args: spec.args.clone(),
            cwd: cwd.clone(),
            timeout,
        });

        tracing::debug!(
            provider = %invocation.provider,
            command = %spec.program,
            cwd = %cwd.display(),
            timeout_secs = timeout.as_secs(),
            "spawning provider CLI"
        );

        let result = run_process(RunRequest {
            program: spec.program.clone(),
            args: spec.args.clone(),
            cwd: cwd.clone(),
            env: spec.env,
            timeout,
            stdin: None,
        })
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HuddleError::ProviderNotFound {
                    provider: invocation.provider.to_string(),
                    command: spec.program.clone(),
                }
            } else {
                HuddleError::execution(format!("failed to spawn {}: {}", spec.program, e))
            }
        })?;

        Ok(ProviderOutcome {
            text: normalize_output(&result),
            exec: ExecInfo {
                command: spec.program,
                args: spec.args,
                cwd,
                timeout,
                stdout: result.stdout,
                stderr: result.stderr,
                exit_code: result.exit_code,
                signal: result.signal,
                timed_out: result.timed_out,
            },
        })
    }
}

/// Stdout, falling back to stderr only when stdout is the empty string;
/// CRLF normalized and trimmed.
fn normalize_output(result: &ProcessResult) -> String {
    let raw = if result.stdout.is_empty() {
        &result.stderr
    } else {
        &result.stdout
    };
    raw.replace("\r\n", "\n").trim().to_string()
}
