//! Interaction layer: provider CLIs, subprocess control, and agent runs.

pub mod agent;
pub mod debug_log;
pub mod process;
pub mod provider;
pub mod runner;

pub use agent::{AgentRunner, AgentService, RunOptions};
pub use debug_log::{DebugLogStore, DebugRun};
pub use provider::{CommandSpec, build_command};
pub use runner::{
    CliProviderRunner, ExecInfo, ProviderInvocation, ProviderOutcome, ProviderRunner, StartInfo,
};
