//! Command-line construction for each provider backend.
//!
//! The prompt is always passed as a single discrete argv element; nothing
//! here goes through a shell.

use huddle_core::chat::{ProviderKind, RoamingConfig, RoamingMode};

/// A fully resolved command line for one provider run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// Builds the argv for one provider invocation.
///
/// Roaming widens each CLI's own permission surface; without it every
/// provider runs in its most restricted non-interactive mode.
pub fn build_command(provider: ProviderKind, prompt: &str, roaming: &RoamingConfig) -> CommandSpec {
    match provider {
        ProviderKind::Codex => {
            let mut args = vec![
                "exec".to_string(),
                "--ephemeral".to_string(),
                "--skip-git-repo-check".to_string(),
            ];
            if roaming.enabled {
                args.push("--full-auto".to_string());
                args.push("--sandbox".to_string());
                args.push(match roaming.mode {
                    RoamingMode::Yolo => "danger-full-access".to_string(),
                    RoamingMode::Safe => "workspace-write".to_string(),
                });
            }
            args.push(prompt.to_string());
            CommandSpec {
                program: "codex".to_string(),
                args,
                env: Vec::new(),
            }
        }
        ProviderKind::Claude => {
            let mut args = vec![
                "-p".to_string(),
                prompt.to_string(),
                "--output-format".to_string(),
                "text".to_string(),
            ];
            if roaming.enabled {
                args.push("--dangerously-skip-permissions".to_string());
                args.push("--allowedTools".to_string());
                args.push("Bash,Read,Write".to_string());
                if let Some(dir) = &roaming.workspace_dir {
                    args.push("--cwd".to_string());
                    args.push(dir.to_string_lossy().into_owned());
                }
            } else {
                args.push("--permission-mode".to_string());
                args.push("plan".to_string());
            }
            CommandSpec {
                program: "claude".to_string(),
                args,
                env: Vec::new(),
            }
        }
        ProviderKind::Gemini => {
            let mut args = vec![
                "-p".to_string(),
                prompt.to_string(),
                "--output-format".to_string(),
                "text".to_string(),
            ];
            if roaming.enabled {
                args.push("--yolo".to_string());
            }
            CommandSpec {
                program: "gemini".to_string(),
                args,
                env: Vec::new(),
            }
        }
    }
}
