//! Debug run reporting.
//!
//! Run records live in memory for the lifetime of the process, so this is
//! surfaced via `--debug` on the commands that execute agents.

use anyhow::Result;

use crate::app::App;

pub fn print(app: &App, chat_id: &str) -> Result<()> {
    let runs = app.agent_service.debug_log().list_runs(chat_id);
    if runs.is_empty() {
        eprintln!("no runs recorded");
        return Ok(());
    }
    for run in runs {
        eprintln!(
            "{} {} [{}] {} {} (cwd {}, timeout {}ms)",
            run.ts_start,
            run.id,
            run.status,
            run.participant_display_name,
            run.command,
            run.cwd,
            run.timeout_ms
        );
        if let Some(code) = run.exit_code {
            eprintln!("  exit code: {code}");
        }
        if run.timed_out == Some(true) {
            eprintln!("  timed out");
        }
        if let Some(error) = &run.error {
            eprintln!("  error: {error}");
        }
        if let Some(stderr) = run.stderr.as_deref().map(str::trim) {
            if !stderr.is_empty() {
                eprintln!("  stderr: {stderr}");
            }
        }
    }
    Ok(())
}
