//! Subprocess execution with a deadline and graceful termination.
//!
//! On timeout the child gets SIGTERM first (unix), a short grace period to
//! flush and exit, then a hard kill. Whatever output was captured before
//! termination is still returned.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

/// Grace period between SIGTERM and the hard kill.
const TERM_GRACE: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
    pub stdin: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub timed_out: bool,
}

/// Runs the command to completion or deadline.
///
/// # Errors
///
/// Returns the spawn error untouched so callers can distinguish a missing
/// binary (`ErrorKind::NotFound`) from other failures.
pub async fn run_process(req: RunRequest) -> std::io::Result<ProcessResult> {
    let mut command = Command::new(&req.program);
    command
        .args(&req.args)
        .current_dir(&req.cwd)
        .stdin(if req.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &req.env {
        command.env(key, value);
    }

    let mut child = command.spawn()?;

    if let Some(input) = req.stdin {
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(input.as_bytes()).await;
            drop(stdin);
        }
    }

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let stdout_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf).await;
        }
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf).await;
        }
        buf
    });

    let deadline = tokio::time::sleep(req.timeout);
    tokio::pin!(deadline);

    let mut timed_out = false;
    let status = tokio::select! {
        status = child.wait() => Some(status?),
        _ = &mut deadline => {
            timed_out = true;
            terminate(&mut child).await
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    Ok(ProcessResult {
        stdout,
        stderr,
        exit_code: status.as_ref().and_then(|s| s.code()),
        signal: status.as_ref().and_then(exit_signal),
        timed_out,
    })
}

/// SIGTERM, wait out the grace period, then kill. Returns the exit status
/// when the child was reaped.
async fn terminate(child: &mut Child) -> Option<std::process::ExitStatus> {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        unsafe {
            libc::kill(pid as i32, libc::SIGTERM);
        }
        if let Ok(status) = tokio::time::timeout(TERM_GRACE, child.wait()).await {
            return status.ok();
        }
    }
    let _ = child.kill().await;
    child.wait().await.ok()
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> RunRequest {
        RunRequest {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            cwd: std::env::temp_dir(),
            env: Vec::new(),
            timeout,
            stdin: None,
        }
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let result = run_process(sh("printf hello", Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(result.stdout, "hello");
        assert_eq!(result.exit_code, Some(0));
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn test_captures_stderr_and_exit_code() {
        let result = run_process(sh("printf oops >&2; exit 3", Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(result.stderr, "oops");
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_timeout_terminates_and_flags() {
        let start = std::time::Instant::now();
        let result = run_process(sh("sleep 30", Duration::from_millis(200)))
            .await
            .unwrap();
        assert!(result.timed_out);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_partial_output_survives_timeout() {
        let result = run_process(sh("printf partial; sleep 30", Duration::from_millis(300)))
            .await
            .unwrap();
        assert!(result.timed_out);
        assert_eq!(result.stdout, "partial");
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let req = RunRequest {
            program: "definitely-not-a-real-binary-huddle".to_string(),
            args: Vec::new(),
            cwd: std::env::temp_dir(),
            env: Vec::new(),
            timeout: Duration::from_secs(1),
            stdin: None,
        };
        let err = run_process(req).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
