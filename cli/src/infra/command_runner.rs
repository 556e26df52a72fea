//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution with guaranteed timeout and kill on all platforms.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt as _;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;

use crate::application::ports::{CommandRunner, OutputLines};
use crate::domain::CommandError;

/// Default timeout for captured engine commands (stack select, history, output).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(120);

/// Production `CommandRunner` — uses tokio for async process execution
/// with guaranteed timeout and kill on all platforms.
///
/// On Windows, `tokio::time::timeout` around `.output().await` does NOT kill
/// the child process when the timeout fires — the future is dropped but the
/// OS process keeps running. This implementation uses `tokio::select!` with
/// explicit `child.kill()` to guarantee the process is terminated.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        tracing::debug!(program, ?args, "running command");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        tokio::select! {
            result = async {
                let (status, stdout, stderr) = tokio::join!(
                    child.wait(),
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stdout_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stderr_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                );
                Ok(Output {
                    status: status.with_context(|| format!("waiting for {program}"))?,
                    stdout,
                    stderr,
                })
            } => result,
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }

    fn run_lines(&self, program: &str, args: &[&str]) -> Result<OutputLines> {
        tracing::debug!(program, ?args, "streaming command");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let stdout = child
            .stdout
            .take()
            .with_context(|| format!("{program} stdout was not captured"))?;
        let stderr_handle = child.stderr.take();
        let stderr = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut h) = stderr_handle {
                let _ = h.read_to_end(&mut buf).await;
            }
            buf
        });

        let state = LineState::Streaming(Box::new(Streaming {
            program: program.to_string(),
            child,
            stdout: BufReader::new(stdout),
            stderr,
        }));
        Ok(futures_util::stream::unfold(state, next_line).boxed())
    }

    async fn run_status_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<std::process::ExitStatus> {
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .envs(env.iter().copied())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        child
            .wait()
            .await
            .with_context(|| format!("waiting for {program}"))
    }
}

// ── Line streaming ────────────────────────────────────────────────────────────

struct Streaming {
    program: String,
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: JoinHandle<Vec<u8>>,
}

enum LineState {
    Streaming(Box<Streaming>),
    Finished,
}

/// Yield the next stdout line; at end of output, reap the child and yield
/// a [`CommandError`] if it failed.
///
/// Lines are decoded lossily: bytes that are not UTF-8 become U+FFFD and the
/// stream carries on.
async fn next_line(state: LineState) -> Option<(Result<String>, LineState)> {
    let LineState::Streaming(mut s) = state else {
        return None;
    };

    let mut buf = Vec::new();
    match s.stdout.read_until(b'\n', &mut buf).await {
        Ok(n) if n > 0 => Some((Ok(decode_line(&buf)), LineState::Streaming(s))),
        Ok(_) => {
            let status = s.child.wait().await;
            let stderr = s.stderr.await.unwrap_or_default();
            match status {
                Ok(status) if status.success() => None,
                Ok(status) => {
                    let err = CommandError {
                        program: s.program,
                        code: status.code(),
                        stderr: String::from_utf8_lossy(&stderr).into_owned(),
                    };
                    Some((Err(err.into()), LineState::Finished))
                }
                Err(e) => Some((
                    Err(anyhow::Error::new(e).context(format!("waiting for {}", s.program))),
                    LineState::Finished,
                )),
            }
        }
        Err(e) => {
            let program = s.program.clone();
            let _ = s.child.kill().await;
            Some((
                Err(anyhow::Error::new(e).context(format!("reading output of {program}"))),
                LineState::Finished,
            ))
        }
    }
}

/// Strip the line terminator (`\n` or `\r\n`) and decode.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
