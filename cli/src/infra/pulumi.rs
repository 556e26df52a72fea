//! Infrastructure implementation of the `ProvisioningEngine` port.
//!
//! `PulumiEngine<R>` routes every engine operation through the `pulumi` CLI
//! via a `CommandRunner`, so tests can inject a mock runner without spawning
//! real processes.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use futures_util::StreamExt as _;
use serde_json::Value;

use crate::application::ports::{CommandRunner, OutputLines, ProvisioningEngine};
use crate::domain::{CommandError, EngineError, OutputSet, StackHandle, UpdateSummary};

/// Project file names the engine accepts in a working directory.
const PROJECT_FILES: &[&str] = &["Pulumi.yaml", "Pulumi.yml"];

/// Infrastructure adapter that drives the `pulumi` CLI.
pub struct PulumiEngine<R: CommandRunner> {
    runner: R,
    program: String,
}

impl<R: CommandRunner> PulumiEngine<R> {
    /// Create an engine invoking `program` (usually `"pulumi"`) through `runner`.
    pub fn new(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    async fn capture(&self, operation: &'static str, args: &[&str]) -> Result<Vec<u8>> {
        let output = self
            .runner
            .run(&self.program, args)
            .await
            .with_context(|| format!("pulumi {operation}"))?;
        if !output.status.success() {
            return Err(EngineError::OperationFailed {
                operation,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }
        Ok(output.stdout)
    }

    fn stream(&self, operation: &'static str, args: &[&str]) -> Result<OutputLines> {
        let lines = self
            .runner
            .run_lines(&self.program, args)
            .with_context(|| format!("pulumi {operation}"))?;
        Ok(lines
            .map(move |item| item.map_err(|e| engine_failure(operation, e)))
            .boxed())
    }
}

/// Re-tag a failed child process as an engine failure, keeping its stderr.
fn engine_failure(operation: &'static str, err: anyhow::Error) -> anyhow::Error {
    match err.downcast::<CommandError>() {
        Ok(cmd) => EngineError::OperationFailed {
            operation,
            code: cmd.code,
            stderr: cmd.stderr,
        }
        .into(),
        Err(other) => other,
    }
}

fn stack_args<'a>(stack: &'a StackHandle, dir: &'a str, head: &[&'a str]) -> Vec<&'a str> {
    let mut args = head.to_vec();
    args.extend(["--stack", stack.name.as_str(), "--cwd", dir]);
    args
}

fn dir_str(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("path is not valid UTF-8: {}", path.display()))
}

/// Parse `pulumi stack history --json` output; the newest entry comes first.
///
/// # Errors
///
/// Returns [`EngineError::MalformedOutput`] if the output is not a JSON array
/// or the history is empty.
pub fn parse_history(stdout: &[u8]) -> Result<UpdateSummary, EngineError> {
    let entries: Vec<UpdateSummary> =
        serde_json::from_slice(stdout).map_err(|e| EngineError::MalformedOutput {
            operation: "stack history",
            reason: e.to_string(),
        })?;
    entries
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::MalformedOutput {
            operation: "stack history",
            reason: "stack has no update history".to_string(),
        })
}

/// Parse `pulumi stack output --json` output.
///
/// # Errors
///
/// Returns [`EngineError::MalformedOutput`] if the output is not a JSON object.
pub fn parse_outputs(stdout: &[u8]) -> Result<OutputSet, EngineError> {
    let trimmed = String::from_utf8_lossy(stdout);
    if trimmed.trim().is_empty() {
        return Ok(OutputSet::default());
    }
    let values: BTreeMap<String, Value> =
        serde_json::from_str(&trimmed).map_err(|e| EngineError::MalformedOutput {
            operation: "stack output",
            reason: e.to_string(),
        })?;
    Ok(OutputSet::new(values))
}

impl<R: CommandRunner> ProvisioningEngine for PulumiEngine<R> {
    async fn select_or_create(&self, name: &str, work_dir: &Path) -> Result<StackHandle> {
        if !PROJECT_FILES.iter().any(|f| work_dir.join(f).is_file()) {
            return Err(EngineError::MissingProject(work_dir.display().to_string()).into());
        }
        let dir = dir_str(work_dir)?;
        self.capture(
            "stack select",
            &[
                "stack",
                "select",
                name,
                "--create",
                "--non-interactive",
                "--cwd",
                dir,
            ],
        )
        .await?;
        tracing::info!(stack = name, work_dir = %work_dir.display(), "stack selected");
        Ok(StackHandle {
            name: name.to_string(),
            work_dir: work_dir.to_path_buf(),
        })
    }

    fn refresh(&self, stack: &StackHandle) -> Result<OutputLines> {
        let dir = dir_str(&stack.work_dir)?;
        let args = stack_args(
            stack,
            dir,
            &["refresh", "--yes", "--skip-preview", "--non-interactive"],
        );
        self.stream("refresh", &args)
    }

    fn up(&self, stack: &StackHandle) -> Result<OutputLines> {
        let dir = dir_str(&stack.work_dir)?;
        let args = stack_args(
            stack,
            dir,
            &["up", "--yes", "--skip-preview", "--non-interactive"],
        );
        self.stream("up", &args)
    }

    async fn update_summary(&self, stack: &StackHandle) -> Result<UpdateSummary> {
        let dir = dir_str(&stack.work_dir)?;
        let args = stack_args(
            stack,
            dir,
            &[
                "stack",
                "history",
                "--json",
                "--show-secrets",
                "--page-size",
                "1",
            ],
        );
        let stdout = self.capture("stack history", &args).await?;
        Ok(parse_history(&stdout)?)
    }

    async fn outputs(&self, stack: &StackHandle) -> Result<OutputSet> {
        let dir = dir_str(&stack.work_dir)?;
        let args = stack_args(
            stack,
            dir,
            &["stack", "output", "--json", "--show-secrets"],
        );
        let stdout = self.capture("stack output", &args).await?;
        Ok(parse_outputs(&stdout)?)
    }
}
