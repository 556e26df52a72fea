//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors caused by a mismatch between settings, declared resources and what
/// the workflow expects. Never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Output '{0}' not found in stack outputs")]
    MissingOutput(String),

    #[error("Output '{key}' is not a valid port number: {value}")]
    InvalidPort { key: String, value: String },

    #[error("max_attempts must be greater than zero")]
    ZeroAttempts,

    #[error("Setting '{0}' must not be empty")]
    EmptySetting(&'static str),

    #[error("Unknown verifier '{value}'. Valid verifiers: {valid}")]
    UnknownVerifier { value: String, valid: String },
}

// ── Engine errors ─────────────────────────────────────────────────────────────

/// Errors reported by the provisioning engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No Pulumi project found in {0}")]
    MissingProject(String),

    #[error("pulumi {operation} failed{}", exit_suffix(.code))]
    OperationFailed {
        operation: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    #[error("cannot parse pulumi {operation} output: {reason}")]
    MalformedOutput {
        operation: &'static str,
        reason: String,
    },
}

impl EngineError {
    /// The engine's own diagnostic stream, when the failure carries one.
    #[must_use]
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::OperationFailed { stderr, .. } if !stderr.trim().is_empty() => Some(stderr),
            _ => None,
        }
    }
}

// ── Process errors ────────────────────────────────────────────────────────────

/// A child process ran to completion but reported failure.
#[derive(Debug, Error)]
#[error("{program} exited unsuccessfully{}", exit_suffix(.code))]
pub struct CommandError {
    pub program: String,
    pub code: Option<i32>,
    pub stderr: String,
}

#[allow(clippy::ref_option)]
fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!(" (exit code {c})"),
        None => " (terminated by signal)".to_string(),
    }
}
