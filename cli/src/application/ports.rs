//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use futures_util::stream::BoxStream;

use crate::domain::{HttpError, HttpRequest, HttpResponse, OutputSet, StackHandle, UpdateSummary};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Lines of progress text produced by a long-running child process.
///
/// Finite and non-restartable. A failure of the producing process arrives as
/// the final `Err` item, after every line it printed.
pub type OutputLines = BoxStream<'static, Result<String>>;

/// What a verification strategy is pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyTarget {
    /// Externally reachable port read from the stack outputs.
    pub port: u16,
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(&self, program: &str, args: &[&str], timeout: Duration)
    -> Result<Output>;
    /// Spawn a program and stream its stdout line by line.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned. Failures after
    /// spawning are delivered through the stream.
    fn run_lines(&self, program: &str, args: &[&str]) -> Result<OutputLines>;
    /// Run a program with inherited stdio and extra environment variables,
    /// returning only its exit status.
    async fn run_status_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<std::process::ExitStatus>;
}

// ── Provisioning Engine Port ──────────────────────────────────────────────────

/// The declarative provisioning engine, consumed as a black box.
#[allow(async_fn_in_trait)]
pub trait ProvisioningEngine {
    /// Select the stack `name` in `work_dir`, creating it if it does not exist.
    ///
    /// Calling this twice with the same arguments yields equal handles.
    async fn select_or_create(&self, name: &str, work_dir: &Path) -> Result<StackHandle>;
    /// Start reconciling the stack's view of real-world state.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation cannot be started.
    fn refresh(&self, stack: &StackHandle) -> Result<OutputLines>;
    /// Start applying the declared resource graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation cannot be started.
    fn up(&self, stack: &StackHandle) -> Result<OutputLines>;
    /// Summary of the most recent completed update.
    async fn update_summary(&self, stack: &StackHandle) -> Result<UpdateSummary>;
    /// Current stack outputs.
    async fn outputs(&self, stack: &StackHandle) -> Result<OutputSet>;
}

// ── HTTP Port ─────────────────────────────────────────────────────────────────

/// Abstracts the HTTP client so probing can be tested without a network.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// Send one request. Any status is a response; only transport failures are errors.
    async fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, HttpError>;
}

// ── Verification Port ─────────────────────────────────────────────────────────

/// A pluggable verification strategy for a freshly deployed stack.
#[allow(async_fn_in_trait)]
pub trait Verifier {
    /// Returns `Ok(true)` when the deployment behaves as expected.
    ///
    /// `Ok(false)` is a verification failure; `Err` means the strategy itself
    /// could not run.
    async fn verify(&self, target: &VerifyTarget, reporter: &impl ProgressReporter)
    -> Result<bool>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Forward a line produced by an external tool, unchanged.
    fn passthrough(&self, line: &str);
}
