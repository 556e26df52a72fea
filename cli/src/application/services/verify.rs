//! Verification strategies behind the `Verifier` port.
//!
//! Three interchangeable strategies are provided: an inline HTTP probe, an
//! external test-runner subprocess, and the probe followed by the echo
//! conformance checks. Exactly one runs per workflow.

use anyhow::{Context, Result};

use crate::application::ports::{
    CommandRunner, HttpClient, ProgressReporter, Verifier, VerifyTarget,
};
use crate::application::services::echo_suite::run_echo_suite;
use crate::application::services::prober::probe;
use crate::domain::{ProbeOptions, ProbeResult};

/// Build the base URL for a published port.
#[must_use]
pub fn target_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}")
}

fn report_probe(result: &ProbeResult, reporter: &impl ProgressReporter) {
    if result.success {
        reporter.success(&result.message);
        return;
    }
    reporter.warn(&format!("TEST FAILED: {}", result.message));
    if let Some(details) = &result.details {
        let pretty = serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string());
        for line in pretty.lines() {
            reporter.passthrough(line);
        }
    }
}

// ── Inline HTTP probe ─────────────────────────────────────────────────────────

/// Verifies by probing the published port until it answers `200 OK`.
pub struct HttpVerifier<C: HttpClient> {
    client: C,
    host: String,
    options: ProbeOptions,
}

impl<C: HttpClient> HttpVerifier<C> {
    pub fn new(client: C, host: impl Into<String>, options: ProbeOptions) -> Self {
        Self {
            client,
            host: host.into(),
            options,
        }
    }
}

impl<C: HttpClient> Verifier for HttpVerifier<C> {
    async fn verify(
        &self,
        target: &VerifyTarget,
        reporter: &impl ProgressReporter,
    ) -> Result<bool> {
        let url = target_url(&self.host, target.port);
        let result = probe(&self.client, reporter, &url, &self.options).await;
        report_probe(&result, reporter);
        Ok(result.success)
    }
}

// ── External test runner ──────────────────────────────────────────────────────

/// Verifies by running a test-runner command with the port in its environment.
///
/// The port is injected into the child's environment only; the parent
/// process environment is never modified.
pub struct CommandVerifier<R: CommandRunner> {
    runner: R,
    command: String,
    port_env: String,
}

impl<R: CommandRunner> CommandVerifier<R> {
    pub fn new(runner: R, command: impl Into<String>, port_env: impl Into<String>) -> Self {
        Self {
            runner,
            command: command.into(),
            port_env: port_env.into(),
        }
    }
}

#[cfg(windows)]
fn shell_invocation(command: &str) -> (&'static str, [&str; 2]) {
    ("cmd", ["/C", command])
}

#[cfg(not(windows))]
fn shell_invocation(command: &str) -> (&'static str, [&str; 2]) {
    ("sh", ["-c", command])
}

impl<R: CommandRunner> Verifier for CommandVerifier<R> {
    async fn verify(
        &self,
        target: &VerifyTarget,
        reporter: &impl ProgressReporter,
    ) -> Result<bool> {
        reporter.step(&format!("running tests: {}", self.command));
        let port = target.port.to_string();
        let (shell, args) = shell_invocation(&self.command);
        let status = self
            .runner
            .run_status_with_env(shell, &args, &[(self.port_env.as_str(), port.as_str())])
            .await
            .with_context(|| format!("running test command '{}'", self.command))?;

        tracing::info!(command = %self.command, code = ?status.code(), "test command finished");
        if status.success() {
            reporter.success("all tests passed");
            Ok(true)
        } else {
            let reason = status
                .code()
                .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));
            reporter.warn(&format!("TEST FAILED: test command failed ({reason})"));
            Ok(false)
        }
    }
}

// ── Probe + conformance checks ────────────────────────────────────────────────

/// Waits for readiness with the probe, then runs the echo conformance checks.
pub struct EchoSuiteVerifier<C: HttpClient> {
    client: C,
    host: String,
    options: ProbeOptions,
}

impl<C: HttpClient> EchoSuiteVerifier<C> {
    pub fn new(client: C, host: impl Into<String>, options: ProbeOptions) -> Self {
        Self {
            client,
            host: host.into(),
            options,
        }
    }
}

impl<C: HttpClient> Verifier for EchoSuiteVerifier<C> {
    async fn verify(
        &self,
        target: &VerifyTarget,
        reporter: &impl ProgressReporter,
    ) -> Result<bool> {
        let url = target_url(&self.host, target.port);
        let ready = probe(&self.client, reporter, &url, &self.options).await;
        if !ready.success {
            report_probe(&ready, reporter);
            return Ok(false);
        }

        reporter.step("running echo conformance checks...");
        let outcomes = run_echo_suite(&self.client, reporter, &url, self.options.timeout).await;
        let failed = outcomes.iter().filter(|o| !o.passed).count();
        if failed == 0 {
            reporter.success(&format!("all {} echo checks passed", outcomes.len()));
            Ok(true)
        } else {
            reporter.warn(&format!(
                "TEST FAILED: {failed} of {} echo checks failed",
                outcomes.len()
            ));
            Ok(false)
        }
    }
}
