//! Domain types and validators for echo-deploy configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access. Loading from
//! the environment lives in `crate::infra::config`.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::error::ConfigError;
use crate::domain::probe::{ProbeOptions, RetrySchedule};
use crate::domain::stack::DEFAULT_PORT_OUTPUT;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_VERIFIERS: &[&str] = &["http", "command", "suite"];

// ── Config schema ────────────────────────────────────────────────────────────

/// Which verification strategy runs against the deployed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifierKind {
    /// Inline HTTP probe.
    #[default]
    Http,
    /// External test runner subprocess.
    Command,
    /// HTTP probe followed by the echo conformance checks.
    Suite,
}

impl std::str::FromStr for VerifierKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "command" => Ok(Self::Command),
            "suite" => Ok(Self::Suite),
            _ => Err(ConfigError::UnknownVerifier {
                value: s.to_string(),
                valid: VALID_VERIFIERS.join(", "),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for VerifierKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Full workflow configuration, one field per `ECHO_DEPLOY_*` variable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Logical stack name.
    pub stack_name: String,
    /// Directory holding the declared Pulumi program.
    pub work_dir: PathBuf,
    /// Engine executable.
    pub pulumi_bin: String,
    /// Output key carrying the published port.
    pub output_key: String,
    /// Host the deployed port is published on.
    pub host: String,
    pub settle_ms: u64,
    pub max_attempts: u32,
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub verifier: VerifierKind,
    /// Shell command run by the `command` verifier.
    pub verify_command: String,
    /// Environment variable the `command` verifier receives the port in.
    pub port_env: String,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            stack_name: "test".to_string(),
            work_dir: PathBuf::from("stack"),
            pulumi_bin: "pulumi".to_string(),
            output_key: DEFAULT_PORT_OUTPUT.to_string(),
            host: "localhost".to_string(),
            settle_ms: 2000,
            max_attempts: 10,
            interval_ms: 2000,
            timeout_ms: 5000,
            user_agent: "echo-deploy-test-client".to_string(),
            verifier: VerifierKind::Http,
            verify_command: "npx vitest run".to_string(),
            port_env: "CONTAINER_PORT".to_string(),
            quiet: false,
        }
    }
}

impl DeployConfig {
    /// Check invariants that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("stack_name", self.stack_name.as_str()),
            ("pulumi_bin", self.pulumi_bin.as_str()),
            ("output_key", self.output_key.as_str()),
            ("host", self.host.as_str()),
            ("verify_command", self.verify_command.as_str()),
            ("port_env", self.port_env.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptySetting(name));
            }
        }
        self.schedule().map(|_| ())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroAttempts`] when `max_attempts` is zero.
    pub fn schedule(&self) -> Result<RetrySchedule, ConfigError> {
        RetrySchedule::new(self.max_attempts, Duration::from_millis(self.interval_ms))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroAttempts`] when `max_attempts` is zero.
    pub fn probe_options(&self) -> Result<ProbeOptions, ConfigError> {
        Ok(ProbeOptions {
            settle_delay: Duration::from_millis(self.settle_ms),
            schedule: self.schedule()?,
            timeout: Duration::from_millis(self.timeout_ms),
            user_agent: self.user_agent.clone(),
        })
    }
}
