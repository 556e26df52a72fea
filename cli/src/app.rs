//! Application context — the composition root.
//!
//! `AppContext` wires configuration, output, the Pulumi engine, and the
//! selected verification strategy together once, in `Cli::run()`, and is
//! passed by reference to the command handler.

use anyhow::Result;

use crate::application::ports::{ProgressReporter, Verifier, VerifyTarget};
use crate::application::services::verify::{CommandVerifier, EchoSuiteVerifier, HttpVerifier};
use crate::domain::{DeployConfig, VerifierKind};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::http::ReqwestHttpClient;
use crate::infra::pulumi::PulumiEngine;
use crate::output::{OutputContext, TerminalReporter};

/// The verification strategy chosen by `ECHO_DEPLOY_VERIFIER`.
pub enum Verification {
    Http(HttpVerifier<ReqwestHttpClient>),
    Command(CommandVerifier<TokioCommandRunner>),
    Suite(EchoSuiteVerifier<ReqwestHttpClient>),
}

impl Verification {
    /// Build the strategy named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe settings are invalid.
    pub fn from_config(config: &DeployConfig) -> Result<Self> {
        Ok(match config.verifier {
            VerifierKind::Http => Self::Http(HttpVerifier::new(
                ReqwestHttpClient::default(),
                config.host.clone(),
                config.probe_options()?,
            )),
            VerifierKind::Command => Self::Command(CommandVerifier::new(
                TokioCommandRunner::default(),
                config.verify_command.clone(),
                config.port_env.clone(),
            )),
            VerifierKind::Suite => Self::Suite(EchoSuiteVerifier::new(
                ReqwestHttpClient::default(),
                config.host.clone(),
                config.probe_options()?,
            )),
        })
    }
}

impl Verifier for Verification {
    async fn verify(
        &self,
        target: &VerifyTarget,
        reporter: &impl ProgressReporter,
    ) -> Result<bool> {
        match self {
            Self::Http(v) => v.verify(target, reporter).await,
            Self::Command(v) => v.verify(target, reporter).await,
            Self::Suite(v) => v.verify(target, reporter).await,
        }
    }
}

/// Unified application context passed to the command handler.
pub struct AppContext {
    /// Loaded and validated configuration.
    pub config: DeployConfig,
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Pulumi CLI adapter.
    pub engine: PulumiEngine<TokioCommandRunner>,
    /// Selected verification strategy.
    pub verifier: Verification,
}

impl AppContext {
    /// Construct an `AppContext` from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the verifier cannot be built from `config`.
    pub fn new(config: DeployConfig) -> Result<Self> {
        let output = OutputContext::new(config.quiet);
        let engine = PulumiEngine::new(TokioCommandRunner::default(), config.pulumi_bin.clone());
        let verifier = Verification::from_config(&config)?;
        Ok(Self {
            config,
            output,
            engine,
            verifier,
        })
    }

    /// A progress reporter writing to this context's terminal.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }
}
