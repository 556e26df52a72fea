//! CLI entry point parsing with clap derive.
//!
//! The workflow takes no arguments: every setting comes from `ECHO_DEPLOY_*`
//! environment variables. clap still provides `--help` and `--version`.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::app::AppContext;
use crate::commands;
use crate::infra::config;

/// Deploy an echo server stack with Pulumi and verify it answers over HTTP.
///
/// Settings are read from ECHO_DEPLOY_* environment variables
/// (ECHO_DEPLOY_STACK_NAME, ECHO_DEPLOY_WORK_DIR, ECHO_DEPLOY_VERIFIER, ...).
/// Set RUST_LOG for diagnostic logging.
#[derive(Parser)]
#[command(name = "echo-deploy", version)]
pub struct Cli {}

impl Cli {
    /// Load configuration, build the application context, and run the workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the workflow fails.
    pub async fn run(self) -> Result<ExitCode> {
        let config = config::load()?;
        let app = AppContext::new(config)?;
        match commands::deploy::run(&app).await {
            Ok(code) => Ok(code),
            Err(e) => {
                commands::deploy::report_failure(&app.output, &e);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
