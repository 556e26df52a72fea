//! `echo-deploy` — deploy the echo stack and verify it answers.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::deploy_verify::{self as service, DeployOptions};
use crate::domain::EngineError;
use crate::output::OutputContext;

/// Run the deploy-and-verify workflow.
///
/// Returns `ExitCode::SUCCESS` only when the stack deployed and verification
/// passed; a failed verification is `ExitCode::FAILURE`, not an error.
///
/// # Errors
///
/// Returns an error if any engine step fails or the required output is missing.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let ctx = &app.output;
    let reporter = app.terminal_reporter();
    ctx.header("Deploying echo server stack");

    let outcome = service::deploy_and_verify(
        &app.engine,
        &app.verifier,
        DeployOptions {
            reporter: &reporter,
            stack_name: &app.config.stack_name,
            work_dir: &app.config.work_dir,
            output_key: &app.config.output_key,
        },
    )
    .await?;

    if outcome.verified {
        ctx.success("Deployment and testing completed successfully!");
        ctx.kv("Stack", &outcome.stack.name);
        ctx.kv("Port", &outcome.target.port.to_string());
        Ok(ExitCode::SUCCESS)
    } else {
        ctx.error(&format!(
            "Verification failed for stack '{}' on port {}",
            outcome.stack.name, outcome.target.port
        ));
        Ok(ExitCode::FAILURE)
    }
}

/// Report a workflow error with every diagnostic available.
///
/// Prints the message, the cause chain, the backtrace when one was captured,
/// and the engine's stderr when the error carries it.
pub fn report_failure(ctx: &OutputContext, err: &anyhow::Error) {
    tracing::debug!(error = %format!("{err:#}"), "deploy-and-verify failed");
    ctx.error("ERROR during deployment or testing:");
    ctx.error(&err.to_string());

    let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
    if !causes.is_empty() {
        ctx.diagnostic("Caused by:", &causes.join("\n"));
    }

    let backtrace = err.backtrace();
    if matches!(
        backtrace.status(),
        std::backtrace::BacktraceStatus::Captured
    ) {
        ctx.diagnostic("Stack trace:", &backtrace.to_string());
    }

    if let Some(stderr) = engine_stderr(err) {
        ctx.diagnostic("Pulumi stderr:", stderr);
    }
}

/// The engine's diagnostic stream carried anywhere in the error chain.
#[must_use]
pub fn engine_stderr(err: &anyhow::Error) -> Option<&str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<EngineError>())
        .and_then(EngineError::stderr)
}
