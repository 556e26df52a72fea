//! Application service — deploy the stack, then verify the deployed port.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits. Every step completes
//! before the next begins; no step is retried here.

use std::path::Path;

use anyhow::{Context, Result};
use futures_util::StreamExt as _;

use crate::application::ports::{
    OutputLines, ProgressReporter, ProvisioningEngine, Verifier, VerifyTarget,
};
use crate::domain::stack::display_value;
use crate::domain::{OutputSet, StackHandle, UpdateSummary};

pub struct DeployOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    pub stack_name: &'a str,
    pub work_dir: &'a Path,
    /// Output key holding the externally reachable port.
    pub output_key: &'a str,
}

/// Outcome of the `deploy_and_verify` use-case.
#[derive(Debug)]
pub struct DeployOutcome {
    pub stack: StackHandle,
    pub summary: UpdateSummary,
    pub outputs: OutputSet,
    pub target: VerifyTarget,
    /// Verdict of the verification strategy.
    pub verified: bool,
}

/// Bring the stack up and verify it.
///
/// # Errors
///
/// Returns an error if any engine step fails, if the required output is
/// missing or malformed, or if the verifier cannot run. A verifier that runs
/// and reports failure is not an error: see [`DeployOutcome::verified`].
pub async fn deploy_and_verify(
    engine: &impl ProvisioningEngine,
    verifier: &impl Verifier,
    opts: DeployOptions<'_, impl ProgressReporter>,
) -> Result<DeployOutcome> {
    let DeployOptions {
        reporter,
        stack_name,
        work_dir,
        output_key,
    } = opts;

    // Step 1: Select or create the stack.
    reporter.step(&format!("setting up stack: {stack_name}"));
    let stack = engine
        .select_or_create(stack_name, work_dir)
        .await
        .with_context(|| format!("selecting stack '{stack_name}'"))?;
    reporter.success(&format!(
        "stack '{}' selected (working directory: {})",
        stack.name,
        stack.work_dir.display()
    ));

    // Step 2: Refresh.
    reporter.step("refreshing stack...");
    let lines = engine.refresh(&stack).context("starting refresh")?;
    forward_lines(lines, reporter)
        .await
        .context("refreshing stack")?;
    reporter.success("stack refreshed");

    // Step 3: Apply.
    reporter.step("running pulumi up...");
    let lines = engine.up(&stack).context("starting update")?;
    forward_lines(lines, reporter)
        .await
        .context("updating stack")?;
    reporter.success("pulumi up completed");

    // Step 4: Summarize changes. Informational only.
    let summary = match engine.update_summary(&stack).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "update summary unavailable");
            reporter.warn(&format!("could not read update summary: {e:#}"));
            UpdateSummary::default()
        }
    };
    report_summary(&summary, reporter);

    // Step 5: Read outputs and extract the required port.
    let outputs = engine.outputs(&stack).await.context("reading stack outputs")?;
    report_outputs(&outputs, reporter);
    let port = outputs.required_port(output_key)?;
    let target = VerifyTarget { port };

    // Step 6: Verify.
    reporter.step(&format!("verifying deployment on port {port}..."));
    let verified = verifier
        .verify(&target, reporter)
        .await
        .context("running verification")?;
    tracing::info!(port, verified, "verification finished");

    Ok(DeployOutcome {
        stack,
        summary,
        outputs,
        target,
        verified,
    })
}

/// Drain an engine output stream, forwarding each line as it arrives.
async fn forward_lines(mut lines: OutputLines, reporter: &impl ProgressReporter) -> Result<()> {
    while let Some(line) = lines.next().await {
        reporter.passthrough(&line?);
    }
    Ok(())
}

fn report_summary(summary: &UpdateSummary, reporter: &impl ProgressReporter) {
    let changes = summary.resource_changes;
    tracing::info!(
        create = changes.create,
        update = changes.update,
        delete = changes.delete,
        same = changes.same,
        "update summary"
    );
    reporter.step("summary:");
    reporter.passthrough(&format!("  - Resources created: {}", changes.create));
    reporter.passthrough(&format!("  - Resources updated: {}", changes.update));
    reporter.passthrough(&format!("  - Resources deleted: {}", changes.delete));
}

fn report_outputs(outputs: &OutputSet, reporter: &impl ProgressReporter) {
    reporter.step("stack outputs:");
    if outputs.is_empty() {
        reporter.passthrough("  (none)");
    }
    for (key, value) in outputs.iter() {
        reporter.passthrough(&format!("  - {key}: {}", display_value(value)));
    }
}
