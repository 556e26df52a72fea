//! Application service — run the echo conformance checks against a live server.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use crate::application::ports::{HttpClient, ProgressReporter};
use crate::domain::echo::{CheckOutcome, EchoCheck};

/// Run every [`EchoCheck`] in order, one request each, reporting as it goes.
///
/// Checks never short-circuit: a failing check is recorded and the next one runs.
pub async fn run_echo_suite(
    client: &impl HttpClient,
    reporter: &impl ProgressReporter,
    base_url: &str,
    timeout: Duration,
) -> Vec<CheckOutcome> {
    let mut outcomes = Vec::with_capacity(EchoCheck::ALL.len());
    for check in EchoCheck::ALL {
        let request = check.request(base_url, timeout);
        let outcome = match client.send(&request).await {
            Ok(response) => match check.evaluate(&response) {
                Ok(()) => CheckOutcome::pass(check),
                Err(reason) => CheckOutcome::fail(check, reason),
            },
            Err(err) => CheckOutcome::fail(check, format!("request failed ({}): {err}", err.kind)),
        };

        if outcome.passed {
            reporter.success(outcome.name);
        } else {
            let detail = outcome.detail.as_deref().unwrap_or_default();
            reporter.warn(&format!("{}: {detail}", outcome.name));
        }
        tracing::debug!(check = outcome.name, passed = outcome.passed, "echo check finished");
        outcomes.push(outcome);
    }
    outcomes
}
