//! Application service — bounded-retry HTTP probe of a freshly deployed endpoint.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! The prober is stateless: every call produces exactly one `ProbeResult`.

use serde_json::json;

use crate::application::ports::{HttpClient, ProgressReporter};
use crate::domain::{HttpRequest, ProbeOptions, ProbeResult};

const EXPECTED_STATUS: u16 = 200;

/// Probe `url` until it answers `200 OK` or the retry schedule is exhausted.
///
/// Sleeps `opts.settle_delay` before the first attempt. Unexpected statuses
/// and transport errors are soft failures while attempts remain; the fixed
/// interval is slept between attempts.
pub async fn probe(
    client: &impl HttpClient,
    reporter: &impl ProgressReporter,
    url: &str,
    opts: &ProbeOptions,
) -> ProbeResult {
    let max = opts.schedule.max_attempts();
    let interval = opts.schedule.interval();

    reporter.step(&format!("probing {url}..."));
    tokio::time::sleep(opts.settle_delay).await;

    let request = HttpRequest::get(url, opts.timeout).header("User-Agent", &opts.user_agent);
    let mut last_status = None;

    for attempt in 1..=max {
        reporter.step(&format!("attempt {attempt}/{max}..."));
        tracing::debug!(attempt, max, url, "sending probe request");

        match client.send(&request).await {
            Ok(response) if response.status == EXPECTED_STATUS => {
                tracing::info!(attempt, status = response.status, "probe succeeded");
                reporter.success(&format!("server responded with status {}", response.status));
                return ProbeResult {
                    success: true,
                    message: format!("Echo server is working correctly at {url}"),
                    details: Some(json!({
                        "status": response.status,
                        "data": response.body,
                    })),
                };
            }
            Ok(response) => {
                tracing::debug!(attempt, status = response.status, "unexpected probe status");
                reporter.warn(&format!("unexpected status code: {}", response.status));
                last_status = Some(response.status);
            }
            Err(err) if attempt == max => {
                tracing::warn!(attempt, kind = %err.kind, error = %err, "probe attempts exhausted");
                reporter.warn("all attempts failed");
                return ProbeResult {
                    success: false,
                    message: format!("Echo server test failed after {max} attempts"),
                    details: Some(json!({
                        "error": err.message,
                        "code": err.kind.code(),
                    })),
                };
            }
            Err(err) => {
                tracing::debug!(attempt, kind = %err.kind, error = %err, "probe request failed");
                reporter.step("connection failed, waiting before retry...");
                last_status = None;
            }
        }

        if attempt < max {
            tokio::time::sleep(interval).await;
        }
    }

    ProbeResult {
        success: false,
        message: format!("Echo server test failed after {max} attempts"),
        details: last_status.map(|status| json!({ "status": status })),
    }
}
