//! Unit tests for the three verification strategies.

#![allow(clippy::expect_used)]

use std::time::Duration;

use echo_deploy::application::ports::{Verifier, VerifyTarget};
use echo_deploy::application::services::verify::{
    CommandVerifier, EchoSuiteVerifier, HttpVerifier,
};
use echo_deploy::domain::{ProbeOptions, RetrySchedule};

use crate::mocks::{FakeRunner, RecordingReporter, Reply, ScriptedClient};

const TARGET: VerifyTarget = VerifyTarget { port: 8080 };

fn fast_options(max_attempts: u32) -> ProbeOptions {
    ProbeOptions {
        settle_delay: Duration::from_millis(100),
        schedule: RetrySchedule::new(max_attempts, Duration::from_millis(50)).expect("schedule"),
        ..ProbeOptions::default()
    }
}

// ── Command verifier ─────────────────────────────────────────────────────────

#[cfg(unix)]
#[tokio::test]
async fn test_command_verifier_passes_port_through_child_env() {
    let runner = FakeRunner::default();
    let verifier = CommandVerifier::new(runner.clone(), "npx vitest run", "CONTAINER_PORT");
    let reporter = RecordingReporter::default();

    let passed = verifier.verify(&TARGET, &reporter).await.expect("verify");

    assert!(passed);
    let (program, args) = runner.calls().remove(0);
    assert_eq!(program, "sh");
    assert_eq!(args, ["-c", "npx vitest run"]);
    assert!(reporter.saw("all tests passed"));
}

#[tokio::test]
async fn test_command_verifier_injects_configured_env_name() {
    let runner = FakeRunner::default();
    let verifier = CommandVerifier::new(runner.clone(), "run-tests", "ECHO_PORT");
    let reporter = RecordingReporter::default();

    verifier.verify(&TARGET, &reporter).await.expect("verify");

    assert_eq!(
        runner.envs(),
        [vec![("ECHO_PORT".to_string(), "8080".to_string())]]
    );
}

#[tokio::test]
async fn test_command_verifier_nonzero_exit_is_a_failed_verification() {
    let runner = FakeRunner::default().with_status(2);
    let verifier = CommandVerifier::new(runner, "exit 2", "CONTAINER_PORT");
    let reporter = RecordingReporter::default();

    let passed = verifier.verify(&TARGET, &reporter).await.expect("verify");

    assert!(!passed);
    assert!(reporter.saw("TEST FAILED"));
    assert!(reporter.saw("exit code 2"));
}

#[tokio::test]
async fn test_command_verifier_leaves_parent_env_untouched() {
    let before = std::env::var_os("ECHO_DEPLOY_UNIT_PORT_PROBE");
    let verifier = CommandVerifier::new(FakeRunner::default(), "true", "ECHO_DEPLOY_UNIT_PORT_PROBE");
    let reporter = RecordingReporter::default();

    verifier.verify(&TARGET, &reporter).await.expect("verify");

    assert_eq!(std::env::var_os("ECHO_DEPLOY_UNIT_PORT_PROBE"), before);
}

// ── HTTP verifier ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_http_verifier_passes_on_first_200() {
    let verifier = HttpVerifier::new(ScriptedClient::healthy(), "localhost", fast_options(3));
    let reporter = RecordingReporter::default();

    let passed = verifier.verify(&TARGET, &reporter).await.expect("verify");

    assert!(passed);
    assert!(reporter.saw("Echo server is working correctly at http://localhost:8080"));
}

#[tokio::test(start_paused = true)]
async fn test_http_verifier_fails_when_target_never_answers() {
    let verifier = HttpVerifier::new(ScriptedClient::unreachable(), "localhost", fast_options(3));
    let reporter = RecordingReporter::default();

    let passed = verifier.verify(&TARGET, &reporter).await.expect("verify");

    assert!(!passed);
    assert!(reporter.saw("TEST FAILED: Echo server test failed after 3 attempts"));
    assert!(reporter.saw("\"code\": \"connect\""));
}

#[tokio::test(start_paused = true)]
async fn test_http_verifier_recovers_after_transient_failures() {
    let client = ScriptedClient::new(
        [Reply::Refused, Reply::Status(502), Reply::TimedOut],
        Reply::Status(200),
    );
    let verifier = HttpVerifier::new(client, "127.0.0.1", fast_options(5));
    let reporter = RecordingReporter::default();

    assert!(verifier.verify(&TARGET, &reporter).await.expect("verify"));
    assert!(reporter.saw("unexpected status code: 502"));
}

// ── Echo suite verifier ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_suite_verifier_passes_against_echo_server() {
    let verifier = EchoSuiteVerifier::new(ScriptedClient::healthy(), "localhost", fast_options(3));
    let reporter = RecordingReporter::default();

    let passed = verifier.verify(&TARGET, &reporter).await.expect("verify");

    assert!(passed);
    assert!(reporter.saw("all 6 echo checks passed"));
}

#[tokio::test(start_paused = true)]
async fn test_suite_verifier_skips_checks_when_probe_fails() {
    let verifier =
        EchoSuiteVerifier::new(ScriptedClient::unreachable(), "localhost", fast_options(2));
    let reporter = RecordingReporter::default();

    let passed = verifier.verify(&TARGET, &reporter).await.expect("verify");

    assert!(!passed);
    assert!(!reporter.saw("running echo conformance checks"));
}

#[tokio::test(start_paused = true)]
async fn test_suite_verifier_counts_failing_checks() {
    // Probe succeeds, then every check sees a server error.
    let client = ScriptedClient::new([Reply::Status(200)], Reply::Status(500));
    let verifier = EchoSuiteVerifier::new(client, "localhost", fast_options(2));
    let reporter = RecordingReporter::default();

    let passed = verifier.verify(&TARGET, &reporter).await.expect("verify");

    assert!(!passed);
    assert!(reporter.saw("TEST FAILED: 6 of 6 echo checks failed"));
}
