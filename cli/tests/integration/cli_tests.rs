//! Integration tests for the echo-deploy CLI surface.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn echo_deploy() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("echo-deploy"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_help_flag_shows_help() {
    echo_deploy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("ECHO_DEPLOY_"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    echo_deploy()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("echo-deploy 0.1.0"));
}

#[test]
fn test_cli_rejects_positional_arguments() {
    echo_deploy()
        .arg("deploy")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn test_invalid_config_fails_before_any_engine_call() {
    echo_deploy()
        .env("ECHO_DEPLOY_MAX_ATTEMPTS", "0")
        .env("ECHO_DEPLOY_PULUMI_BIN", "/nonexistent/pulumi")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_attempts"));
}

#[test]
fn test_unknown_verifier_is_rejected() {
    echo_deploy()
        .env("ECHO_DEPLOY_VERIFIER", "grpc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown verifier"));
}
