//! Unit tests for `PulumiEngine`: CLI argument construction and failure mapping.
//!
//! A `FakeRunner` stands in for the `pulumi` binary, so these tests check the
//! exact argument lists the engine builds without spawning anything.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use anyhow::Result;
use futures_util::StreamExt as _;
use tempfile::TempDir;

use echo_deploy::application::ports::ProvisioningEngine;
use echo_deploy::domain::{CommandError, EngineError, StackHandle};
use echo_deploy::infra::pulumi::PulumiEngine;

use crate::helpers::{err_output, ok_output};
use crate::mocks::FakeRunner;

/// A working directory holding a minimal project file.
fn project_dir() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("Pulumi.yaml"),
        "name: echo\nruntime: yaml\n",
    )
    .expect("write project");
    dir
}

fn handle(dir: &Path) -> StackHandle {
    StackHandle {
        name: "test".to_string(),
        work_dir: dir.to_path_buf(),
    }
}

fn dir_arg(dir: &Path) -> String {
    dir.to_str().expect("utf-8 path").to_string()
}

fn engine_error(err: &anyhow::Error) -> &EngineError {
    err.chain()
        .find_map(|c| c.downcast_ref::<EngineError>())
        .expect("engine error in chain")
}

// ── select_or_create ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_select_or_create_builds_select_args() {
    let dir = project_dir();
    let runner = FakeRunner::default().with_output(ok_output(b""));
    let engine = PulumiEngine::new(runner.clone(), "pulumi");

    let stack = engine
        .select_or_create("test", dir.path())
        .await
        .expect("select");

    assert_eq!(stack, handle(dir.path()));
    let dir = dir_arg(dir.path());
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "pulumi");
    assert_eq!(
        calls[0].1,
        [
            "stack",
            "select",
            "test",
            "--create",
            "--non-interactive",
            "--cwd",
            dir.as_str(),
        ]
    );
}

#[tokio::test]
async fn test_select_twice_yields_equal_handles() {
    let dir = project_dir();
    let runner = FakeRunner::default()
        .with_output(ok_output(b""))
        .with_output(ok_output(b""));
    let engine = PulumiEngine::new(runner, "pulumi");

    let first = engine.select_or_create("test", dir.path()).await.expect("first");
    let second = engine.select_or_create("test", dir.path()).await.expect("second");

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_select_without_project_file_never_invokes_pulumi() {
    let dir = TempDir::new().expect("tempdir");
    let runner = FakeRunner::default();
    let engine = PulumiEngine::new(runner.clone(), "pulumi");

    let err = engine
        .select_or_create("test", dir.path())
        .await
        .expect_err("no project");

    assert!(matches!(engine_error(&err), EngineError::MissingProject(_)));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_select_failure_keeps_pulumi_stderr() {
    let dir = project_dir();
    let runner = FakeRunner::default()
        .with_output(err_output(255, b"error: no Pulumi.yaml project file found"));
    let engine = PulumiEngine::new(runner, "pulumi");

    let err = engine
        .select_or_create("test", dir.path())
        .await
        .expect_err("select failure");

    let engine_err = engine_error(&err);
    assert!(matches!(
        engine_err,
        EngineError::OperationFailed { operation: "stack select", code: Some(255), .. }
    ));
    assert_eq!(
        engine_err.stderr(),
        Some("error: no Pulumi.yaml project file found")
    );
}

#[tokio::test]
async fn test_custom_program_is_invoked() {
    let dir = project_dir();
    let runner = FakeRunner::default().with_output(ok_output(b""));
    let engine = PulumiEngine::new(runner.clone(), "/opt/pulumi/bin/pulumi");

    engine.select_or_create("dev", dir.path()).await.expect("select");

    assert_eq!(runner.calls()[0].0, "/opt/pulumi/bin/pulumi");
}

// ── refresh / up ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_and_up_stream_with_stack_and_cwd() {
    let dir = project_dir();
    let runner = FakeRunner::default()
        .with_lines(vec![Ok("Refreshing (test):".to_string())])
        .with_lines(vec![Ok("Updating (test):".to_string()), Ok("  + 2 created".to_string())]);
    let engine = PulumiEngine::new(runner.clone(), "pulumi");
    let stack = handle(dir.path());

    let refreshed: Vec<String> = engine
        .refresh(&stack)
        .expect("refresh")
        .map(|l| l.expect("line"))
        .collect()
        .await;
    let updated: Vec<String> = engine
        .up(&stack)
        .expect("up")
        .map(|l| l.expect("line"))
        .collect()
        .await;

    assert_eq!(refreshed, ["Refreshing (test):"]);
    assert_eq!(updated, ["Updating (test):", "  + 2 created"]);

    let dir = dir_arg(dir.path());
    let calls = runner.calls();
    assert_eq!(
        calls[0].1,
        [
            "refresh",
            "--yes",
            "--skip-preview",
            "--non-interactive",
            "--stack",
            "test",
            "--cwd",
            dir.as_str(),
        ]
    );
    assert_eq!(
        calls[1].1,
        [
            "up",
            "--yes",
            "--skip-preview",
            "--non-interactive",
            "--stack",
            "test",
            "--cwd",
            dir.as_str(),
        ]
    );
}

#[tokio::test]
async fn test_up_process_failure_becomes_engine_failure() {
    let dir = project_dir();
    let failure: Result<String> = Err(CommandError {
        program: "pulumi".to_string(),
        code: Some(255),
        stderr: "error: update failed".to_string(),
    }
    .into());
    let runner = FakeRunner::default().with_lines(vec![Ok("Updating (test):".to_string()), failure]);
    let engine = PulumiEngine::new(runner, "pulumi");

    let items: Vec<Result<String>> = engine
        .up(&handle(dir.path()))
        .expect("up")
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().expect("line"), "Updating (test):");
    let err = items[1].as_ref().expect_err("failure");
    let engine_err = engine_error(err);
    assert!(matches!(
        engine_err,
        EngineError::OperationFailed { operation: "up", code: Some(255), .. }
    ));
    assert_eq!(engine_err.stderr(), Some("error: update failed"));
}

// ── update_summary / outputs ─────────────────────────────────────────────────

#[tokio::test]
async fn test_update_summary_reads_newest_history_entry() {
    let dir = project_dir();
    let history = br#"[
        {"kind": "update", "result": "succeeded", "resourceChanges": {"create": 3, "same": 1}},
        {"kind": "refresh", "result": "succeeded", "resourceChanges": {"same": 4}}
    ]"#;
    let runner = FakeRunner::default().with_output(ok_output(history));
    let engine = PulumiEngine::new(runner.clone(), "pulumi");

    let summary = engine
        .update_summary(&handle(dir.path()))
        .await
        .expect("summary");

    assert_eq!(summary.kind, "update");
    assert_eq!(summary.resource_changes.create, 3);
    assert_eq!(summary.resource_changes.update, 0);
    assert_eq!(summary.resource_changes.delete, 0);
    let args = &runner.calls()[0].1;
    assert_eq!(&args[..3], ["stack", "history", "--json"]);
    assert!(args.iter().any(|a| a == "--stack"));
}

#[tokio::test]
async fn test_outputs_are_parsed_from_json() {
    let dir = project_dir();
    let runner = FakeRunner::default().with_output(ok_output(
        br#"{"containerName": "echo-server", "containerPort": 8080}"#,
    ));
    let engine = PulumiEngine::new(runner.clone(), "pulumi");

    let outputs = engine.outputs(&handle(dir.path())).await.expect("outputs");

    assert_eq!(outputs.required_port("containerPort").expect("port"), 8080);
    let args = &runner.calls()[0].1;
    assert_eq!(&args[..3], ["stack", "output", "--json"]);
}

#[tokio::test]
async fn test_malformed_outputs_are_reported() {
    let dir = project_dir();
    let runner = FakeRunner::default().with_output(ok_output(b"not json"));
    let engine = PulumiEngine::new(runner, "pulumi");

    let err = engine
        .outputs(&handle(dir.path()))
        .await
        .expect_err("malformed");

    assert!(matches!(
        engine_error(&err),
        EngineError::MalformedOutput { operation: "stack output", .. }
    ));
}

#[tokio::test]
async fn test_relative_work_dir_is_passed_through() {
    let runner = FakeRunner::default().with_output(ok_output(b"{}"));
    let engine = PulumiEngine::new(runner.clone(), "pulumi");
    let stack = StackHandle {
        name: "test".to_string(),
        work_dir: PathBuf::from("stack"),
    };

    let outputs = engine.outputs(&stack).await.expect("outputs");

    assert!(outputs.is_empty());
    assert!(runner.calls()[0].1.ends_with(&["--cwd".to_string(), "stack".to_string()]));
}
