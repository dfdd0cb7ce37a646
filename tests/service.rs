// tests/service.rs

mod common;
use crate::common::{TestResult, init_tracing, poll_until_terminal};

use std::path::PathBuf;
use std::sync::Arc;

use scriptexec::errors::ScriptexecError;
use scriptexec::executor::{ExecutorOptions, TaskExecutor};
use scriptexec::service::{ScriptService, SubmitRequest};
use scriptexec::task::TaskStatus;
use scriptexec_test_utils::builders::{ConfigFileBuilder, ScriptConfigBuilder};

fn service_in(dir: &std::path::Path) -> ScriptService {
    let cfg = ConfigFileBuilder::new()
        .logs_dir(dir.join("logs"))
        .with_script(
            "sample",
            ScriptConfigBuilder::shell("echo sample \"$@\"").arg("sh").build(),
        )
        .with_script(
            "greet",
            ScriptConfigBuilder::shell("echo hello $1")
                .arg("greet")
                .description("says hello")
                .build(),
        )
        .build();
    ScriptService::from_config(&cfg).expect("service")
}

#[tokio::test]
async fn blank_owner_is_rejected_before_any_task_exists() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    for owner in ["", "   "] {
        let result = service.submit(SubmitRequest::script(owner, "sample"), None);
        assert!(matches!(result, Err(ScriptexecError::Validation(_))));
    }
    assert!(service.tasks().is_empty());

    Ok(())
}

#[tokio::test]
async fn unknown_script_is_rejected() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    match service.submit(SubmitRequest::script("alice", "nope"), None) {
        Err(ScriptexecError::Validation(msg)) => assert!(msg.contains("nope")),
        other => panic!("expected Validation, got {other:?}"),
    }
    assert!(service.tasks().is_empty());

    Ok(())
}

#[tokio::test]
async fn script_and_executable_together_are_rejected() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    let request = SubmitRequest {
        owner: "alice".to_string(),
        script: Some("sample".to_string()),
        executable: Some(PathBuf::from("/bin/sh")),
        args: vec![],
    };
    assert!(matches!(
        service.submit(request, None),
        Err(ScriptexecError::Validation(_))
    ));

    Ok(())
}

#[tokio::test]
async fn missing_executable_is_a_synchronous_launch_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    let request = SubmitRequest::executable("alice", "/no/such/interpreter", vec![]);
    match service.submit(request, None) {
        Err(ScriptexecError::Launch(msg)) => assert!(msg.contains("/no/such/interpreter")),
        other => panic!("expected Launch, got {other:?}"),
    }
    assert!(service.tasks().is_empty());

    Ok(())
}

#[tokio::test]
async fn catalog_args_come_before_request_args() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    let mut request = SubmitRequest::script(" alice ", "greet");
    request.args = vec!["world".to_string()];

    let started = service.submit(request, None)?;
    assert_eq!(started.owner, "alice");
    assert_eq!(started.status, TaskStatus::Running);
    assert_eq!(
        started.command.args,
        vec!["-c", "echo hello $1", "greet", "world"]
    );

    let task = poll_until_terminal(service.executor(), &started.id).await.pop().unwrap();
    assert_eq!(task.status, TaskStatus::Success);
    assert_eq!(task.output, "hello world\n");
    assert_eq!(service.logs(&task.id)?, "hello world\n");

    Ok(())
}

#[tokio::test]
async fn request_without_target_runs_the_sample_script() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    let request = SubmitRequest {
        owner: "alice".to_string(),
        args: vec!["x".to_string()],
        ..SubmitRequest::default()
    };
    let started = service.submit(request, None)?;
    let task = poll_until_terminal(service.executor(), &started.id).await.pop().unwrap();
    assert_eq!(task.output, "sample x\n");

    let scripts: Vec<&str> = service.scripts().map(|(name, _)| name).collect();
    assert_eq!(scripts, vec!["greet", "sample"]);

    Ok(())
}

#[tokio::test]
async fn explicit_executable_runs_directly() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let executor = Arc::new(TaskExecutor::new(ExecutorOptions::new(dir.path().join("logs")))?);
    let service = ScriptService::new(Arc::clone(&executor), Default::default());

    let request = SubmitRequest::executable(
        "alice",
        "/bin/sh",
        vec!["-c".to_string(), "echo direct".to_string()],
    );
    let started = service.submit(request, None)?;
    let task = poll_until_terminal(&executor, &started.id).await.pop().unwrap();
    assert_eq!(task.output, "direct\n");
    assert_eq!(service.task(&task.id)?, task);

    Ok(())
}

#[tokio::test]
async fn lookups_of_unknown_ids_are_not_found() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    assert!(matches!(service.task("ghost"), Err(ScriptexecError::TaskNotFound(_))));
    assert!(matches!(service.logs("ghost"), Err(ScriptexecError::TaskNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn bare_executable_names_are_found_on_path() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    let request = SubmitRequest::executable("alice", "echo", vec!["hi".to_string()]);
    let started = service.submit(request, None)?;
    let task = poll_until_terminal(service.executor(), &started.id).await.pop().unwrap();
    assert_eq!(task.status, TaskStatus::Success);
    assert_eq!(task.output, "hi\n");

    let unknown = SubmitRequest::executable("alice", "scriptexec-no-such-command", vec![]);
    assert!(matches!(
        service.submit(unknown, None),
        Err(ScriptexecError::Launch(_))
    ));

    Ok(())
}

#[tokio::test]
async fn directory_is_not_an_executable() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    let request = SubmitRequest::executable("alice", dir.path(), vec![]);
    assert!(matches!(
        service.submit(request, None),
        Err(ScriptexecError::Launch(_))
    ));
    assert!(service.tasks().is_empty());

    Ok(())
}

#[tokio::test]
async fn batch_with_one_bad_request_starts_nothing() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    let requests = vec![
        SubmitRequest::script("alice", "greet"),
        SubmitRequest::script("alice", "nope"),
    ];
    assert!(matches!(
        service.submit_all(requests, None),
        Err(ScriptexecError::Validation(_))
    ));
    assert!(service.tasks().is_empty());
    assert!(service.validate(&SubmitRequest::script("alice", "greet")).is_ok());

    Ok(())
}

#[tokio::test]
async fn batch_submission_starts_every_request() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = service_in(dir.path());

    let started = service.submit_all(
        vec![
            SubmitRequest::script("alice", "greet"),
            SubmitRequest::script("bob", "sample"),
        ],
        None,
    )?;
    assert_eq!(started.len(), 2);

    for task in &started {
        let done = poll_until_terminal(service.executor(), &task.id).await.pop().unwrap();
        assert_eq!(done.status, TaskStatus::Success);
    }
    let owners: Vec<String> = service.tasks().into_iter().map(|t| t.owner).collect();
    assert_eq!(owners, vec!["alice", "bob"]);

    Ok(())
}
