use collab_chat_server::errors::execution_error::ExecutionError;
use collab_chat_server::executor::CodeExecutor;
use collab_chat_server::executor::languages::Language;
use std::path::Path;
use std::time::{Duration, Instant};

fn shell_executor(work_root: &Path) -> CodeExecutor {
    CodeExecutor::new(vec![
        Language::interpreted("sh", "sh", "#", &["sh", "{source}"], Duration::from_secs(1)),
        Language::compiled(
            "checked-sh",
            "sh",
            "#",
            &["sh", "-n", "{source}"],
            &["sh", "{source}"],
            Duration::from_secs(1),
        ),
    ])
    .with_work_dir(work_root)
}

fn is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

fn has_command(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("--version")
        .output()
        .is_ok()
}

#[tokio::test]
async fn captures_output_and_input() {
    let work_root = tempfile::tempdir().unwrap();
    let executor = shell_executor(work_root.path());

    let result = executor
        .execute("read name\necho \"hello $name\"\necho oops >&2\nexit 3\n", "sh", "bob\n")
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.stdout, "hello bob\n");
    assert_eq!(result.stderr, "oops\n");
    assert_eq!(result.exit_status, Some(3));
    assert!(is_empty(work_root.path()));
}

#[tokio::test]
async fn timeout_kills_the_program_and_cleans_up() {
    let work_root = tempfile::tempdir().unwrap();
    let executor = shell_executor(work_root.path());

    let started = Instant::now();
    let result = executor.execute("sleep 30 &\nsleep 30\n", "sh", "").await;

    assert!(matches!(result, Err(ExecutionError::Timeout(_))));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(is_empty(work_root.path()));

    let result = executor.run("sleep 30\n", "sh", "").await;
    assert!(!result.success);
    assert_eq!(result.stderr, "Execution timed out");
}

#[tokio::test]
async fn compile_failure_short_circuits() {
    let work_root = tempfile::tempdir().unwrap();
    let executor = shell_executor(work_root.path());

    match executor.execute("if then fi (\n", "checked-sh", "").await {
        Err(ExecutionError::CompileFailed { stderr, .. }) => assert!(!stderr.is_empty()),
        other => panic!("expected a compile failure, got {other:?}"),
    }
    assert!(is_empty(work_root.path()));

    let result = executor
        .execute("echo compiled\n", "checked-sh", "")
        .await
        .unwrap();
    assert_eq!(result.stdout, "compiled\n");
}

#[tokio::test]
async fn unsupported_language() {
    let work_root = tempfile::tempdir().unwrap();
    let executor = shell_executor(work_root.path());

    assert!(matches!(
        executor.execute("x", "cobol", "").await,
        Err(ExecutionError::UnsupportedLanguage(language)) if language == "cobol"
    ));
    assert!(is_empty(work_root.path()));
}

#[tokio::test]
async fn python_prints() {
    if !has_command("python3") {
        eprintln!("python3 not installed, skipping");
        return;
    }

    let work_root = tempfile::tempdir().unwrap();
    let executor = CodeExecutor::default().with_work_dir(work_root.path());

    let result = executor.execute("print(1+1)", "python", "").await.unwrap();
    assert!(result.success);
    assert_eq!(result.stdout, "2\n");
    assert!(is_empty(work_root.path()));
}
