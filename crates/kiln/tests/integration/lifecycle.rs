use kiln::{Classification, EngineError, ExecutionRequest};

use super::{test_engine, workspace_count};

#[tokio::test]
#[ignore = "requires docker"]
async fn test_workspace_removed_after_success() {
    let engine = test_engine("life-ok");
    let request = ExecutionRequest::new("python", "print('done')");

    let result = engine.execute(&request).await.expect("execution failed");
    assert!(result.succeeded());
    assert_eq!(workspace_count(&engine), 0, "workspace leaked");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_workspace_removed_after_runtime_error() {
    let engine = test_engine("life-err");
    let request = ExecutionRequest::new("python", "import sys; sys.exit(3)");

    let result = engine.execute(&request).await.expect("execution failed");
    assert_eq!(result.classification, Classification::RuntimeError);
    assert_eq!(workspace_count(&engine), 0, "workspace leaked");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_workspace_removed_after_timeout() {
    let engine = test_engine("life-timeout");
    let request = ExecutionRequest::new("python", "while True: pass");

    let result = engine.execute(&request).await.expect("execution failed");
    assert_eq!(result.classification, Classification::Timeout);
    assert_eq!(workspace_count(&engine), 0, "workspace leaked");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_workspace_removed_after_compile_failure() {
    let engine = test_engine("life-compile");
    let request = ExecutionRequest::new("cpp", "int main() { broken }");

    let result = engine.execute(&request).await.expect("execution failed");
    assert_eq!(result.classification, Classification::RuntimeError);
    assert_eq!(workspace_count(&engine), 0, "workspace leaked");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_unsupported_language_stages_nothing() {
    let engine = test_engine("life-unsupported");
    let request = ExecutionRequest::new("ruby", "puts 1");

    let result = engine.execute(&request).await;
    assert!(matches!(result, Err(EngineError::UnsupportedLanguage(_))));
    assert_eq!(workspace_count(&engine), 0);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_repeated_submissions_do_not_collide() {
    let engine = test_engine("life-repeat");
    let request = ExecutionRequest::new("python", "print(input())").with_stdin("same\n");

    // Identical submissions get independent workspaces; no file collision
    let first = engine.execute(&request).await.expect("first run failed");
    let second = engine.execute(&request).await.expect("second run failed");

    assert!(first.succeeded(), "stderr: {}", first.stderr);
    assert!(second.succeeded(), "stderr: {}", second.stderr);
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(workspace_count(&engine), 0);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_concurrent_submissions_do_not_collide() {
    let engine = test_engine("life-concurrent");
    let request = ExecutionRequest::new("python", "print('concurrent')");

    let (a, b, c) = tokio::join!(
        engine.execute(&request),
        engine.execute(&request),
        engine.execute(&request),
    );

    for result in [a, b, c] {
        let result = result.expect("execution failed");
        assert!(result.succeeded(), "stderr: {}", result.stderr);
    }
    assert_eq!(workspace_count(&engine), 0);
}
