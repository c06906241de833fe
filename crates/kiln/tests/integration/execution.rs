use kiln::{Classification, ExecutionRequest};

use super::test_engine;

#[tokio::test]
#[ignore = "requires docker"]
async fn test_python_hello_world() {
    let engine = test_engine("exec-python");
    let request = ExecutionRequest::new("python", "print('Hello, World!')");

    let result = engine.execute(&request).await.expect("execution failed");

    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("Hello, World!"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_javascript_hello_world() {
    let engine = test_engine("exec-js");
    let request = ExecutionRequest::new("javascript", "console.log('Hello, World!');");

    let result = engine.execute(&request).await.expect("execution failed");

    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("Hello, World!"));
}

#[tokio::test]
#[ignore = "requires docker and the kiln-typescript image"]
async fn test_typescript_hello_world() {
    let engine = test_engine("exec-ts");
    let request = ExecutionRequest::new(
        "typescript",
        "const greeting: string = 'Hello, World!';\nconsole.log(greeting);",
    );

    let result = engine.execute(&request).await.expect("execution failed");

    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("Hello, World!"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_c_hello_world() {
    let engine = test_engine("exec-c");
    let request = ExecutionRequest::new(
        "c",
        "#include <stdio.h>\nint main(void) { printf(\"Hello, World!\\n\"); return 0; }",
    );

    let result = engine.execute(&request).await.expect("execution failed");

    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("Hello, World!"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_cpp_hello_world() {
    let engine = test_engine("exec-cpp");
    let request = ExecutionRequest::new(
        "cpp",
        "#include <iostream>\nint main() { std::cout << \"Hello, World!\\n\"; }",
    );

    let result = engine.execute(&request).await.expect("execution failed");

    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("Hello, World!"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_java_public_class_is_staged_and_run() {
    let engine = test_engine("exec-java");
    let request = ExecutionRequest::new(
        "java",
        "public class Solver { public static void main(String[] a) { System.out.println(\"ok\"); } }",
    );

    let result = engine.execute(&request).await.expect("execution failed");

    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("ok"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_stdin_is_wired_through() {
    let engine = test_engine("exec-stdin");
    let request = ExecutionRequest::new("python", "print(input())").with_stdin("5\n");

    let result = engine.execute(&request).await.expect("execution failed");

    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert_eq!(result.stdout, "5\n");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_runtime_error_surfaces_stderr() {
    let engine = test_engine("exec-raise");
    let request = ExecutionRequest::new("python", "raise RuntimeError('boom')");

    let result = engine.execute(&request).await.expect("execution failed");

    assert_eq!(result.classification, Classification::RuntimeError);
    assert!(result.stderr.contains("boom"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_infinite_loop_times_out() {
    let engine = test_engine("exec-loop");
    let request = ExecutionRequest::new("python", "while True: pass");

    let started = std::time::Instant::now();
    let result = engine.execute(&request).await.expect("execution failed");
    let elapsed = started.elapsed();

    assert_eq!(result.classification, Classification::Timeout);
    assert_eq!(result.stderr, "Execution timed out after 10 seconds");
    // Killed at the budget, not abandoned
    assert!(elapsed.as_secs() >= 9, "returned too early: {elapsed:?}");
    assert!(elapsed.as_secs() <= 13, "returned too late: {elapsed:?}");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_network_is_disabled() {
    let engine = test_engine("exec-net");
    let request = ExecutionRequest::new(
        "python",
        "import urllib.request\nurllib.request.urlopen('http://example.com', timeout=3)",
    );

    let result = engine.execute(&request).await.expect("execution failed");

    // The fetch must fail: there is no network inside the sandbox
    assert_eq!(result.classification, Classification::RuntimeError);
}
