use kiln::{Classification, ExecutionRequest};

use super::test_engine;

#[tokio::test]
#[ignore = "requires docker"]
async fn test_cpp_syntax_error_surfaces_diagnostic() {
    let engine = test_engine("compile-error");
    let request = ExecutionRequest::new("cpp", "int main() { this does not compile }");

    let result = engine.execute(&request).await.expect("execution failed");

    assert_eq!(result.classification, Classification::RuntimeError);
    // The compiler diagnostic, not an empty string
    assert!(!result.stderr.is_empty());
    assert!(result.stderr.contains("error"), "stderr: {}", result.stderr);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_compile_failure_skips_run() {
    let engine = test_engine("compile-skip");
    // Would print if it ever ran; the compile error must short-circuit
    let request = ExecutionRequest::new(
        "c",
        "#include <stdio.h>\nint main(void) { printf(\"ran\"); return 0 }",
    );

    let result = engine.execute(&request).await.expect("execution failed");

    assert_eq!(result.classification, Classification::RuntimeError);
    assert!(!result.stdout.contains("ran"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_java_without_public_class_falls_back() {
    let engine = test_engine("compile-fallback");
    let request = ExecutionRequest::new(
        "java",
        "class Quiet { public static void main(String[] a) { System.out.println(\"fallback\"); } }",
    );

    let result = engine.execute(&request).await.expect("execution failed");

    // The class token is rewritten to the fallback identifier and run as such
    assert!(result.succeeded(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("fallback"));
}
