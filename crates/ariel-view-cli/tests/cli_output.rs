//! End-to-end tests of the `ariel-view` binary
//!
//! Only commands that do not need the Mermaid CLI are exercised here.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run_cli(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ariel-view"))
        .args(args)
        .env("ARIEL_VIEW_LOG_LEVEL", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn ariel-view");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn test_repair_from_stdin() {
    let output = run_cli(&["repair"], "flowchart TD\n  A[hello world] --> B[ok]\n");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "flowchart TD\n  A[\"hello world\"] --> B[ok]\n"
    );
}

#[test]
fn test_repair_check_fails_when_rewrite_applies() {
    let output = run_cli(&["repair", "--check"], "flowchart TD\n  A[hello world]\n");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("need quoting"));
}

#[test]
fn test_repair_check_passes_clean_input() {
    let output = run_cli(&["repair", "--check", "-i", "-"], "flowchart TD\n  A[\"quoted\"]\n");
    assert!(output.status.success());
}

#[test]
fn test_render_with_missing_engine_fails_cleanly() {
    let output = run_cli(
        &["render", "--mmdc", "/nonexistent/mmdc", "--theme", "dark"],
        "flowchart TD\n  A-->B\n",
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Render failed"));
    assert!(stderr.contains("Diagram engine unavailable"));
}

#[test]
fn test_render_empty_input_fails() {
    let output = run_cli(&["render", "--theme", "light"], "   \n");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("empty"));
}
