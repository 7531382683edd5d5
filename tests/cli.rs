use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn run_qrnote(dir: &Path, args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_qrnote"))
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn truncated_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_qrnote(dir.path(), &[], "note\n");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains("An error occurred: input ended before all prompts were answered"));
    assert!(!stdout.contains("Program terminated by user."));
    assert!(!dir.path().join("message.html").exists());
}

#[test]
fn input_ending_after_a_prompt_is_still_an_error() {
    let dir = tempfile::tempdir().unwrap();
    // Page and symbol are written, then input runs out at the URL question
    let output = run_qrnote(dir.path(), &[], "note\n\n");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains("An error occurred:"));
    assert!(dir.path().join("message.html").exists());
    assert!(dir.path().join("qr_code.png").exists());
}

#[test]
fn complete_session_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_qrnote(dir.path(), &[], "note\n\nn\nn\n");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(0), "stdout: {stdout}");
    assert!(!stdout.contains("An error occurred"));
    assert!(stdout.contains("✓ QR code created: qr_code.png"));
    assert!(dir.path().join("qr_code.png").exists());
}

#[test]
fn prints_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_qrnote(dir.path(), &["--version"], "");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("qrnote {}", env!("CARGO_PKG_VERSION")));
}
