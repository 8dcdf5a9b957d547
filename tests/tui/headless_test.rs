//! Integration tests for headless mode.
//!
//! Runs the built binary with the in-memory database and the mock LLM.

use std::io::Write;
use std::process::{Command, Stdio};

fn command(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_datawhisperer"));
    cmd.args(args)
        .env_remove("RUST_LOG")
        .env_remove("MYSQL_DATABASE")
        .env("HOME", std::env::temp_dir())
        .env("XDG_CONFIG_HOME", std::env::temp_dir().join("datawhisperer-test-config"));
    cmd
}

fn run(args: &[&str]) -> (i32, String, String) {
    let output = command(args).output().expect("Failed to execute command");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}

#[test]
fn test_headless_answers_question() {
    let (code, stdout, stderr) = run(&[
        "--headless",
        "--mock-db",
        "--llm",
        "mock",
        "--ask",
        "How many artists are there?",
    ]);

    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(
        stdout,
        "Here is what I found for \"How many artists are there?\":\ntotal\n12\n"
    );
    assert!(stderr.contains("Connected to Database"));
}

#[test]
fn test_headless_refusal() {
    let (code, stdout, _) = run(&[
        "--headless",
        "--mock-db",
        "--llm",
        "mock",
        "--ask",
        "What's the weather like?",
    ]);

    assert_eq!(code, 0);
    assert!(stdout.starts_with("I'm sorry, I couldn't generate a valid answer"));
}

#[test]
fn test_headless_json_output() {
    let (code, stdout, _) = run(&[
        "--headless",
        "--mock-db",
        "--llm",
        "mock",
        "--output",
        "json",
        "--ask",
        "Show me some albums",
        "--ask",
        "What's the weather like?",
    ]);

    assert_eq!(code, 0);
    let records: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["status"], "answered");
    assert_eq!(records[0]["sql"], "SELECT * FROM Album LIMIT 10;");
    assert_eq!(records[1]["status"], "refused");
    assert!(records[1].get("sql").is_none());
}

#[test]
fn test_headless_reads_stdin() {
    let mut child = command(&["--headless", "--mock-db", "--llm", "mock"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"How many albums are there?\n\nHow many tracks are there?\n")
        .unwrap();

    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("total\n5"));
    assert!(stdout.contains("total\n6"));
}

#[test]
fn test_headless_unknown_provider() {
    let (code, _, stderr) = run(&["--headless", "--mock-db", "--llm", "bard", "--ask", "hi"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown LLM provider: bard"));
}

#[test]
fn test_ask_without_headless_is_rejected() {
    let (code, _, stderr) = run(&["--mock-db", "--ask", "Name 10 artists"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("--ask requires --headless"));
}
