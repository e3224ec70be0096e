/// CLI binary integration tests using assert_cmd
///
/// These tests invoke the actual binary against snapshot files in a temp
/// directory, with the settings file redirected through the environment.
mod common;

use std::process::Command;

use assert_cmd::prelude::*;
use common::{ConfigDir, DocBuilder, chatgpt_page, chatgpt_turn, el, write_script, write_snapshot};
use predicates::prelude::*;
use serde_json::{Value, json};
use turn_navigator::tree::SnapshotNode;

fn cli(config: &ConfigDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_turn-navigator"));
    cmd.env("TURN_NAVIGATOR_CONFIG", config.settings()).env_remove("TURN_NAVIGATOR_LOG");
    cmd
}

fn sample_page() -> DocBuilder {
    chatgpt_page(
        "cli-demo",
        vec![
            chatgpt_turn("user", "u1", "Explain borrow checking"),
            chatgpt_turn("assistant", "a1", "The borrow checker enforces aliasing rules."),
            chatgpt_turn("user", "u2", "Summarize report.pdf please"),
            chatgpt_turn("assistant", "a2", "The report covers quarterly results."),
        ],
    )
}

#[test]
fn test_cli_no_command_shows_help_message() {
    let config = ConfigDir::new();
    cli(&config).assert().success().stdout(predicate::str::contains("Use --help for usage information"));
}

#[test]
fn test_cli_help_flag() {
    let config = ConfigDir::new();
    cli(&config)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("index"))
        .stdout(predicate::str::contains("replay"));
}

#[test]
fn test_cli_index_prints_entries() {
    let config = ConfigDir::new();
    let snapshot = write_snapshot(config.path(), "page.json", &sample_page().snapshot());

    cli(&config)
        .arg("index")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("  1  user       Explain borrow checking  (u1)"))
        .stdout(predicate::str::contains("[pdf] Summarize report.pdf please"))
        .stderr(predicate::str::contains("4 entries (chatgpt, cli-demo)"));
}

#[test]
fn test_cli_index_json_output() {
    let config = ConfigDir::new();
    let snapshot = write_snapshot(config.path(), "page.json", &sample_page().snapshot());

    let output = cli(&config).arg("index").arg(&snapshot).arg("--json").output().unwrap();
    assert!(output.status.success());
    let entries: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["identity"], "u1");
    assert_eq!(entries[2]["serial"], 2);
    assert!(entries[1]["serial"].is_null());
}

#[test]
fn test_cli_index_unsupported_host_fails() {
    let config = ConfigDir::new();
    let snapshot = write_snapshot(
        config.path(),
        "other.json",
        &DocBuilder::new("https://example.com/chat").child(el("main").text("hello")).snapshot(),
    );

    cli(&config)
        .arg("index")
        .arg(&snapshot)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported host"));
}

#[test]
fn test_cli_index_url_override_selects_adapter() {
    let config = ConfigDir::new();
    let snapshot = write_snapshot(config.path(), "page.json", &sample_page().snapshot());

    cli(&config)
        .arg("index")
        .arg(&snapshot)
        .args(["--url", "https://chat.openai.com/c/renamed"])
        .assert()
        .success()
        .stderr(predicate::str::contains("(chatgpt, renamed)"));
}

#[test]
fn test_cli_stats_command() {
    let config = ConfigDir::new();
    let snapshot = write_snapshot(config.path(), "page.json", &sample_page().snapshot());

    cli(&config)
        .arg("stats")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("Conversation Statistics"))
        .stdout(predicate::str::contains("Total entries: 4"))
        .stdout(predicate::str::contains("User prompts: 2"))
        .stdout(predicate::str::contains("Assistant replies: 2"))
        .stdout(predicate::str::contains("pdf: 1"));
}

#[test]
fn test_cli_stats_missing_file() {
    let config = ConfigDir::new();
    cli(&config)
        .arg("stats")
        .arg(config.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open file"));
}

#[test]
fn test_cli_search_with_filter() {
    let config = ConfigDir::new();
    let snapshot = write_snapshot(config.path(), "page.json", &sample_page().snapshot());

    cli(&config)
        .arg("search")
        .arg(&snapshot)
        .arg("role:user | borrow")
        .assert()
        .success()
        .stdout(predicate::str::contains("Explain borrow checking"))
        .stdout(predicate::str::contains("aliasing").not())
        .stderr(predicate::str::contains("1 of 4 entries matched"));
}

#[test]
fn test_cli_search_rejects_bad_filter() {
    let config = ConfigDir::new();
    let snapshot = write_snapshot(config.path(), "page.json", &sample_page().snapshot());

    cli(&config)
        .arg("search")
        .arg(&snapshot)
        .arg("role:robot |")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid role"));
}

#[test]
fn test_cli_replay_reports_frames() {
    let config = ConfigDir::new();
    let start = chatgpt_page("live", vec![chatgpt_turn("user", "u1", "first question")]).snapshot();
    let answer = serde_json::to_value(SnapshotNode::from(chatgpt_turn("assistant", "a1", "first answer"))).unwrap();
    let script = write_script(
        config.path(),
        "script.json",
        start,
        vec![json!({ "at_ms": 100, "op": "append", "parent": "thread", "node": answer })],
    );

    cli(&config)
        .arg("replay")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("[     0ms] 1 entries"))
        .stdout(predicate::str::contains("[   850ms] 2 entries"))
        .stderr(predicate::str::contains("2 accepted"));
}

#[test]
fn test_cli_replay_quiet_flag_changes_timing() {
    let config = ConfigDir::new();
    let start = chatgpt_page("live", vec![chatgpt_turn("user", "u1", "first question")]).snapshot();
    let script = write_script(
        config.path(),
        "script.json",
        start,
        vec![json!({ "at_ms": 100, "op": "set_text", "target": "thread", "text": "Thinking..." })],
    );

    let output = cli(&config).arg("replay").arg(&script).args(["--json", "--quiet-ms", "50"]).output().unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["frames"].as_array().unwrap().len(), 1);
    assert_eq!(report["final_index"].as_array().unwrap().len(), 1);
}

#[test]
fn test_cli_batch_reports_failures() {
    let config = ConfigDir::new();
    let dir = config.path().join("snapshots");
    std::fs::create_dir(&dir).unwrap();
    write_snapshot(&dir, "good.json", &sample_page().snapshot());
    std::fs::write(dir.join("broken.json"), "{ not json").unwrap();
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

    cli(&config)
        .arg("batch")
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("chatgpt  4 entries (2 prompts)"))
        .stdout(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("Indexed 1 snapshots (1 failed)"));
}

#[test]
fn test_cli_config_round_trip() {
    let config = ConfigDir::new();

    cli(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: openai"))
        .stdout(predicate::str::contains("API key: (not set)"))
        .stdout(predicate::str::contains("Theme: light"));

    cli(&config).args(["config", "set-key", "sk-test-1234567890"]).assert().success();
    cli(&config).args(["config", "theme", "dark"]).assert().success();

    cli(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-"))
        .stdout(predicate::str::contains("7890"))
        .stdout(predicate::str::contains("1234567890").not())
        .stdout(predicate::str::contains("Theme: dark"));
    assert!(config.settings().exists());
}

#[test]
fn test_cli_config_rejects_malformed_key() {
    let config = ConfigDir::new();
    cli(&config)
        .args(["config", "set-key", "not-a-key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a valid openai API key"));
    assert!(!config.settings().exists());
}
