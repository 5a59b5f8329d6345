use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const DECK: &str = "\
---
title = \"Tutorial\"
---
# Contents {#toc}

# Intro

Welcome.

# Setup

Install the tools.

# Usage

Run it.
";

fn deck(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_deck"))
        .arg("--no-color")
        .args(args)
        .output()
        .expect("failed to run deck")
}

fn scenarios_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scenarios")
}

fn write_deck(dir: &tempfile::TempDir, name: &str, source: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, source).unwrap();
    path.to_str().unwrap().to_string()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// Scenario files
// ---------------------------------------------------------------------------

#[test]
fn scenario_suite_passes() {
    let dir = scenarios_dir();
    let output = deck(&["test", dir.to_str().unwrap()]);
    let err = stderr(&output);
    assert!(output.status.success(), "{}", err);
    assert!(err.contains("test result: ok."), "{}", err);
    assert!(!err.contains("FAIL"), "{}", err);
}

#[test]
fn scenario_categories_can_be_selected() {
    let dir = scenarios_dir();
    let output = deck(&["test", dir.to_str().unwrap(), "-c", "links"]);
    let err = stderr(&output);
    assert!(output.status.success(), "{}", err);
    assert!(err.contains("links"), "{}", err);
    assert!(!err.contains("history"), "{}", err);
    assert!(err.contains("4 passed, 0 failed"), "{}", err);
}

#[test]
fn scenario_categories_are_listed() {
    let dir = scenarios_dir();
    let output = deck(&["test", dir.to_str().unwrap(), "--list-categories"]);
    let err = stderr(&output);
    for category in ["history", "links", "load", "navigation"] {
        assert!(err.contains(category), "{}", err);
    }
}

#[test]
fn failing_scenario_reports_the_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = format!(
        "---\ndescription = \"wrong section\"\nexpect_section = 2\n---\n{}",
        DECK
    );
    let path = write_deck(&dir, "wrong.test.md", &scenario);

    let output = deck(&["test", path.as_str()]);
    let err = stderr(&output);
    assert_eq!(output.status.code(), Some(1), "{}", err);
    assert!(err.contains("FAIL  wrong section"), "{}", err);
    assert!(err.contains("section mismatch"), "{}", err);
    assert!(err.contains("0 passed, 1 failed (of 1)"), "{}", err);
}

#[test]
fn unknown_scenario_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = format!("---\nexpect_sektion = 1\n---\n{}", DECK);
    let path = write_deck(&dir, "typo.test.md", &scenario);

    let output = deck(&["test", path.as_str()]);
    let err = stderr(&output);
    assert_eq!(output.status.code(), Some(1), "{}", err);
    assert!(err.contains("frontmatter error"), "{}", err);
}

// ---------------------------------------------------------------------------
// show / export / present
// ---------------------------------------------------------------------------

#[test]
fn show_prints_the_current_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_deck(&dir, "deck.md", DECK);

    let output = deck(&["show", path.as_str(), "--fragment", "2"]);
    let out = stdout(&output);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(out.starts_with("[2/3] Tutorial – Setup  "), "{}", out);
    assert!(out.contains("deck.md#2"), "{}", out);
    assert!(out.contains("Install the tools."), "{}", out);
    assert!(!out.contains("Welcome."), "{}", out);
    assert!(out.contains("<- Intro (#1)    Usage (#3) ->"), "{}", out);
}

#[test]
fn file_argument_alone_means_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_deck(&dir, "deck.md", DECK);

    let output = deck(&[path.as_str(), "--key", "ArrowRight", "--key", "ArrowRight"]);
    let out = stdout(&output);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(out.starts_with("[3/3] Tutorial – Usage"), "{}", out);
}

#[test]
fn show_rejects_unknown_modifiers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_deck(&dir, "deck.md", DECK);

    let output = deck(&["show", path.as_str(), "--key", "Hyper+Enter"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("invalid key"));
}

#[test]
fn list_sections_names_every_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_deck(&dir, "deck.md", DECK);

    let output = deck(&["show", path.as_str(), "--list-sections"]);
    let out = stdout(&output);
    assert!(out.contains("  0  Contents (contents)"), "{}", out);
    assert!(out.contains("  1  Intro"), "{}", out);
    assert!(out.contains("  3  Usage"), "{}", out);
}

#[test]
fn check_reports_parse_errors_as_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_deck(&dir, "bad.md", "# Intro\n\nHello.\n\n# Setup\n");

    let output = deck(&["show", path.as_str(), "--check"]);
    let err = stderr(&output);
    assert_eq!(output.status.code(), Some(1), "{}", err);
    assert!(err.contains("error: the first section must be the table of contents"), "{}", err);
    assert!(err.contains("bad.md"), "{}", err);
}

#[test]
fn check_accepts_a_valid_deck() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_deck(&dir, "deck.md", DECK);

    let output = deck(&["show", path.as_str(), "--check"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("parsed successfully"));
}

#[test]
fn missing_files_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.md");

    let output = deck(&["show", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cannot read"));
}

#[test]
fn export_writes_an_html_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_deck(&dir, "deck.md", DECK);
    let html_path = dir.path().join("deck.html");

    let output = deck(&["export", path.as_str(), "-o", html_path.to_str().unwrap(), "--fragment", "3"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"), "{}", html);
    assert!(html.contains("<title>Tutorial – Usage</title>"), "{}", html);
    assert!(html.contains("<section class=\"hidden\" data-title=\"Intro\">"), "{}", html);
    assert!(html.contains("<section data-title=\"Usage\">"), "{}", html);
}

#[test]
fn present_follows_line_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_deck(&dir, "deck.md", DECK);

    let mut child = Command::new(env!("CARGO_BIN_EXE_deck"))
        .args(["--no-color", "present", path.as_str()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run deck");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"n\n\ng 1\np\nb\nb\nx\nq\nn\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let out = stdout(&output);
    assert!(output.status.success(), "{}", stderr(&output));

    assert!(out.contains("[1/3] Tutorial – Intro"), "{}", out);
    assert!(out.contains("[2/3] Tutorial – Setup"), "{}", out);
    assert!(out.contains("[3/3] Tutorial – Usage"), "{}", out);
    assert!(out.contains("(nothing to do)"), "{}", out);
    assert!(out.contains("error: unknown command 'x'"), "{}", out);
    // quit before the final command
    assert_eq!(out.matches("[2/3]").count(), 2, "{}", out);
}
