//! Integration tests for the `ck` CLI.
//!
//! Each test creates a temp workspace, runs `ck` as a subprocess,
//! and verifies stdout and/or file contents.

use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run `ck` with the given args in the given directory, returning (stdout, stderr, success).
fn run_ck(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_ck"))
        .args(args)
        .current_dir(dir)
        .env_remove("CHECKLIST_LOG")
        .output()
        .expect("failed to run ck");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `ck` expecting success, return stdout.
fn run_ck_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_ck(dir, args);
    if !success {
        panic!(
            "ck {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Run `ck` expecting failure, return stderr.
fn run_ck_err(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_ck(dir, args);
    if success {
        panic!("ck {:?} unexpectedly succeeded:\nstdout: {}", args, stdout);
    }
    stderr
}

/// Initialize a workspace with the intro hint already seen.
fn create_test_workspace(root: &Path) {
    run_ck_ok(root, &["init"]);
    let config = root.join(".checklist/config.toml");
    let text = fs::read_to_string(&config).unwrap();
    fs::write(
        &config,
        text.replace("has_seen_intro = false", "has_seen_intro = true"),
    )
    .unwrap();
}

fn add(root: &Path, args: &[&str]) -> String {
    let mut full = vec!["add"];
    full.extend_from_slice(args);
    run_ck_ok(root, &full).trim().to_string()
}

fn list_json(root: &Path) -> Value {
    serde_json::from_str(&run_ck_ok(root, &["list", "--json"])).unwrap()
}

fn tasks_file(root: &Path) -> String {
    fs::read_to_string(root.join(".checklist/tasks.json")).unwrap()
}

/// Headline "Setup" with two tasks, preceded by one ungrouped task.
/// Returns (loose, headline, a, b).
fn seed(root: &Path) -> (String, String, String, String) {
    let loose = add(root, &["Loose end"]);
    let headline = add(root, &["Setup", "--headline"]);
    let a = add(root, &["Install Node"]);
    let b = add(root, &["Install pnpm", "--optional"]);
    (loose, headline, a, b)
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_layout() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_ck_ok(tmp.path(), &["init"]);
    assert!(out.contains("Initialized checklist"));
    assert!(tmp.path().join(".checklist/config.toml").exists());
    assert_eq!(tasks_file(tmp.path()), "{\n  \"data\": []\n}\n");
}

#[test]
fn test_init_twice_needs_force() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    add(tmp.path(), &["Keep me?"]);

    let err = run_ck_err(tmp.path(), &["init"]);
    assert!(err.contains("already exists"));

    run_ck_ok(tmp.path(), &["init", "--force"]);
    assert_eq!(tasks_file(tmp.path()), "{\n  \"data\": []\n}\n");
}

#[test]
fn test_outside_workspace_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    let err = run_ck_err(tmp.path(), &["list"]);
    assert!(err.starts_with("error: not a checklist workspace"));
}

#[test]
fn test_workspace_dir_flag_and_discovery() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    add(tmp.path(), &["From the root"]);

    let nested = tmp.path().join("src/deep");
    fs::create_dir_all(&nested).unwrap();
    let out = run_ck_ok(&nested, &["list"]);
    assert!(out.contains("From the root"));

    let elsewhere = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().to_string_lossy().to_string();
    let out = run_ck_ok(elsewhere.path(), &["-C", &dir, "list"]);
    assert!(out.contains("From the root"));
}

#[test]
fn test_intro_shown_once_without_api_key() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_ck_ok(tmp.path(), &["init"]);

    let (_, stderr, ok) = run_ck(tmp.path(), &["list"]);
    assert!(ok);
    assert!(stderr.contains("Welcome to checklist"));

    let (_, stderr, ok) = run_ck(tmp.path(), &["list"]);
    assert!(ok);
    assert!(!stderr.contains("Welcome to checklist"));
}

#[test]
fn test_intro_skipped_with_api_key() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_ck_ok(tmp.path(), &["init"]);
    let config = tmp.path().join(".checklist/config.toml");
    let text = fs::read_to_string(&config).unwrap();
    fs::write(&config, text.replace("# api_key = \"\"", "api_key = \"k-123\"")).unwrap();

    let (_, stderr, ok) = run_ck(tmp.path(), &["list"]);
    assert!(ok);
    assert!(!stderr.contains("Welcome to checklist"));
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

#[test]
fn test_list_empty() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let out = run_ck_ok(tmp.path(), &[]);
    assert!(out.contains("No tasks"));
}

#[test]
fn test_list_groups_and_counts() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (loose, headline, a, _) = seed(tmp.path());
    run_ck_ok(tmp.path(), &["toggle", &a]);

    let out = run_ck_ok(tmp.path(), &["list"]);
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("[ ] "));
    assert!(lines[0].ends_with("Loose end"));
    assert!(lines[0].contains(&loose[..8]));
    assert!(lines[1].contains("## Setup (1/2)"));
    assert!(lines[1].contains(&headline[..8]));
    assert!(lines[2].starts_with("    [x] "));
    assert!(lines[3].starts_with("    [ ] "));
    assert!(lines[3].ends_with("Install pnpm (optional)"));
    assert!(out.contains("1 of 3 tasks completed"));
}

#[test]
fn test_list_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (_, headline, a, _) = seed(tmp.path());

    let parsed = list_json(tmp.path());
    let tasks = parsed["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 4);
    assert_eq!(tasks[1]["id"], headline.as_str());
    assert_eq!(tasks[1]["isHeadline"], true);
    assert_eq!(tasks[2]["id"], a.as_str());
    assert_eq!(tasks[2]["headline"], headline.as_str());
    assert!(tasks[0].get("headline").is_none());
    assert_eq!(parsed["progress"]["total"], 3);
    assert_eq!(parsed["groups"][0]["headline"], headline.as_str());
}

#[test]
fn test_show_by_prefix() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (_, _, a, _) = seed(tmp.path());

    let out = run_ck_ok(tmp.path(), &["show", &a[..8]]);
    assert!(out.contains("Install Node"));
    assert!(out.contains(&format!("id: {}", a)));
    assert!(out.contains("Setup"));

    let json: Value = serde_json::from_str(&run_ck_ok(tmp.path(), &["show", &a, "--json"])).unwrap();
    assert_eq!(json["text"], "Install Node");
}

#[test]
fn test_show_not_found() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let err = run_ck_err(tmp.path(), &["show", "nope"]);
    assert!(err.contains("task not found: nope"));
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

#[test]
fn test_add_with_attachments() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let script = tmp.path().join("setup.sh");
    fs::write(&script, "npm install\nnpm run dev\n").unwrap();
    let script = script.to_string_lossy().to_string();

    let id = add(
        tmp.path(),
        &["Bootstrap", "--lang", "bash", "--code-file", &script, "--rich-text", "<b>fast</b>"],
    );

    let task = &list_json(tmp.path())["tasks"][0];
    assert_eq!(task["id"], id.as_str());
    assert_eq!(task["codeBlock"]["language"], "bash");
    assert_eq!(task["codeBlock"]["code"], "npm install\nnpm run dev\n");
    assert_eq!(task["richText"], "<b>fast</b>");
    assert!(task.get("optional").is_none());
}

#[test]
fn test_code_requires_lang() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    run_ck_err(tmp.path(), &["add", "x", "--code", "ls"]);
    assert!(list_json(tmp.path())["tasks"].as_array().unwrap().is_empty());
}

#[test]
fn test_toggle_involution() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (_, _, a, _) = seed(tmp.path());
    let before = tasks_file(tmp.path());

    let out = run_ck_ok(tmp.path(), &["toggle", &a]);
    assert!(out.starts_with("[x]"));
    run_ck_ok(tmp.path(), &["toggle", &a]);
    assert_eq!(tasks_file(tmp.path()), before);
}

#[test]
fn test_toggle_unknown_leaves_file_untouched() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    seed(tmp.path());
    let before = tasks_file(tmp.path());

    let err = run_ck_err(tmp.path(), &["toggle", "does-not-exist"]);
    assert!(err.contains("task not found"));
    assert_eq!(tasks_file(tmp.path()), before);
}

#[test]
fn test_check_all_scenario() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (loose, headline, _, _) = seed(tmp.path());

    let out = run_ck_ok(tmp.path(), &["check-all", &headline[..8]]);
    assert_eq!(out.trim(), "Checked 'Setup' and 2 tasks");
    let parsed = list_json(tmp.path());
    let tasks = parsed["tasks"].as_array().unwrap();
    assert!(tasks[1..].iter().all(|t| t["completed"] == true));
    assert_eq!(tasks[0]["id"], loose.as_str());
    assert_eq!(tasks[0]["completed"], false);

    let out = run_ck_ok(tmp.path(), &["check-all", &headline]);
    assert_eq!(out.trim(), "Unchecked 'Setup' and 2 tasks");
    let parsed = list_json(tmp.path());
    assert!(
        parsed["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .all(|t| t["completed"] == false)
    );
}

#[test]
fn test_check_all_rejects_plain_task() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (_, _, a, _) = seed(tmp.path());
    let err = run_ck_err(tmp.path(), &["check-all", &a]);
    assert!(err.contains("not a headline"));
}

#[test]
fn test_edit_replaces_content() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (_, _, _, b) = seed(tmp.path());
    run_ck_ok(tmp.path(), &["toggle", &b]);
    let created = list_json(tmp.path())["tasks"][3]["createdAt"].clone();

    run_ck_ok(tmp.path(), &["edit", &b, "Install pnpm globally"]);
    let task = list_json(tmp.path())["tasks"][3].clone();
    assert_eq!(task["id"], b.as_str());
    assert_eq!(task["text"], "Install pnpm globally");
    assert_eq!(task["completed"], true);
    assert_eq!(task["createdAt"], created);
    // Flags left out clear the field
    assert!(task.get("optional").is_none());
}

#[test]
fn test_rm_headline_orphans_tasks() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (_, headline, a, b) = seed(tmp.path());

    let out = run_ck_ok(tmp.path(), &["rm", &headline]);
    assert!(out.contains("Deleted"));

    let parsed = list_json(tmp.path());
    let tasks = parsed["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[1]["id"], a.as_str());
    assert_eq!(tasks[2]["id"], b.as_str());
    assert!(tasks.iter().all(|t| t.get("headline").is_none()));
}

#[test]
fn test_mv_changes_group() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (loose, headline, a, _) = seed(tmp.path());

    run_ck_ok(tmp.path(), &["mv", &loose, "--after", &headline]);
    let parsed = list_json(tmp.path());
    assert_eq!(parsed["tasks"][0]["id"], headline.as_str());
    assert_eq!(parsed["tasks"][1]["id"], loose.as_str());
    assert_eq!(parsed["tasks"][1]["headline"], headline.as_str());

    run_ck_ok(tmp.path(), &["mv", &a, "--top"]);
    let parsed = list_json(tmp.path());
    assert_eq!(parsed["tasks"][0]["id"], a.as_str());
    assert!(parsed["tasks"][0].get("headline").is_none());
}

#[test]
fn test_mv_requires_one_target() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (loose, ..) = seed(tmp.path());
    run_ck_err(tmp.path(), &["mv", &loose]);
    run_ck_err(tmp.path(), &["mv", &loose, "--top", "--bottom"]);
}

#[test]
fn test_reorder_full_permutation() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (loose, headline, a, b) = seed(tmp.path());

    run_ck_ok(tmp.path(), &["reorder", &headline, &b, &a, &loose]);
    let parsed = list_json(tmp.path());
    let ids: Vec<&str> = parsed["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![headline.as_str(), b.as_str(), a.as_str(), loose.as_str()]);
}

#[test]
fn test_reorder_rejects_non_permutation() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let (loose, headline, a, _) = seed(tmp.path());
    let before = tasks_file(tmp.path());

    let err = run_ck_err(tmp.path(), &["reorder", &headline, &a, &loose, "intruder"]);
    assert!(err.contains("not a permutation"));
    assert!(err.contains("unknown: intruder"));
    assert_eq!(tasks_file(tmp.path()), before);

    let err = run_ck_err(tmp.path(), &["reorder", &headline, &a, &a, &loose]);
    assert!(err.contains("duplicated"));
    assert_eq!(tasks_file(tmp.path()), before);
}

#[test]
fn test_clear_needs_confirmation() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    seed(tmp.path());

    let err = run_ck_err(tmp.path(), &["clear"]);
    assert!(err.contains("--yes"));
    assert_eq!(list_json(tmp.path())["tasks"].as_array().unwrap().len(), 4);

    run_ck_ok(tmp.path(), &["clear", "--yes"]);
    assert_eq!(tasks_file(tmp.path()), "{\n  \"data\": []\n}\n");
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

#[test]
fn test_export_import_between_workspaces() {
    let first = tempfile::TempDir::new().unwrap();
    create_test_workspace(first.path());
    let (_, headline, _, _) = seed(first.path());
    run_ck_ok(first.path(), &["check-all", &headline]);

    let exported = run_ck_ok(first.path(), &["export"]);
    assert_eq!(exported, tasks_file(first.path()));
    let file = first.path().join("shared.json");
    run_ck_ok(
        first.path(),
        &["export", "-o", &file.to_string_lossy()],
    );
    assert_eq!(fs::read_to_string(&file).unwrap(), exported);

    let second = tempfile::TempDir::new().unwrap();
    create_test_workspace(second.path());
    let out = run_ck_ok(second.path(), &["import", &file.to_string_lossy()]);
    assert_eq!(out.trim(), "Imported 4 tasks");
    assert_eq!(run_ck_ok(second.path(), &["export"]), exported);
}

#[test]
fn test_import_fixture_keeps_name() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/grouped_list.json");

    run_ck_ok(tmp.path(), &["import", &fixture.to_string_lossy()]);
    assert_eq!(tasks_file(tmp.path()), fs::read_to_string(&fixture).unwrap());

    let out = run_ck_ok(tmp.path(), &["list"]);
    assert!(out.starts_with("== Bolt install =="));
    assert!(out.contains("2 of 4 tasks completed"));
}

#[test]
fn test_import_invalid_document_changes_nothing() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    seed(tmp.path());
    let before = tasks_file(tmp.path());

    let bad = tmp.path().join("bad.json");
    fs::write(
        &bad,
        r#"{"data": [{"id": "x", "text": "no date", "completed": false, "isHeadline": false}]}"#,
    )
    .unwrap();
    let err = run_ck_err(tmp.path(), &["import", &bad.to_string_lossy()]);
    assert!(err.contains("createdAt"));
    assert_eq!(tasks_file(tmp.path()), before);
}

// ---------------------------------------------------------------------------
// Settings and sources
// ---------------------------------------------------------------------------

#[test]
fn test_settings_round_trip() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());

    let out = run_ck_ok(tmp.path(), &["settings"]);
    assert!(out.contains("api key: not set"));

    run_ck_ok(tmp.path(), &["settings", "--api-key", "k-123", "--model", "gemini-pro"]);
    let json: Value = serde_json::from_str(&run_ck_ok(tmp.path(), &["settings", "--json"])).unwrap();
    assert_eq!(json["api_key_set"], true);
    assert_eq!(json["model"], "gemini-pro");
    assert_eq!(json["service"], "google");

    // Comments in the config survive edits
    let config = fs::read_to_string(tmp.path().join(".checklist/config.toml")).unwrap();
    assert!(config.contains("# --- Predefined lists ---"));

    run_ck_ok(tmp.path(), &["settings", "--clear-api-key"]);
    let out = run_ck_ok(tmp.path(), &["settings"]);
    assert!(out.contains("api key: not set"));
}

#[test]
fn test_sources_without_configuration() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());
    let out = run_ck_ok(tmp.path(), &["sources"]);
    assert!(out.contains("No sources configured"));
}

#[test]
fn test_sources_add_probe_and_remove() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_workspace(tmp.path());

    run_ck_ok(
        tmp.path(),
        &["sources", "add", "Offline", "http://127.0.0.1:1/list.json"],
    );
    run_ck_err(
        tmp.path(),
        &["sources", "add", "offline", "http://127.0.0.1:1/other.json"],
    );

    // A failing source is reported, not fatal
    let out = run_ck_ok(tmp.path(), &["sources"]);
    assert!(out.starts_with("error  Offline"));
    let json: Value = serde_json::from_str(&run_ck_ok(tmp.path(), &["sources", "--json"])).unwrap();
    assert_eq!(json[0]["ok"], false);

    // Loading it is fatal and leaves the list alone
    seed(tmp.path());
    let before = tasks_file(tmp.path());
    run_ck_err(tmp.path(), &["load", "offline"]);
    assert_eq!(tasks_file(tmp.path()), before);

    run_ck_ok(tmp.path(), &["sources", "rm", "Offline"]);
    run_ck_err(tmp.path(), &["sources", "rm", "Offline"]);
    let err = run_ck_err(tmp.path(), &["load", "Offline"]);
    assert!(err.contains("no source named"));
}
