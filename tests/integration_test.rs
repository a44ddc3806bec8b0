// Integration tests for visited-links
// Run with: cargo test --test integration_test

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_visited-links")
}

/// Every test gets its own storage file via a throwaway config.
fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let storage_path = dir.path().join("state.json");
    let config_path = dir.path().join("config.json");
    let config = serde_json::json!({ "storage_path": storage_path });
    fs::write(&config_path, config.to_string()).expect("write config");
    (dir, config_path)
}

fn run_cli(config: &Path, args: &[&str]) -> (bool, String, String) {
    let output = Command::new(bin())
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.success(), stdout, stderr)
}

fn stored_state(config: &Path) -> serde_json::Value {
    let (_, stdout, _) = run_cli(config, &["show"]);
    serde_json::from_str(&stdout).expect("show should print valid JSON")
}

#[test]
fn test_record_then_check_round_trip() {
    let (_dir, config) = setup();

    let (success, _, _) = run_cli(&config, &["record", "https://ex.ample.com/article?id=7"]);
    assert!(success, "record should succeed");

    // same resource through a fragment variant counts as visited
    let (visited, stdout, _) = run_cli(
        &config,
        &["check", "https://ex.ample.com/article?id=7#comments"],
    );
    assert!(visited, "fragment variant should be visited");
    assert!(stdout.contains("visited"));

    let (visited, _, _) = run_cli(&config, &["check", "https://ex.ample.com/other"]);
    assert!(!visited, "unrecorded URL should not be visited");
}

#[test]
fn test_recording_twice_stores_one_entry() {
    let (_dir, config) = setup();

    run_cli(&config, &["record", "https://ex.ample.com/a", "--title", "T"]);
    run_cli(&config, &["record", "https://ex.ample.com/a", "--title", "T"]);

    let state = stored_state(&config);
    assert_eq!(state["visitedLinks"].as_array().unwrap().len(), 1);
    assert_eq!(state["visitedTitles"].as_array().unwrap().len(), 1);
}

#[test]
fn test_tracker_junk_is_never_stored() {
    let (_dir, config) = setup();

    run_cli(&config, &["record", "https://ads.example.com/track?id=1"]);

    let state = stored_state(&config);
    assert!(state["visitedLinks"].as_array().unwrap().is_empty());
}

#[test]
fn test_blacklisted_title_is_dropped_but_link_kept() {
    let (_dir, config) = setup();

    run_cli(
        &config,
        &[
            "record",
            "https://ex.ample.com/show",
            "--title",
            "My Show - Episode 3",
        ],
    );

    let state = stored_state(&config);
    assert_eq!(state["visitedLinks"].as_array().unwrap().len(), 1);
    assert!(state["visitedTitles"].as_array().unwrap().is_empty());
}

#[test]
fn test_title_substring_match_direction() {
    let (_dir, config) = setup();

    run_cli(
        &config,
        &[
            "record",
            "https://news.site.com/x",
            "--title",
            "Breaking News",
        ],
    );

    // stored title as needle inside a decorated live title: visited
    let (visited, _, _) = run_cli(
        &config,
        &[
            "check",
            "https://other.site.com/y",
            "--title",
            "Breaking News - Live Update",
        ],
    );
    assert!(visited);

    // the reverse direction must not match
    let (visited, _, _) = run_cli(
        &config,
        &["check", "https://other.site.com/y", "--title", "Breaking"],
    );
    assert!(!visited);
}

#[test]
fn test_malformed_import_fails_and_leaves_state_untouched() {
    let (dir, config) = setup();

    run_cli(&config, &["record", "https://ex.ample.com/a"]);
    let before = stored_state(&config);

    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"{"foo": 1}"#).unwrap();

    let (success, _, stderr) = run_cli(&config, &["import", bad.to_str().unwrap()]);
    assert!(!success, "malformed import must fail");
    assert!(stderr.contains("invalid file format"), "stderr was: {}", stderr);
    assert_eq!(stored_state(&config), before);
}

#[test]
fn test_backup_then_import_is_identity() {
    let (dir, config) = setup();

    run_cli(&config, &["record", "https://ex.ample.com/a", "--title", "T1"]);
    run_cli(&config, &["record", "https://ex.ample.com/b", "--alt", "A1"]);
    let before = stored_state(&config);

    let backup_dir = dir.path().join("backups");
    fs::create_dir_all(&backup_dir).unwrap();
    let (success, _, _) = run_cli(
        &config,
        &["backup", "--output-dir", backup_dir.to_str().unwrap()],
    );
    assert!(success, "backup should succeed");

    let backup_file = fs::read_dir(&backup_dir)
        .unwrap()
        .next()
        .expect("one backup file")
        .unwrap()
        .path();
    let name = backup_file.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("visited-links-backup-"));
    assert!(name.ends_with(".json"));

    let (success, _, _) = run_cli(&config, &["import", backup_file.to_str().unwrap()]);
    assert!(success, "import of own backup should succeed");
    assert_eq!(stored_state(&config), before);
}

#[test]
fn test_import_merges_as_set_union() {
    let (dir, config) = setup();

    run_cli(&config, &["record", "https://ex.ample.com/a"]);

    let snapshot = dir.path().join("snapshot.json");
    fs::write(
        &snapshot,
        r#"{"visitedLinks": ["ex.ample/a", "other/x"], "visitedTitles": ["T"], "visitedAlts": []}"#,
    )
    .unwrap();
    run_cli(&config, &["import", snapshot.to_str().unwrap()]);

    let state = stored_state(&config);
    let links = state["visitedLinks"].as_array().unwrap();
    assert_eq!(links.len(), 2, "duplicate key collapses, new key appended");
    assert_eq!(state["visitedTitles"].as_array().unwrap().len(), 1);
}

#[test]
fn test_clean_removes_previously_stored_blacklisted_entries() {
    let (dir, config) = setup();

    // data persisted under an earlier, laxer policy
    let snapshot = dir.path().join("snapshot.json");
    fs::write(
        &snapshot,
        r#"{"visitedLinks": [], "visitedTitles": ["Good Title", "Show Episode 3"], "visitedAlts": ["Season 2 poster"]}"#,
    )
    .unwrap();
    run_cli(&config, &["import", snapshot.to_str().unwrap()]);

    let (success, stdout, _) = run_cli(&config, &["clean"]);
    assert!(success);
    assert!(stdout.contains("Blacklist clean report"));

    let state = stored_state(&config);
    assert_eq!(state["visitedTitles"].as_array().unwrap().len(), 1);
    assert!(state["visitedAlts"].as_array().unwrap().is_empty());
}

#[test]
fn test_toggle_flips_highlight_flag_and_render_respects_it() {
    let (dir, config) = setup();

    run_cli(&config, &["record", "https://ex.ample.com/a"]);

    let links = dir.path().join("links.json");
    fs::write(
        &links,
        r#"[{"href": "https://ex.ample.com/a"}, {"href": "https://ex.ample.com/b"}]"#,
    )
    .unwrap();

    let (_, stdout, _) = run_cli(&config, &["render", "--file", links.to_str().unwrap()]);
    let decisions: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(decisions["decisions"], serde_json::json!([true, false]));

    let (success, _, _) = run_cli(&config, &["toggle"]);
    assert!(success);

    // with highlighting off every link reports unvisited
    let (_, stdout, _) = run_cli(&config, &["render", "--file", links.to_str().unwrap()]);
    let decisions: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(decisions["decisions"], serde_json::json!([false, false]));
}

#[test]
fn test_style_prints_highlight_css() {
    let (_dir, config) = setup();
    let (success, stdout, _) = run_cli(&config, &["style"]);
    assert!(success);
    assert!(stdout.contains("a.similar-visited"));
}

#[test]
fn test_help_commands() {
    let (_dir, config) = setup();
    let (_, stdout, stderr) = run_cli(&config, &["--help"]);
    let combined = format!("{}{}", stdout, stderr);
    assert!(
        combined.contains("record") && combined.contains("import"),
        "Help should list available commands"
    );
}
