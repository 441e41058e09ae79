//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data dir.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    run_cli_with_input(data_dir, args, "")
}

fn run_cli_with_input(data_dir: &Path, args: &[&str], input: &str) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_brewtimer"))
        .args(args)
        .env("BREWTIMER_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait on CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn history(data_dir: &Path) -> Vec<serde_json::Value> {
    let (code, stdout, stderr) = run_cli(data_dir, &["history", "list", "--json"]);
    assert_eq!(code, 0, "history list failed: {stderr}");
    serde_json::from_str::<serde_json::Value>(&stdout)
        .expect("history list --json prints JSON")
        .as_array()
        .cloned()
        .expect("history is an array")
}

#[test]
fn test_recipe_list_includes_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["recipe", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("v60"));
    assert!(stdout.contains("french-press"));
}

#[test]
fn test_recipe_list_json_picks_up_user_recipes() {
    let dir = tempfile::tempdir().unwrap();
    let recipes = dir.path().join("recipes");
    std::fs::create_dir_all(&recipes).unwrap();
    std::fs::write(
        recipes.join("aeropress.toml"),
        "id = \"aeropress\"\nname = \"AeroPress\"\n\n[[steps]]\nname = \"Steep\"\nduration_secs = 90\n",
    )
    .unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["recipe", "list", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ids: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["aeropress", "v60", "french-press"]);
}

#[test]
fn test_recipe_show() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["recipe", "show", "french-press"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("French Press"));
    assert!(stdout.contains("Steep"));
}

#[test]
fn test_recipe_show_unknown_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["recipe", "show", "chemex"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("chemex"));
}

#[test]
fn test_recipe_validate() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.toml");
    std::fs::write(
        &good,
        "id = \"good\"\nname = \"Good\"\n\n[[steps]]\nname = \"Steep\"\nduration_secs = 60\n",
    )
    .unwrap();
    let empty = dir.path().join("empty.toml");
    std::fs::write(&empty, "id = \"empty\"\nname = \"Empty\"\n").unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["recipe", "validate", good.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("ok: good"));

    let (code, _, stderr) = run_cli(dir.path(), &["recipe", "validate", empty.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no steps"));
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "brewing.default_mode"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "manual");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "brewing.default_mode", "expert"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "brewing.default_mode"]);
    assert_eq!(stdout.trim(), "expert");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "brewing.default_mode", "turbo"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "theme"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_expert_brew_finished_early_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli_with_input(
        dir.path(),
        &["brew", "--recipe", "v60", "--mode", "expert"],
        "start\nfinish\n",
    );
    assert_eq!(code, 0, "brew failed: {stderr}");
    assert!(stdout.contains("Hario V60 (v60) - expert mode"));
    assert!(stdout.contains("Brewed Hario V60"));

    let brews = history(dir.path());
    assert_eq!(brews.len(), 1);
    assert_eq!(brews[0]["recipe_id"], "v60");
    assert_eq!(brews[0]["finished_early"], true);
    assert_eq!(brews[0]["total_steps"], 4);
}

#[test]
fn test_manual_mode_cannot_finish_early() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) =
        run_cli_with_input(dir.path(), &["brew", "--mode", "manual"], "start\nfinish\nquit\n");
    assert_eq!(code, 0);
    assert!(stderr.contains("not available right now in manual mode"));
    assert!(history(dir.path()).is_empty());
}

#[test]
fn test_jump_past_last_step_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli_with_input(
        dir.path(),
        &["brew", "--recipe", "v60", "--mode", "expert"],
        "start\njump 9\njump 3\nquit\n",
    );
    assert_eq!(code, 0);
    assert!(stderr.contains("Index 8 out of bounds for steps of recipe 'v60' (length: 4)"));
    assert!(stdout.contains(" [>] 3. Second Pour"));
}

#[test]
fn test_no_save_skips_history() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli_with_input(
        dir.path(),
        &["brew", "--mode", "expert", "--no-save"],
        "start\nfinish\n",
    );
    assert_eq!(code, 0);
    assert!(history(dir.path()).is_empty());
}

#[test]
fn test_history_stats_json() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_with_input(
        dir.path(),
        &["brew", "--recipe", "french-press", "--mode", "expert"],
        "start\nskip\nfinish\n",
    );
    let (code, stdout, _) = run_cli(dir.path(), &["history", "stats", "--json"]);
    assert_eq!(code, 0);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["total_brews"], 1);
    assert_eq!(stats["finished_early"], 1);
    assert_eq!(stats["favourite_recipe"], "french-press");
}
