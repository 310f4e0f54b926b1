//! End-to-end runs of the aixi binary on small experiments.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn aixi(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("aixi").expect("aixi binary should exist");
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env_remove("AIXI_CONFIG")
        .env_remove("AIXI_CONFIG_DIR")
        .env_remove("AIXI_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// A coin-flip experiment that finishes in a fraction of a second.
fn small_experiment(home: &TempDir, name: &str, total_cycles: u64) -> std::path::PathBuf {
    let path = home.path().join(name);
    let content = format!(
        r#"
seed = 7

[environment]
kind = "coin_flip"
p = 0.9

[agent]
ct_depth = 4
horizon = 2
search_timeout_secs = 5.0
max_simulations = 3

[schedule]
total_cycles = {total_cycles}
"#
    );
    std::fs::write(&path, content).expect("write experiment file");
    path
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn version_reports_schema() {
    let home = TempDir::new().unwrap();
    let output = aixi(&home).arg("version").assert().success().get_output().clone();
    let json = stdout_json(&output);
    assert!(json["aixi_version"].is_string());
    assert!(json["config_schema_version"].is_string());
}

#[test]
fn presets_are_listed() {
    let home = TempDir::new().unwrap();
    aixi(&home)
        .args(["--format", "summary", "config", "presets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("coin-flip"))
        .stdout(predicate::str::contains("cheese-maze"))
        .stdout(predicate::str::contains("extended-tiger"));
}

#[test]
fn schema_describes_experiment() {
    let home = TempDir::new().unwrap();
    let output = aixi(&home)
        .args(["config", "schema"])
        .assert()
        .success()
        .get_output()
        .clone();
    let schema = stdout_json(&output);
    assert!(schema["properties"]["environment"].is_object());
    assert!(schema["properties"]["agent"].is_object());
}

#[test]
fn config_show_uses_defaults_without_file() {
    let home = TempDir::new().unwrap();
    let output = aixi(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .get_output()
        .clone();
    let json = stdout_json(&output);
    assert_eq!(json["snapshot"]["source"], "builtin default");
    assert_eq!(json["experiment"]["environment"]["kind"], "coin_flip");
}

#[test]
fn check_accepts_preset() {
    let home = TempDir::new().unwrap();
    let output = aixi(&home)
        .args(["--preset", "tictactoe", "check"])
        .assert()
        .success()
        .get_output()
        .clone();
    let json = stdout_json(&output);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"][1]["name"], "tictactoe");
    assert_eq!(json["checks"][0]["bits_per_cycle"], 25);
}

#[test]
fn run_writes_summary_and_telemetry() {
    let home = TempDir::new().unwrap();
    let experiment = small_experiment(&home, "coin.toml", 10);
    let telemetry = home.path().join("cycles.jsonl");

    let output = aixi(&home)
        .arg("--config")
        .arg(&experiment)
        .arg("run")
        .arg("--telemetry")
        .arg(&telemetry)
        .assert()
        .success()
        .get_output()
        .clone();

    let json = stdout_json(&output);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["summary"]["lifetime"], 20);
    assert_eq!(json["summary"]["games"][0]["environment"], "coin-flip");
    assert_eq!(json["config"]["source"], "CLI argument");

    let lines: Vec<Value> = std::fs::read_to_string(&telemetry)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 20);
    assert_eq!(lines[0]["global_cycle"], 0);
    assert_eq!(lines[19]["global_cycle"], 19);
    for line in &lines {
        assert!(line["action"].as_u64().unwrap() < 2);
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let home = TempDir::new().unwrap();
    let experiment = small_experiment(&home, "coin.toml", 8);
    let first = home.path().join("a.jsonl");
    let second = home.path().join("b.jsonl");

    for telemetry in [&first, &second] {
        aixi(&home)
            .arg("--config")
            .arg(&experiment)
            .args(["--format", "exitcode", "run", "--telemetry"])
            .arg(telemetry)
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    assert_eq!(
        std::fs::read_to_string(&first).unwrap(),
        std::fs::read_to_string(&second).unwrap()
    );
}

#[test]
fn jsonl_format_streams_cycles() {
    let home = TempDir::new().unwrap();
    let experiment = small_experiment(&home, "coin.toml", 3);

    let output = aixi(&home)
        .arg("--config")
        .arg(&experiment)
        .args(["--format", "jsonl", "run"])
        .assert()
        .success()
        .get_output()
        .clone();

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    // Six cycle records, then the summary line.
    assert_eq!(lines.len(), 7);
    assert!(lines[0]["global_cycle"].is_u64());
    assert_eq!(lines[6]["summary"]["lifetime"], 6);
}

#[test]
fn overrides_apply_before_validation() {
    let home = TempDir::new().unwrap();
    let experiment = small_experiment(&home, "coin.toml", 10);

    let output = aixi(&home)
        .arg("--config")
        .arg(&experiment)
        .args(["run", "--cycles", "4", "--seed", "99"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(stdout_json(&output)["summary"]["lifetime"], 8);

    aixi(&home)
        .arg("--config")
        .arg(&experiment)
        .args(["run", "--search-timeout=-1"])
        .assert()
        .code(11);
}

#[test]
fn transfer_run_plays_three_games() {
    let home = TempDir::new().unwrap();
    let first = small_experiment(&home, "first.toml", 5);
    let second = home.path().join("second.toml");
    std::fs::write(
        &second,
        r#"
seed = 7

[environment]
kind = "coin_flip"
p = 0.1

[agent]
ct_depth = 4
horizon = 2
search_timeout_secs = 5.0
max_simulations = 3

[schedule]
total_cycles = 5
"#,
    )
    .unwrap();

    let output = aixi(&home)
        .arg("--config")
        .arg(&first)
        .arg("run")
        .arg("--then")
        .arg(&second)
        .assert()
        .success()
        .get_output()
        .clone();

    let json = stdout_json(&output);
    let games = json["summary"]["games"].as_array().unwrap();
    assert_eq!(games.len(), 3);
    for game in games {
        assert_eq!(game["cycles"], 10);
    }
    assert_eq!(json["summary"]["lifetime"], 30);
}

#[test]
fn markdown_summary_has_table() {
    let home = TempDir::new().unwrap();
    let experiment = small_experiment(&home, "coin.toml", 2);
    aixi(&home)
        .arg("--config")
        .arg(&experiment)
        .args(["--format", "md", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("| game | environment |"))
        .stdout(predicate::str::contains("coin-flip"));
}
