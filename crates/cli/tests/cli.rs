use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const PIPELINE: &str = r#"
name: site
steps:
  - id: clean:dist
    capability: clean
    config: { paths: dist }
  - id: build:html
    capability: exec
    config: { command: "mkdir -p dist && echo \"$BATON_OPT_TITLE\" > dist/index.html", title: draft }
  - id: broken
    capability: exec
    config: { command: "exit 3" }
  - id: after
    capability: exec
    config: { command: "touch after" }
tasks:
  - name: default
  - name: dist
    description: Build the site
    steps: [clean:dist, build]
  - name: fragile
    steps: [dist, broken, after]
"#;

fn pipeline_root() -> tempfile::TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_dir = temp_dir.path().join(".baton");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("pipeline.yml"), PIPELINE).unwrap();
    temp_dir
}

fn baton(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("baton").unwrap();
    cmd.arg("--root").arg(root).env("NO_COLOR", "1").env_remove("BATON_LOG");
    cmd
}

#[test]
fn run_default_task_succeeds_with_no_steps() {
    let temp_dir = pipeline_root();

    baton(temp_dir.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to run for"));
}

#[test]
fn run_executes_steps_with_overrides() {
    let temp_dir = pipeline_root();

    baton(temp_dir.path())
        .args(["run", "dist", "--title=release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("build:html"));

    let html = fs::read_to_string(temp_dir.path().join("dist/index.html")).unwrap();
    assert_eq!(html.trim(), "release");
}

#[test]
fn failing_step_stops_run_and_exits_non_zero() {
    let temp_dir = pipeline_root();

    baton(temp_dir.path())
        .args(["run", "fragile"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Step 'broken' (3/4) failed"));

    assert!(temp_dir.path().join("dist/index.html").exists());
    assert!(!temp_dir.path().join("after").exists());
}

#[test]
fn unknown_task_is_reported() {
    let temp_dir = pipeline_root();

    baton(temp_dir.path())
        .args(["run", "deploy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown step or task 'deploy'"));
}

#[test]
fn plan_prints_execution_order_without_running() {
    let temp_dir = pipeline_root();

    baton(temp_dir.path())
        .args(["plan", "fragile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. clean:dist"))
        .stdout(predicate::str::contains("2. build:html"))
        .stdout(predicate::str::contains("3. broken"))
        .stdout(predicate::str::contains("4. after"));

    assert!(!temp_dir.path().join("dist").exists());
}

#[test]
fn list_shows_tasks_and_steps() {
    let temp_dir = pipeline_root();

    baton(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build the site"))
        .stdout(predicate::str::contains("clean:dist [clean]"));
}

#[test]
fn graph_expands_target_groups() {
    let temp_dir = pipeline_root();

    baton(temp_dir.path())
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("runs: clean:dist, build"))
        .stdout(predicate::str::contains("resolves to: clean:dist, build:html"));
}

#[test]
fn capabilities_and_schema_work_without_a_pipeline() {
    let temp_dir = tempfile::tempdir().unwrap();

    baton(temp_dir.path())
        .arg("capabilities")
        .assert()
        .success()
        .stdout(predicate::str::contains("exec"))
        .stdout(predicate::str::contains("copy"))
        .stdout(predicate::str::contains("clean"));

    baton(temp_dir.path())
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("capabilityDefaults"));
}

#[test]
fn verbose_flag_is_accepted_after_the_task() {
    let temp_dir = pipeline_root();

    baton(temp_dir.path())
        .args(["run", "default", "-v"])
        .assert()
        .success()
        .stderr(predicate::str::contains("pipeline ready"));
}

#[test]
fn global_flags_work_after_subcommands() {
    let temp_dir = pipeline_root();

    Command::cargo_bin("baton")
        .unwrap()
        .env("NO_COLOR", "1")
        .env_remove("BATON_LOG")
        .arg("list")
        .arg("--root")
        .arg(temp_dir.path())
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build the site"))
        .stderr(predicate::str::contains("pipeline ready"));
}

#[test]
fn missing_pipeline_fails_to_load() {
    let temp_dir = tempfile::tempdir().unwrap();

    baton(temp_dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load pipeline"));
}
