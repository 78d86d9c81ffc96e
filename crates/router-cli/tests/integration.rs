#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Project with one Python source file and a framework directory holding
/// a few command docs.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("login.py"), "def login():\n    pass\n").unwrap();
    let commands = dir.path().join(".claude/commands");
    std::fs::create_dir_all(&commands).unwrap();
    for name in ["auto", "feature", "query", "task"] {
        std::fs::write(commands.join(format!("{name}.md")), format!("# {name}\n")).unwrap();
    }
    dir
}

fn router(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("router").unwrap();
    cmd.current_dir(dir.path())
        .env("ROUTER_ROOT", dir.path())
        .env("ROUTER_FRAMEWORK", dir.path().join(".claude"))
        .env_remove("RUST_LOG");
    cmd
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// recommend / explain / analyze / rules
// ---------------------------------------------------------------------------

#[test]
fn recommend_bug_fix_in_small_project() {
    let dir = project();
    router(&dir)
        .args(["recommend", "Fix the login bug"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/task"))
        .stdout(predicate::str::contains("bug_fix_detected"));
}

#[test]
fn recommend_json_is_well_formed() {
    let dir = project();
    let rec = json_output(router(&dir).args(["--json", "recommend", "Fix the login bug"]));
    assert_eq!(rec["command"], "/task");
    let confidence = rec["confidence"].as_f64().unwrap();
    assert!(confidence > 0.5 && confidence <= 1.0);
    assert_eq!(rec["parameters"]["file_count"], 1);
}

#[test]
fn recommend_unknown_request_falls_back_to_auto() {
    let dir = project();
    let rec = json_output(router(&dir).args(["-j", "recommend", "xyzzy plugh"]));
    assert_eq!(rec["command"], "/auto");
}

#[test]
fn recommend_max_lists_ranked_results() {
    let dir = project();
    let recs = json_output(router(&dir).args([
        "-j",
        "recommend",
        "fix the bug and add a new feature",
        "--max",
        "3",
    ]));
    let recs = recs.as_array().unwrap();
    assert!(!recs.is_empty() && recs.len() <= 3);
    let confidences: Vec<f64> = recs
        .iter()
        .map(|r| r["confidence"].as_f64().unwrap())
        .collect();
    assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn explain_reports_project_context() {
    let dir = project();
    router(&dir)
        .args(["explain", "Fix the login bug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyzed input 'Fix the login bug'"))
        .stdout(predicate::str::contains("1 files"));
}

#[test]
fn analyze_counts_sources_and_commands() {
    let dir = project();
    let signals = json_output(router(&dir).args(["-j", "analyze"]));
    assert_eq!(signals["file_count"], 1);
    assert_eq!(signals["languages"]["python"], 1);

    router(&dir)
        .arg("analyze")
        .assert()
        .success()
        .stdout(predicate::str::contains("/auto, /feature, /query, /task"));
}

#[test]
fn rules_listed_in_priority_order() {
    let dir = project();
    let rules = json_output(router(&dir).args(["-j", "rules"]));
    let priorities: Vec<i64> = rules
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["priority"].as_i64().unwrap())
        .collect();
    assert!(priorities.len() >= 2);
    assert!(priorities.windows(2).all(|w| w[0] >= w[1]));

    router(&dir)
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("PRIORITY"));
}

// ---------------------------------------------------------------------------
// simulate / guide / scenarios / tree
// ---------------------------------------------------------------------------

#[test]
fn simulate_small_change_walks_to_task() {
    let dir = project();
    router(&dir)
        .args(["simulate", "--file-count", "1", "--lines", "20"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/task  (confidence 0.90)"))
        .stdout(predicate::str::contains(
            "root -> complexity_check -> simple_analysis -> task_recommendation",
        ));
}

#[test]
fn simulate_production_work_json() {
    let dir = project();
    let path = json_output(router(&dir).args([
        "-j",
        "simulate",
        "--file-count",
        "3",
        "--lines",
        "50",
        "--production",
        "--safety-critical",
    ]));
    assert_eq!(path["final_recommendation"], "/protocol");
    assert_eq!(path["nodes"][0]["node_id"], "root");
    assert!(path["execution_time"].as_f64().unwrap() >= 0.0);
}

#[test]
fn guide_maps_answers_to_a_walk() {
    let dir = project();
    router(&dir)
        .args([
            "guide",
            "--purpose",
            "fix-bug",
            "--scope",
            "one",
            "--understanding",
            "clear",
            "--criticality",
            "development",
            "--time",
            "quick",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/task"));
}

#[test]
fn guide_rejects_unknown_answer() {
    let dir = project();
    router(&dir)
        .args([
            "guide",
            "--purpose",
            "juggle",
            "--scope",
            "one",
            "--understanding",
            "clear",
            "--criticality",
            "development",
            "--time",
            "quick",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("juggle"));
}

#[test]
fn scenarios_report_matches() {
    let dir = project();
    router(&dir)
        .arg("scenarios")
        .assert()
        .success()
        .stdout(predicate::str::contains("Simple Bug Fix"))
        .stdout(predicate::str::contains("Production Deployment"))
        .stdout(predicate::str::contains("6/6 matched"));

    let report = json_output(router(&dir).args(["-j", "scenarios"]));
    assert_eq!(report["scenarios"].as_array().unwrap().len(), 6);
    assert_eq!(report["analysis"]["total_paths"], 6);
}

#[test]
fn tree_prints_every_node() {
    let dir = project();
    router(&dir)
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("complexity_check"))
        .stdout(predicate::str::contains("auto_fallback"));

    let graph = json_output(router(&dir).args(["-j", "tree"]));
    assert_eq!(graph["order"][0], "root");
    assert_eq!(
        graph["nodes"].as_array().unwrap().len(),
        graph["order"].as_array().unwrap().len()
    );
}

// ---------------------------------------------------------------------------
// feedback
// ---------------------------------------------------------------------------

#[test]
fn feedback_persists_and_adjusts_confidence() {
    let dir = project();
    let before = json_output(router(&dir).args(["-j", "recommend", "Fix the login bug"]));

    router(&dir)
        .args([
            "feedback",
            "add",
            "--input",
            "Fix the login bug",
            "--recommended",
            "/task",
            "--rating",
            "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded: /task rated 5/5"));
    assert!(dir.path().join(".router/model.json").exists());

    let stats = json_output(router(&dir).args(["-j", "feedback", "stats"]));
    assert_eq!(stats["feedback_entries"], 1);
    assert_eq!(stats["average_rating"], 5.0);

    let after = json_output(router(&dir).args(["-j", "recommend", "Fix the login bug"]));
    assert_eq!(after["command"], "/task");
    assert!(after["confidence"].as_f64().unwrap() > before["confidence"].as_f64().unwrap());

    router(&dir)
        .args(["recommend", "Fix the login bug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("previously ran: /task"));
}

#[test]
fn feedback_rejects_out_of_range_rating() {
    let dir = project();
    router(&dir)
        .args([
            "feedback",
            "add",
            "--input",
            "Fix the login bug",
            "--recommended",
            "/task",
            "--rating",
            "9",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid feedback"));
    assert!(!dir.path().join(".router/model.json").exists());
}

#[test]
fn feedback_stats_without_history() {
    let dir = project();
    router(&dir)
        .args(["feedback", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("feedback entries: 0"))
        .stdout(predicate::str::contains("average rating:   -"));
}

#[test]
fn corrupt_model_is_ignored() {
    let dir = project();
    std::fs::create_dir_all(dir.path().join(".router")).unwrap();
    std::fs::write(dir.path().join(".router/model.json"), "{ not json").unwrap();
    router(&dir)
        .args(["recommend", "Fix the login bug"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/task"));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_init_then_validate() {
    let dir = project();
    router(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));
    assert!(dir.path().join(".router/config.yaml").exists());

    router(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    router(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid."));
}

#[test]
fn config_show_fills_defaults() {
    let dir = project();
    let config = json_output(router(&dir).args(["-j", "config", "show"]));
    assert_eq!(config["min_confidence"], 0.3);
    assert_eq!(config["max_results"], 5);
    assert_eq!(config["learning"]["boost"], 1.1);
}

#[test]
fn config_validate_fails_on_out_of_range_values() {
    let dir = project();
    std::fs::create_dir_all(dir.path().join(".router")).unwrap();
    std::fs::write(
        dir.path().join(".router/config.yaml"),
        "min_confidence: 2.0\n",
    )
    .unwrap();
    router(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] min_confidence"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn malformed_config_is_an_error() {
    let dir = project();
    std::fs::create_dir_all(dir.path().join(".router")).unwrap();
    std::fs::write(dir.path().join(".router/config.yaml"), "min_confidence: [").unwrap();
    router(&dir)
        .args(["recommend", "anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}
