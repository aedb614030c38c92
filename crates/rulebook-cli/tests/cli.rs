//! Command tests over temporary rulebook, settings and batch files

use pretty_assertions::assert_eq;
use rulebook_cli::{build_command, execute, load_settings, read_batch, read_rulebook, PolicyInputs};
use rulebook_compliance::{ComplianceReport, ScenarioRecord};
use rulebook_policy::{RulebookSource, ScenarioKind};
use rulebook_test_utils::{happy_get, ASSERTION_RULEBOOK, STEP_RULEBOOK};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keywords.txt"), STEP_RULEBOOK).unwrap();
        fs::write(dir.path().join("assertions.txt"), ASSERTION_RULEBOOK).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn write_batch(&self, records: &[ScenarioRecord]) -> PathBuf {
        self.write("batch.json", &serde_json::to_string(records).unwrap())
    }

    fn run(&self, args: &[&str]) -> (bool, String) {
        let steps = self.path("keywords.txt");
        let assertions = self.path("assertions.txt");
        let mut argv: Vec<String> = vec!["rulebook-lint".into()];
        argv.extend(args.iter().map(ToString::to_string));
        argv.extend([
            "--steps".into(),
            steps.display().to_string(),
            "--assertions".into(),
            assertions.display().to_string(),
        ]);
        let matches = build_command().try_get_matches_from(argv).unwrap();
        let mut out = Vec::new();
        let clean = execute(&matches, &mut out).unwrap();
        (clean, String::from_utf8(out).unwrap())
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn missing_rulebook_is_absent() {
    let ws = Workspace::new();
    assert_eq!(read_rulebook(&ws.path("nope.txt")), RulebookSource::Absent);
    assert!(read_rulebook(&ws.path("keywords.txt")).is_present());
}

#[test]
fn policy_inputs_tolerate_missing_rulebooks() {
    let ws = Workspace::new();
    let policy = PolicyInputs::new(ws.path("missing-steps.txt"), ws.path("assertions.txt"))
        .load()
        .unwrap();
    assert!(policy.step_patterns().is_empty());
    assert_eq!(policy.assertion_patterns().len(), 4);
}

#[test]
fn policy_inputs_apply_settings_file() {
    let ws = Workspace::new();
    let settings = ws.write("policy.yaml", "status_matrix:\n  get:\n    happy: [299]\n");
    let policy = PolicyInputs::new(ws.path("keywords.txt"), ws.path("assertions.txt"))
        .with_settings(&settings)
        .load()
        .unwrap();
    assert_eq!(policy.allowed_statuses("GET", ScenarioKind::Happy), &[299]);
    assert_eq!(policy.checklist_targets().get(ScenarioKind::Edge), Some(4));
}

#[test]
fn settings_format_follows_extension() {
    let ws = Workspace::new();
    let yaml = ws.write("policy.yaml", "checklist_targets:\n  happy: 1\n");
    let toml = ws.write("policy.toml", "[checklist_targets]\nhappy = 1\n");
    let json = ws.write("policy.json", r#"{"checklist_targets": {"happy": 1}}"#);
    for path in [yaml, toml, json] {
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.checklist_targets.get(ScenarioKind::Happy), Some(1), "{}", path.display());
    }
}

#[test]
fn bad_settings_are_errors() {
    let ws = Workspace::new();
    let unknown = ws.write("policy.ini", "x=1");
    assert!(load_settings(Some(&unknown)).is_err());
    let broken = ws.write("policy.json", "{not json");
    let message = format!("{:#}", load_settings(Some(&broken)).unwrap_err());
    assert!(message.contains("invalid settings"), "{message}");
    assert!(load_settings(None).is_ok());
}

#[test]
fn batch_must_be_an_array_of_records() {
    let ws = Workspace::new();
    let bad = ws.write("bad.json", r#"{"endpoint": {}}"#);
    assert!(read_batch(&bad).is_err());
    let good = ws.write_batch(&[happy_get("/users", 200)]);
    assert_eq!(read_batch(&good).unwrap().len(), 1);
}

#[test]
fn compile_prints_fingerprint_and_patterns() {
    let ws = Workspace::new();
    let (clean, out) = ws.run(&["compile", "--json"]);
    assert!(clean);
    let summary: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(summary["fingerprint"].as_str().map(str::len), Some(64));
    assert_eq!(summary["steps"]["templates"].as_array().map(Vec::len), Some(6));
    assert_eq!(summary["assertions"]["templates"][0], "status <expected_status_code>");

    let (_, text) = ws.run(&["compile"]);
    assert!(text.contains("step templates (6):"));
}

#[test]
fn check_reports_issues_and_exit_status() {
    let ws = Workspace::new();
    let targets = ws.write("policy.toml", "[checklist_targets]\n");
    let clean_batch = ws.write_batch(&[happy_get("/users", 200)]);
    let (clean, out) = ws.run(&["check", "--batch", &display(&clean_batch), "--policy", &display(&targets)]);
    assert!(clean, "{out}");
    assert!(out.contains("1 scenarios checked, 0 issues"), "{out}");

    let dirty_batch = ws.write_batch(&[happy_get("/users", 404)]);
    let (clean, out) = ws.run(&[
        "check",
        "--batch",
        &display(&dirty_batch),
        "--policy",
        &display(&targets),
        "--json",
        "--sequential",
    ]);
    assert!(!clean);
    let report: ComplianceReport = serde_json::from_str(&out).unwrap();
    assert_eq!(report.issue_count(), 1);
}

#[test]
fn check_writes_canonical_batch() {
    let ws = Workspace::new();
    let batch = ws.write_batch(&[happy_get("/users", 200)]);
    let output = ws.path("canonical.json");
    ws.run(&["check", "--batch", &display(&batch), "--output", &display(&output)]);
    let records = read_batch(&output).unwrap();
    assert!(records[0].canonical_text.is_some());
}

#[test]
fn check_requires_batch() {
    assert!(build_command().try_get_matches_from(["rulebook-lint", "check"]).is_err());
    assert!(build_command().try_get_matches_from(["rulebook-lint"]).is_err());
}
