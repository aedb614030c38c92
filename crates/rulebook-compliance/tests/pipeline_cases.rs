//! End-to-end pipeline cases

use pretty_assertions::assert_eq;
use rulebook_compliance::{
    CompliancePipeline, EndpointDescriptor, Issue, IssueCategory, PipelineOptions, ScenarioCheck,
    ScenarioContext, ScenarioRecord,
};
use rulebook_policy::{ChecklistTargets, Policy, PolicySettings, RulebookSource, ScenarioKind};
use rulebook_test_utils::{
    full_batch, happy_get, policy_without_targets, post_endpoint, sample_body, sample_policy,
};

const CASE_STEPS: &str = "Given endpoint <url>\nmethod <method>\n";
const CASE_ASSERTIONS: &str = "Then status <expected_status_code>\n";

fn case_policy() -> Policy {
    Policy::compile(
        &RulebookSource::present(CASE_STEPS),
        &RulebookSource::present(CASE_ASSERTIONS),
        PolicySettings::default().with_checklist_targets(ChecklistTargets::empty()),
    )
}

fn case_record(extra_step: Option<&str>, status: u16) -> ScenarioRecord {
    let mut text = String::from("Feature: X\nScenario: Y\nGiven endpoint \"http://h/p\"\n");
    if let Some(step) = extra_step {
        text.push_str(step);
        text.push('\n');
    }
    text.push_str(&format!("When method GET\nThen status {status}\n"));
    ScenarioRecord::new(EndpointDescriptor::new("GET", "/p"), ScenarioKind::Happy, text)
}

fn run_one(policy: &Policy, record: ScenarioRecord) -> Vec<Issue> {
    let mut batch = vec![record];
    let report = CompliancePipeline::new(policy).run(&mut batch);
    report.issues().cloned().collect()
}

#[test]
fn case_a_compliant_scenario_is_clean() {
    let policy = case_policy();
    let mut batch = vec![case_record(None, 200)];
    let report = CompliancePipeline::new(&policy).run(&mut batch);
    assert!(report.is_clean(), "{}", report.render_text());
    assert_eq!(
        batch[0].text(),
        "Feature: X\nScenario: Y\nGiven endpoint \"http://h/p\"\nWhen method GET\nThen status 200\n"
    );
}

#[test]
fn case_b_unexpected_status_is_one_issue() {
    let issues = run_one(&case_policy(), case_record(None, 404));
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].category, IssueCategory::Status);
    assert!(issues[0].message.contains("allowed=[200]"), "{}", issues[0]);
}

#[test]
fn case_c_unknown_step_does_not_stop_status_check() {
    let issues = run_one(&case_policy(), case_record(Some("Given I do something weird"), 404));
    let vocabulary: Vec<_> = issues.iter().filter(|i| i.category == IssueCategory::Vocabulary).collect();
    assert_eq!(vocabulary.len(), 1);
    assert!(vocabulary[0].message.starts_with("Step not in rulebook"));
    assert_eq!(vocabulary[0].line, Some(4));
    assert_eq!(issues.iter().filter(|i| i.category == IssueCategory::Status).count(), 1);
    assert_eq!(issues.len(), 2);
}

#[test]
fn case_d_body_example_is_inserted_once() {
    let body = sample_body();
    let record = ScenarioRecord::new(
        post_endpoint("/users", body.clone()),
        ScenarioKind::Happy,
        "Feature: Users\n  Scenario: create\n    Given endpoint \"/users\"\n    Then status 201\n",
    );
    let mut batch = vec![record];
    CompliancePipeline::new(&sample_policy()).run(&mut batch);
    let text = batch[0].text();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.iter().filter(|l| l.contains("Content-Type")).count(), 1);
    let delimiters: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.trim() == "\"\"\"")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(delimiters.len(), 2);

    let inner = lines[delimiters[0] + 1..delimiters[1]].join("\n");
    let parsed: serde_json::Value = serde_json::from_str(&inner).unwrap();
    assert_eq!(parsed, body);
    assert!(text.contains("Given endpoint \"https://api.example.com/users\""));
}

#[test]
fn matrix_codes_inside_pass_and_outside_fail() {
    let policy = sample_policy();
    for (method, kind, codes) in policy.status_matrix().iter() {
        let endpoint = EndpointDescriptor::new(method, "/m");
        for &code in codes {
            let mut batch = vec![ScenarioRecord::new(endpoint.clone(), kind, format!("Then status {code}"))];
            let report = CompliancePipeline::new(&policy).run(&mut batch);
            assert_eq!(report.issues_in(IssueCategory::Status).count(), 0, "{method} {kind} {code}");
        }
        let mut batch = vec![ScenarioRecord::new(endpoint.clone(), kind, "Then status 299")];
        let report = CompliancePipeline::new(&policy).run(&mut batch);
        assert_eq!(report.issues_in(IssueCategory::Status).count(), 1, "{method} {kind} 299");
    }
}

#[test]
fn absent_rulebooks_only_enforce_keywords() {
    let policy = Policy::compile(&RulebookSource::Absent, &RulebookSource::Absent, PolicySettings::default());
    assert!(policy.step_patterns().is_empty());
    assert!(policy.assertion_patterns().is_empty());
    let issues = run_one(
        &policy,
        ScenarioRecord::new(
            EndpointDescriptor::new("GET", "/p"),
            ScenarioKind::Happy,
            "Feature: F\nScenario: S\nGiven anything at all\nWhen method GET\nThen status 200\nAnd whatever\n",
        ),
    );
    assert_eq!(issues.iter().filter(|i| i.category == IssueCategory::Vocabulary).count(), 0);
}

#[test]
fn full_batch_is_clean_and_ordered() {
    let policy = sample_policy();
    let mut batch = full_batch();
    let report = CompliancePipeline::new(&policy).run(&mut batch);
    assert!(report.is_clean(), "{}", report.render_text());
    let indexes: Vec<usize> = report.scenarios.iter().map(|o| o.index).collect();
    assert_eq!(indexes, (0..batch.len()).collect::<Vec<_>>());
}

#[test]
fn single_scenario_is_clean_without_targets() {
    let policy = policy_without_targets();
    let mut batch = vec![happy_get("/users", 200)];
    let report = CompliancePipeline::new(&policy).run(&mut batch);
    assert!(report.is_clean(), "{}", report.render_text());
    assert!(report.batch_issues.is_empty());
}

#[test]
fn parallel_and_sequential_reports_match() {
    let policy = sample_policy();
    let mut batch = full_batch();
    batch.push(happy_get("/users", 404));
    let mut copy = batch.clone();

    let parallel = CompliancePipeline::new(&policy).run(&mut batch);
    let sequential = CompliancePipeline::new(&policy)
        .with_options(PipelineOptions::sequential())
        .run(&mut copy);
    assert_eq!(parallel, sequential);
    assert_eq!(batch, copy);
}

#[test]
fn checklist_issues_follow_scenario_issues() {
    let policy = sample_policy();
    let mut batch = vec![happy_get("/users", 404)];
    let report = CompliancePipeline::new(&policy).run(&mut batch);
    let categories: Vec<IssueCategory> = report.issues().map(|i| i.category).collect();
    assert_eq!(
        categories,
        vec![
            IssueCategory::Status,
            IssueCategory::Checklist,
            IssueCategory::Checklist,
            IssueCategory::Checklist,
        ]
    );
}

#[test]
fn report_round_trips_through_json() {
    let policy = sample_policy();
    let mut batch = vec![happy_get("/users", 404)];
    let report = CompliancePipeline::new(&policy).run(&mut batch);
    let json = serde_json::to_string(&report).unwrap();
    let back: rulebook_compliance::ComplianceReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
    assert_eq!(back.policy_fingerprint, policy.fingerprint().to_string());
}

struct PanicsOn(&'static str);

impl ScenarioCheck for PanicsOn {
    fn name(&self) -> &'static str {
        "exploding"
    }

    fn check(&self, record: &ScenarioRecord, _context: &ScenarioContext) -> Vec<Issue> {
        assert!(record.endpoint.path != self.0, "boom on {}", self.0);
        Vec::new()
    }
}

#[test]
fn panicking_scenario_keeps_other_outcomes() {
    let policy = sample_policy();
    for options in [PipelineOptions::default(), PipelineOptions::sequential()] {
        let mut batch = vec![happy_get("/a", 200), happy_get("/boom", 200), happy_get("/c", 404)];
        let report = CompliancePipeline::new(&policy)
            .with_check(PanicsOn("/boom"))
            .with_options(options)
            .run(&mut batch);

        assert_eq!(report.scenarios.len(), 3);
        assert!(report.scenarios[0].issues.is_empty());
        let internal = &report.scenarios[1].issues;
        assert_eq!(internal.len(), 1);
        assert_eq!(internal[0].category, IssueCategory::Internal);
        assert!(internal[0].message.contains("boom on /boom"), "{}", internal[0]);
        assert_eq!(report.scenarios[2].issues.len(), 1);
        assert_eq!(report.scenarios[2].issues[0].category, IssueCategory::Status);
    }
}
