//! Testing utilities for the rulebook workspace
//!
//! Shared rulebooks, endpoints and scenario builders.

#![allow(missing_docs)]

use rulebook_compliance::{EndpointDescriptor, ScenarioRecord};
use rulebook_policy::{ChecklistTargets, Policy, PolicySettings, RulebookSource, ScenarioKind};
use serde_json::{json, Value};

pub const STEP_RULEBOOK: &str = "\
# Step rulebook
1. Given endpoint <url>
2. Given url <url>
3. method <method> - send the request
4. header <header_name> = <value>
5. request
6. param <query_param_name> = <query_param_value>
* def helpers are not steps
";

pub const ASSERTION_RULEBOOK: &str = "\
# Assertion rulebook
status <expected_status_code>
response status should be <expected_status_code>
match <json_path> == <value>
match <JSON_path> contains <string_message>
";

pub const HOST: &str = "api.example.com";

pub fn sample_policy() -> Policy {
    Policy::from_rulebooks(STEP_RULEBOOK, ASSERTION_RULEBOOK)
}

/// Policy with every checklist target removed
pub fn policy_without_targets() -> Policy {
    Policy::compile(
        &RulebookSource::present(STEP_RULEBOOK),
        &RulebookSource::present(ASSERTION_RULEBOOK),
        PolicySettings::default().with_checklist_targets(ChecklistTargets::empty()),
    )
}

pub fn get_endpoint(path: &str) -> EndpointDescriptor {
    EndpointDescriptor::new("GET", path).with_host(HOST)
}

pub fn post_endpoint(path: &str, body: Value) -> EndpointDescriptor {
    EndpointDescriptor::new("POST", path)
        .with_host(HOST)
        .with_request_body(body)
}

pub fn sample_body() -> Value {
    json!({
        "name": "Ada",
        "roles": ["admin", "dev"],
        "profile": {"age": 36, "active": true}
    })
}

/// `Feature:`/`Scenario:` wrapper around indented step lines
pub fn scenario_text(steps: &[&str]) -> String {
    let mut text = String::from("Feature: Generated\n  Scenario: generated case\n");
    for step in steps {
        text.push_str("    ");
        text.push_str(step);
        text.push('\n');
    }
    text
}

pub fn record(endpoint: EndpointDescriptor, kind: ScenarioKind, steps: &[&str]) -> ScenarioRecord {
    ScenarioRecord::new(endpoint, kind, scenario_text(steps))
}

pub fn happy_get(path: &str, status: u16) -> ScenarioRecord {
    let endpoint_line = format!("Given endpoint \"https://{HOST}{path}\"");
    let status_line = format!("Then status {status}");
    record(
        get_endpoint(path),
        ScenarioKind::Happy,
        &[endpoint_line.as_str(), "When method GET", status_line.as_str()],
    )
}

/// A batch meeting the default checklist targets (3 happy, 3 error, 4 edge)
pub fn full_batch() -> Vec<ScenarioRecord> {
    let mut batch = Vec::new();
    for _ in 0..3 {
        batch.push(happy_get("/users", 200));
    }
    for code in [400, 404, 500] {
        let status_line = format!("Then status {code}");
        batch.push(record(get_endpoint("/users/x"), ScenarioKind::Error, &["When method GET", status_line.as_str()]));
    }
    for code in [200, 400, 200, 400] {
        let status_line = format!("Then status {code}");
        batch.push(record(get_endpoint("/users"), ScenarioKind::Edge, &["When method GET", status_line.as_str()]));
    }
    batch
}
