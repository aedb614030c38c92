//! Output rendering

use rulebook_policy::{CompiledTemplates, Policy};
use serde_json::{json, Value};
use std::fmt::Write as _;

fn templates_json(compiled: &CompiledTemplates) -> Value {
    let patterns: Vec<Value> = compiled
        .patterns()
        .iter()
        .map(|pattern| json!({"template": pattern.template(), "pattern": pattern.source()}))
        .collect();
    json!({
        "templates": compiled.templates(),
        "patterns": patterns,
    })
}

/// Compiled policy as JSON
#[must_use]
pub fn compile_summary(policy: &Policy) -> Value {
    let keywords: Vec<&str> = policy.allowed_keywords().iter().map(|k| k.as_str()).collect();
    json!({
        "fingerprint": policy.fingerprint().to_string(),
        "allowed_keywords": keywords,
        "steps": templates_json(policy.steps()),
        "assertions": templates_json(policy.assertions()),
    })
}

fn write_templates(out: &mut String, compiled: &CompiledTemplates) {
    let _ = writeln!(out, "{} templates ({}):", compiled.kind(), compiled.len());
    for pattern in compiled.patterns() {
        let _ = writeln!(out, "  {}", pattern.template());
        let _ = writeln!(out, "    {}", pattern.source());
    }
}

/// Compiled policy as plain text
#[must_use]
pub fn render_compile_text(policy: &Policy) -> String {
    let mut out = String::new();
    let keywords: Vec<&str> = policy.allowed_keywords().iter().map(|k| k.as_str()).collect();
    let _ = writeln!(out, "Policy {}", policy.fingerprint());
    let _ = writeln!(out, "Allowed keywords: {}", keywords.join(", "));
    write_templates(&mut out, policy.steps());
    write_templates(&mut out, policy.assertions());
    out
}
