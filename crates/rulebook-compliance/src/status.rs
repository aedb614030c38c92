//! Status consistency checker
//!
//! The first status-assertion line outside docstrings is authoritative.
//! Numbers anywhere else in the text are never read.

use crate::check::ScenarioCheck;
use crate::docstring;
use crate::issue::{Issue, IssueCategory, ScenarioContext};
use crate::scenario::ScenarioRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use rulebook_policy::Policy;

static STATUS_ASSERTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:Then|And)\s+(?:status|response\s+status\s+should\s+be)\s+(\d{3})\b")
        .expect("status regex is valid")
});

/// Status code asserted by a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusAssertion {
    /// 1-based line of the assertion
    pub line: usize,
    /// Asserted code
    pub code: u16,
}

/// First status assertion in `text`, skipping docstring content
#[must_use]
pub fn find_status_assertion(text: &str) -> Option<StatusAssertion> {
    let lines: Vec<&str> = text.lines().collect();
    let roles = docstring::scan(&lines);
    lines
        .iter()
        .zip(roles)
        .enumerate()
        .filter(|(_, (_, role))| !role.in_docstring())
        .find_map(|(index, (line, _))| {
            let caps = STATUS_ASSERTION.captures(line)?;
            let code = caps.get(1)?.as_str().parse().ok()?;
            Some(StatusAssertion {
                line: index + 1,
                code,
            })
        })
}

/// Checks the asserted status against the policy's status matrix
#[derive(Debug, Clone, Copy)]
pub struct StatusChecker<'p> {
    policy: &'p Policy,
}

impl<'p> StatusChecker<'p> {
    /// Create new checker over a compiled policy
    #[inline]
    #[must_use]
    pub fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    /// Check one scenario text. Returns zero or one issue.
    #[must_use]
    pub fn check(&self, text: &str, context: &ScenarioContext) -> Vec<Issue> {
        let Some(assertion) = find_status_assertion(text) else {
            let message = format!("No explicit status assertion found ({context}).");
            return vec![Issue::new(IssueCategory::Status, context, None, message)];
        };

        let allowed = self.policy.allowed_statuses(&context.method, context.kind);
        if allowed.is_empty() || allowed.contains(&assertion.code) {
            return Vec::new();
        }

        let listed: Vec<String> = allowed.iter().map(u16::to_string).collect();
        let message = format!(
            "Unexpected status {} for {} scenario ({}); allowed=[{}].",
            assertion.code,
            context.kind,
            context.endpoint(),
            listed.join(", ")
        );
        vec![Issue::new(IssueCategory::Status, context, Some(assertion.line), message)]
    }
}

impl ScenarioCheck for StatusChecker<'_> {
    fn name(&self) -> &'static str {
        "status"
    }

    fn check(&self, record: &ScenarioRecord, context: &ScenarioContext) -> Vec<Issue> {
        StatusChecker::check(self, record.text(), context)
    }
}
