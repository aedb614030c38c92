//! Compliance pipeline
//!
//! ```text
//! records ─┬─ normalize → lint → status → grammar ─┐
//!          ├─ normalize → lint → status → grammar ─┼─ merge by index → checklist → report
//!          └─ …                                    ─┘
//! ```
//!
//! Per-scenario work fans out over rayon. A panic inside one scenario is
//! caught and reported as an `Internal` issue for that scenario only.

use crate::check::ScenarioCheck;
use crate::checklist::ChecklistVerifier;
use crate::grammar::GrammarValidator;
use crate::issue::{Issue, IssueCategory, ScenarioContext};
use crate::linter::VocabularyLinter;
use crate::normalizer::{NormalizerConfig, StructuralNormalizer};
use crate::scenario::ScenarioRecord;
use crate::status::StatusChecker;
use rayon::prelude::*;
use rulebook_policy::Policy;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Process scenarios on the rayon pool
    pub parallel: bool,
    /// Run the grammar validator
    pub validate_grammar: bool,
    /// Structural normalizer settings
    pub normalizer: NormalizerConfig,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            validate_grammar: true,
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl PipelineOptions {
    /// Process scenarios one after another
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Toggle the grammar validator
    #[must_use]
    pub fn with_grammar(mut self, enabled: bool) -> Self {
        self.validate_grammar = enabled;
        self
    }

    /// Replace the normalizer settings
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.normalizer = normalizer;
        self
    }
}

/// Result for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Position in the input batch
    pub index: usize,
    /// Normalized text the checks ran on
    pub canonical_text: String,
    /// Issues in check order
    pub issues: Vec<Issue>,
}

/// Result for a whole batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Fingerprint of the policy the batch was checked against
    pub policy_fingerprint: String,
    /// Outcomes in input order
    pub scenarios: Vec<ScenarioOutcome>,
    /// Checklist issues
    pub batch_issues: Vec<Issue>,
}

impl ComplianceReport {
    /// Scenario issues in index order, then batch issues
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.scenarios
            .iter()
            .flat_map(|outcome| outcome.issues.iter())
            .chain(self.batch_issues.iter())
    }

    /// Total number of issues
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.issues().count()
    }

    /// Whether no check reported anything
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues().next().is_none()
    }

    /// Issues of one category
    pub fn issues_in(&self, category: IssueCategory) -> impl Iterator<Item = &Issue> {
        self.issues().filter(move |issue| issue.category == category)
    }

    /// Plain-text rendering, one issue per line plus a summary
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for issue in self.issues() {
            let _ = writeln!(out, "[{}] {}", issue.category, issue);
        }
        let _ = writeln!(
            out,
            "{} scenarios checked, {} issues (policy {})",
            self.scenarios.len(),
            self.issue_count(),
            self.policy_fingerprint.get(..16).unwrap_or(self.policy_fingerprint.as_str())
        );
        out
    }
}

/// Runs normalization, per-scenario checks and the checklist over a batch
pub struct CompliancePipeline<'p> {
    policy: &'p Policy,
    options: PipelineOptions,
    normalizer: StructuralNormalizer,
    checks: Vec<Box<dyn ScenarioCheck + 'p>>,
}

impl<'p> CompliancePipeline<'p> {
    /// Create new pipeline with default options
    #[must_use]
    pub fn new(policy: &'p Policy) -> Self {
        Self::build(policy, PipelineOptions::default())
    }

    /// Rebuild with the given options
    #[must_use]
    pub fn with_options(self, options: PipelineOptions) -> Self {
        let builtin = self.builtin_count();
        let extra: Vec<_> = self.checks.into_iter().skip(builtin).collect();
        let mut rebuilt = Self::build(self.policy, options);
        rebuilt.checks.extend(extra);
        rebuilt
    }

    /// Append a custom check after the built-in ones
    #[must_use]
    pub fn with_check(mut self, check: impl ScenarioCheck + 'p) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    fn build(policy: &'p Policy, options: PipelineOptions) -> Self {
        let mut checks: Vec<Box<dyn ScenarioCheck + 'p>> = vec![
            Box::new(VocabularyLinter::new(policy)),
            Box::new(StatusChecker::new(policy)),
        ];
        if options.validate_grammar {
            checks.push(Box::new(GrammarValidator::new()));
        }
        Self {
            policy,
            normalizer: StructuralNormalizer::new(options.normalizer.clone()),
            options,
            checks,
        }
    }

    fn builtin_count(&self) -> usize {
        if self.options.validate_grammar {
            3
        } else {
            2
        }
    }

    /// Options in use
    #[inline]
    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Check a batch, writing each record's canonical text.
    ///
    /// Never fails: every problem, including a panicking check, ends up in
    /// the report.
    pub fn run(&self, records: &mut [ScenarioRecord]) -> ComplianceReport {
        let fingerprint = self.policy.fingerprint();
        tracing::info!(
            "Checking {} scenarios against policy {} ({})",
            records.len(),
            fingerprint.short(),
            if self.options.parallel { "parallel" } else { "sequential" }
        );

        let mut scenarios: Vec<ScenarioOutcome> = if self.options.parallel {
            records
                .par_iter_mut()
                .enumerate()
                .map(|(index, record)| self.process(index, record))
                .collect()
        } else {
            records
                .iter_mut()
                .enumerate()
                .map(|(index, record)| self.process(index, record))
                .collect()
        };
        scenarios.sort_by_key(|outcome| outcome.index);

        let batch_issues = ChecklistVerifier::new(self.policy).verify(records);
        let report = ComplianceReport {
            policy_fingerprint: fingerprint.to_string(),
            scenarios,
            batch_issues,
        };
        tracing::info!(
            "Checked {} scenarios: {} issues",
            report.scenarios.len(),
            report.issue_count()
        );
        report
    }

    fn process(&self, index: usize, record: &mut ScenarioRecord) -> ScenarioOutcome {
        let context = ScenarioContext::from(&*record);
        let mut issues = Vec::new();

        let normalized = panic::catch_unwind(AssertUnwindSafe(|| {
            self.normalizer.normalize_record(record);
        }));
        if let Err(payload) = normalized {
            issues.push(internal_issue(&context, "normalizer", payload.as_ref()));
        }

        for check in &self.checks {
            let result = panic::catch_unwind(AssertUnwindSafe(|| check.check(record, &context)));
            match result {
                Ok(found) => issues.extend(found),
                Err(payload) => issues.push(internal_issue(&context, check.name(), payload.as_ref())),
            }
        }

        tracing::debug!("Scenario {} ({}): {} issues", index, context, issues.len());
        ScenarioOutcome {
            index,
            canonical_text: record.text().to_string(),
            issues,
        }
    }
}

fn internal_issue(context: &ScenarioContext, stage: &str, payload: &(dyn Any + Send)) -> Issue {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::warn!("{} check panicked on {}: {}", stage, context, reason);
    Issue::new(
        IssueCategory::Internal,
        context,
        None,
        format!("Internal error in {stage} check for scenario ({context}): {reason}"),
    )
}
