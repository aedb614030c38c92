//! Vocabulary linter
//!
//! Scans scenario text line by line. `And` is resolved against the block it
//! continues: after `Then` it must read as an assertion, otherwise as a step.
//! The block state is an explicit two-value enum reset on every header line.

use crate::check::ScenarioCheck;
use crate::docstring;
use crate::issue::{Issue, IssueCategory, ScenarioContext};
use crate::scenario::ScenarioRecord;
use rulebook_policy::{CompiledTemplates, Keyword, Policy};

/// Longest line excerpt quoted in a diagnostic
const EXCERPT_CHARS: usize = 40;

/// Which template set an `And` line continues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockState {
    /// Setup and action steps
    #[default]
    Normal,
    /// Assertions after a `Then`
    Asserting,
}

/// Block-aware keyword and template checker
#[derive(Debug, Clone, Copy)]
pub struct VocabularyLinter<'p> {
    policy: &'p Policy,
}

impl<'p> VocabularyLinter<'p> {
    /// Create new linter over a compiled policy
    #[inline]
    #[must_use]
    pub fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    /// Lint one scenario text. At most one issue per line.
    #[must_use]
    pub fn lint(&self, text: &str, context: &ScenarioContext) -> Vec<Issue> {
        let lines: Vec<&str> = text.lines().collect();
        let roles = docstring::scan(&lines);
        let mut state = BlockState::Normal;
        let mut issues = Vec::new();

        for (index, (line, role)) in lines.iter().zip(roles).enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || role.in_docstring() {
                continue;
            }
            let line_no = index + 1;
            let (next, problem) = self.classify(trimmed, state);
            state = next;
            if let Some(problem) = problem {
                let message = format!(
                    "{problem} in scenario ({context}) at L{line_no}: '{}'",
                    excerpt(trimmed)
                );
                issues.push(Issue::new(IssueCategory::Vocabulary, context, Some(line_no), message));
            }
        }

        if !issues.is_empty() {
            tracing::debug!("{} vocabulary issues in {}", issues.len(), context);
        }
        issues
    }

    /// Next block state and the problem with the line, if any
    fn classify(&self, line: &str, state: BlockState) -> (BlockState, Option<String>) {
        let Some((keyword, _)) = Keyword::detect(line) else {
            return (state, Some("Non-Gherkin line".to_string()));
        };

        let next = match keyword {
            Keyword::Feature | Keyword::Background | Keyword::Scenario | Keyword::Given | Keyword::When => {
                BlockState::Normal
            }
            Keyword::Then => BlockState::Asserting,
            Keyword::And => state,
        };

        if !self.policy.is_keyword_allowed(keyword) {
            return (next, Some(format!("Disallowed keyword '{keyword}'")));
        }

        let assertions = self.policy.assertions();
        let steps = self.policy.steps();
        let problem = match keyword {
            Keyword::Feature | Keyword::Background | Keyword::Scenario => None,
            Keyword::Given | Keyword::When => unmatched(steps, line, "Step not in rulebook"),
            Keyword::Then => unmatched(assertions, line, "Assertion not in rulebook"),
            Keyword::And => match state {
                BlockState::Asserting => unmatched(
                    assertions,
                    line,
                    "'And' in assertion block must match an assertion template",
                ),
                BlockState::Normal => {
                    unmatched(steps, line, "'And' in step block must match a step template")
                }
            },
        };
        (next, problem)
    }
}

/// Problem text when a non-empty rulebook has no pattern for the line
fn unmatched(rulebook: &CompiledTemplates, line: &str, problem: &str) -> Option<String> {
    (!rulebook.is_empty() && !rulebook.matches(line)).then(|| problem.to_string())
}

fn excerpt(line: &str) -> String {
    if line.chars().count() > EXCERPT_CHARS {
        let head: String = line.chars().take(EXCERPT_CHARS).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}

impl ScenarioCheck for VocabularyLinter<'_> {
    fn name(&self) -> &'static str {
        "vocabulary"
    }

    fn check(&self, record: &ScenarioRecord, context: &ScenarioContext) -> Vec<Issue> {
        self.lint(record.text(), context)
    }
}
