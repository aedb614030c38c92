//! Compliance diagnostics
//!
//! Issues are advisory. Every checker returns them instead of failing, and
//! the pipeline only ever appends to the list.

use crate::scenario::ScenarioRecord;
use rulebook_policy::ScenarioKind;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Which check produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    /// Keyword or template mismatch
    Vocabulary,
    /// Asserted status missing or outside policy
    Status,
    /// Formal parse failure
    Grammar,
    /// Batch undercount for a scenario kind
    Checklist,
    /// A check faulted while processing a scenario
    Internal,
}

impl IssueCategory {
    /// Lower-case label
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            IssueCategory::Vocabulary => "vocabulary",
            IssueCategory::Status => "status",
            IssueCategory::Grammar => "grammar",
            IssueCategory::Checklist => "checklist",
            IssueCategory::Internal => "internal",
        }
    }
}

impl Display for IssueCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the scenario an issue belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioContext {
    /// Upper-case HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Scenario intent
    pub kind: ScenarioKind,
}

impl ScenarioContext {
    /// Create new context
    #[must_use]
    pub fn new(method: &str, path: impl Into<String>, kind: ScenarioKind) -> Self {
        Self {
            method: method.trim().to_ascii_uppercase(),
            path: path.into(),
            kind,
        }
    }

    /// `METHOD path` without the kind
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

impl From<&ScenarioRecord> for ScenarioContext {
    fn from(record: &ScenarioRecord) -> Self {
        Self::new(&record.endpoint.method, record.endpoint.path.clone(), record.kind)
    }
}

impl Display for ScenarioContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, {}", self.method, self.path, self.kind)
    }
}

/// One diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Producing check
    pub category: IssueCategory,
    /// Scenario identity; `None` for batch-level issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ScenarioContext>,
    /// 1-based line in the checked text, where one applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Rendered diagnostic
    pub message: String,
}

impl Issue {
    /// Create new scenario issue
    #[must_use]
    pub fn new(
        category: IssueCategory,
        context: &ScenarioContext,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            context: Some(context.clone()),
            line,
            message: message.into(),
        }
    }

    /// Create new batch-level issue
    #[must_use]
    pub fn batch(category: IssueCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            context: None,
            line: None,
            message: message.into(),
        }
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
