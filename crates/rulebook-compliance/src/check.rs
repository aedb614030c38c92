//! Per-scenario check trait
//!
//! Every check reads a normalized record and returns issues. Checks hold no
//! per-scenario state, so one instance is shared across worker threads.

use crate::issue::{Issue, ScenarioContext};
use crate::scenario::ScenarioRecord;

/// A check run on each scenario after normalization
pub trait ScenarioCheck: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &'static str;

    /// Issues for one record; `record.text()` is the text to inspect
    fn check(&self, record: &ScenarioRecord, context: &ScenarioContext) -> Vec<Issue>;
}
