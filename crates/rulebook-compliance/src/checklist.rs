//! Checklist verifier
//!
//! Batch-level barrier: runs once every scenario's kind is final.

use crate::issue::{Issue, IssueCategory};
use crate::scenario::ScenarioRecord;
use rulebook_policy::{Policy, ScenarioKind};
use std::collections::BTreeMap;

/// Compares per-kind scenario counts with the policy's minimums
#[derive(Debug, Clone, Copy)]
pub struct ChecklistVerifier<'p> {
    policy: &'p Policy,
}

impl<'p> ChecklistVerifier<'p> {
    /// Create new verifier over a compiled policy
    #[inline]
    #[must_use]
    pub fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    /// One issue per kind whose count is below its target
    #[must_use]
    pub fn verify(&self, records: &[ScenarioRecord]) -> Vec<Issue> {
        self.verify_kinds(records.iter().map(|r| r.kind))
    }

    /// Same as [`Self::verify`] over bare kinds
    #[must_use]
    pub fn verify_kinds(&self, kinds: impl IntoIterator<Item = ScenarioKind>) -> Vec<Issue> {
        let mut counts: BTreeMap<ScenarioKind, usize> = BTreeMap::new();
        for kind in kinds {
            *counts.entry(kind).or_default() += 1;
        }

        self.policy
            .checklist_targets()
            .iter()
            .filter_map(|(kind, target)| {
                let found = counts.get(&kind).copied().unwrap_or(0);
                (found < target).then(|| {
                    Issue::batch(
                        IssueCategory::Checklist,
                        format!("Checklist: need at least {target} '{kind}' scenarios, found {found}."),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulebook_policy::{ChecklistTargets, PolicySettings, RulebookSource};
    use ScenarioKind::{Edge, Error, Happy};

    fn policy(targets: ChecklistTargets) -> Policy {
        Policy::compile(
            &RulebookSource::Absent,
            &RulebookSource::Absent,
            PolicySettings::default().with_checklist_targets(targets),
        )
    }

    #[test]
    fn reports_shortfalls_in_kind_order() {
        let policy = policy(ChecklistTargets::default());
        let issues = ChecklistVerifier::new(&policy).verify_kinds([Edge, Happy, Happy, Happy]);
        let messages: Vec<_> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "Checklist: need at least 3 'error' scenarios, found 0.",
                "Checklist: need at least 4 'edge' scenarios, found 1.",
            ]
        );
        assert!(issues.iter().all(|i| i.context.is_none()));
    }

    #[test]
    fn met_targets_are_silent() {
        let policy = policy(ChecklistTargets::empty().with(Error, 1));
        assert!(ChecklistVerifier::new(&policy).verify_kinds([Error]).is_empty());
    }

    #[test]
    fn no_targets_no_issues() {
        let policy = policy(ChecklistTargets::empty());
        assert!(ChecklistVerifier::new(&policy).verify(&[]).is_empty());
    }
}
