//! Rulebook Compliance
//!
//! Checks generated scenarios against a compiled [`Policy`](rulebook_policy::Policy).
//!
//! # Stages
//!
//! - **Normalizer**: idempotent structural repair of the raw text
//! - **Linter**: block-aware keyword and template conformance
//! - **Status**: asserted code against the method/kind status matrix
//! - **Grammar**: formal Gherkin parse (nom)
//! - **Checklist**: per-kind minimum counts across the batch
//!
//! # Architecture
//!
//! ```text
//! ScenarioRecord → StructuralNormalizer → canonical text ─┬→ VocabularyLinter ─┐
//!                                                         ├→ StatusChecker ────┼→ issues
//!                                                         └→ GrammarValidator ─┘
//! batch ─────────────────────────────────────────────────────→ ChecklistVerifier → issues
//! ```
//!
//! # Example
//!
//! ```rust
//! use rulebook_compliance::{CompliancePipeline, EndpointDescriptor, ScenarioRecord};
//! use rulebook_policy::{Policy, ScenarioKind};
//!
//! let policy = Policy::from_rulebooks("Given endpoint <url>\nmethod <method>", "status <expected_status_code>");
//! let mut batch = vec![ScenarioRecord::new(
//!     EndpointDescriptor::new("GET", "/users").with_host("api.example.com"),
//!     ScenarioKind::Happy,
//!     "Feature: Users\n  Scenario: list\n    Then status 200",
//! )];
//!
//! let report = CompliancePipeline::new(&policy).run(&mut batch);
//! assert!(batch[0].text().contains("Given endpoint \"https://api.example.com/users\""));
//! assert_eq!(report.scenarios[0].issues.len(), 0);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod check;
pub mod checklist;
mod docstring;
pub mod error;
pub mod grammar;
pub mod issue;
pub mod linter;
pub mod normalizer;
pub mod pipeline;
pub mod scenario;
pub mod status;

// Re-exports
pub use check::ScenarioCheck;
pub use checklist::ChecklistVerifier;
pub use error::{GrammarError, GrammarResult};
pub use grammar::{parse_document, GherkinDocument, GrammarValidator};
pub use issue::{Issue, IssueCategory, ScenarioContext};
pub use linter::{BlockState, VocabularyLinter};
pub use normalizer::{NormalizerConfig, StructuralNormalizer};
pub use pipeline::{CompliancePipeline, ComplianceReport, PipelineOptions, ScenarioOutcome};
pub use scenario::{EndpointDescriptor, ScenarioRecord};
pub use status::{find_status_assertion, StatusAssertion, StatusChecker};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running the pipeline
    pub use crate::{
        CompliancePipeline, ComplianceReport, EndpointDescriptor, Issue, IssueCategory,
        PipelineOptions, ScenarioRecord,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
