//! The compiled policy
//!
//! A [`Policy`] is built once per run from the two rulebook sources and the
//! settings, then shared read-only by every checker. Nothing mutates it after
//! [`Policy::compile`] returns, so it can be handed to worker threads as a
//! plain reference.

use crate::keyword::Keyword;
use crate::kind::ScenarioKind;
use crate::settings::{ChecklistTargets, PolicySettings, StatusMatrix};
use crate::template::{compile_templates, CompiledPattern, CompiledTemplates, TemplateKind};
use std::fmt::{self, Display, Formatter};

/// One rulebook input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulebookSource {
    /// Newline-delimited rulebook text
    Present(String),
    /// Source missing or unreadable
    Absent,
}

impl RulebookSource {
    /// Wrap rulebook text
    #[inline]
    #[must_use]
    pub fn present(text: impl Into<String>) -> Self {
        Self::Present(text.into())
    }

    /// Whether the source exists
    #[inline]
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    fn compile(&self, kind: TemplateKind) -> CompiledTemplates {
        match self {
            Self::Present(text) => compile_templates(text, kind),
            Self::Absent => {
                tracing::warn!("No {} rulebook; only the keyword set is enforced", kind);
                CompiledTemplates::empty(kind)
            }
        }
    }
}

impl From<Option<String>> for RulebookSource {
    fn from(text: Option<String>) -> Self {
        text.map_or(Self::Absent, Self::Present)
    }
}

/// Blake3 digest over everything that decides a policy's behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolicyFingerprint([u8; 32]);

impl PolicyFingerprint {
    /// Raw digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for PolicyFingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Immutable compiled policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    allowed_keywords: Vec<Keyword>,
    steps: CompiledTemplates,
    assertions: CompiledTemplates,
    status_matrix: StatusMatrix,
    checklist_targets: ChecklistTargets,
}

impl Policy {
    /// Compile both rulebooks with the given settings
    ///
    /// An absent rulebook yields empty template and pattern lists; it is
    /// never an error.
    #[must_use]
    pub fn compile(
        steps: &RulebookSource,
        assertions: &RulebookSource,
        settings: PolicySettings,
    ) -> Self {
        let policy = Self {
            allowed_keywords: settings.allowed_keywords,
            steps: steps.compile(TemplateKind::Step),
            assertions: assertions.compile(TemplateKind::Assertion),
            status_matrix: settings.status_matrix,
            checklist_targets: settings.checklist_targets,
        };
        tracing::info!(
            "Compiled policy {}: {} step templates, {} assertion templates",
            policy.fingerprint().short(),
            policy.steps.len(),
            policy.assertions.len()
        );
        policy
    }

    /// Compile both rulebooks with default settings
    #[inline]
    #[must_use]
    pub fn from_rulebooks(steps: &str, assertions: &str) -> Self {
        Self::compile(
            &RulebookSource::present(steps),
            &RulebookSource::present(assertions),
            PolicySettings::default(),
        )
    }

    /// Keywords a line may start with
    #[inline]
    #[must_use]
    pub fn allowed_keywords(&self) -> &[Keyword] {
        &self.allowed_keywords
    }

    /// Whether a keyword is allowed
    #[inline]
    #[must_use]
    pub fn is_keyword_allowed(&self, keyword: Keyword) -> bool {
        self.allowed_keywords.contains(&keyword)
    }

    /// Compiled step rulebook
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &CompiledTemplates {
        &self.steps
    }

    /// Compiled assertion rulebook
    #[inline]
    #[must_use]
    pub fn assertions(&self) -> &CompiledTemplates {
        &self.assertions
    }

    /// Normalized step templates
    #[inline]
    #[must_use]
    pub fn step_templates(&self) -> &[String] {
        self.steps.templates()
    }

    /// Step patterns, aligned with [`Self::step_templates`]
    #[inline]
    #[must_use]
    pub fn step_patterns(&self) -> &[CompiledPattern] {
        self.steps.patterns()
    }

    /// Normalized assertion templates
    #[inline]
    #[must_use]
    pub fn assertion_templates(&self) -> &[String] {
        self.assertions.templates()
    }

    /// Assertion patterns, aligned with [`Self::assertion_templates`]
    #[inline]
    #[must_use]
    pub fn assertion_patterns(&self) -> &[CompiledPattern] {
        self.assertions.patterns()
    }

    /// Status matrix
    #[inline]
    #[must_use]
    pub fn status_matrix(&self) -> &StatusMatrix {
        &self.status_matrix
    }

    /// Allowed status codes for a method and kind; empty when unconstrained
    #[inline]
    #[must_use]
    pub fn allowed_statuses(&self, method: &str, kind: ScenarioKind) -> &[u16] {
        self.status_matrix.allowed(method, kind)
    }

    /// Minimum counts per kind
    #[inline]
    #[must_use]
    pub fn checklist_targets(&self) -> &ChecklistTargets {
        &self.checklist_targets
    }

    /// Deterministic digest of patterns and settings.
    ///
    /// Identical rulebooks and settings always give identical fingerprints.
    #[must_use]
    pub fn fingerprint(&self) -> PolicyFingerprint {
        let mut hasher = blake3::Hasher::new();
        for keyword in &self.allowed_keywords {
            hasher.update(keyword.as_str().as_bytes());
            hasher.update(&[0]);
        }
        for (section, compiled) in [("steps", &self.steps), ("assertions", &self.assertions)] {
            hasher.update(section.as_bytes());
            hasher.update(&[0]);
            for pattern in compiled.patterns() {
                hasher.update(pattern.source().as_bytes());
                hasher.update(&[0]);
            }
        }
        for (method, kind, codes) in self.status_matrix.iter() {
            hasher.update(method.as_bytes());
            hasher.update(kind.as_str().as_bytes());
            for code in codes {
                hasher.update(&code.to_le_bytes());
            }
            hasher.update(&[0]);
        }
        for (kind, minimum) in self.checklist_targets.iter() {
            hasher.update(kind.as_str().as_bytes());
            hasher.update(&(minimum as u64).to_le_bytes());
        }
        PolicyFingerprint(*hasher.finalize().as_bytes())
    }
}
