//! Policy settings
//!
//! The non-rulebook half of a policy: which keywords are allowed, which
//! status codes each (method, kind) pair may assert, and how many scenarios
//! of each kind a batch must contain. Loadable from YAML, TOML or JSON; any
//! field left out keeps its default.

use crate::error::{PolicyError, PolicyResult};
use crate::keyword::Keyword;
use crate::kind::ScenarioKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Acceptable status codes per HTTP method and scenario kind
///
/// Method keys are stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusMatrix(BTreeMap<String, BTreeMap<ScenarioKind, Vec<u16>>>);

impl StatusMatrix {
    /// Empty matrix (every status accepted)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Set the allowed codes for a method and kind
    #[must_use]
    pub fn with(mut self, method: &str, kind: ScenarioKind, codes: &[u16]) -> Self {
        self.0
            .entry(method.trim().to_ascii_uppercase())
            .or_default()
            .insert(kind, codes.to_vec());
        self
    }

    /// Allowed codes for a method and kind; empty when unconstrained
    #[must_use]
    pub fn allowed(&self, method: &str, kind: ScenarioKind) -> &[u16] {
        self.0
            .get(&method.trim().to_ascii_uppercase())
            .and_then(|by_kind| by_kind.get(&kind))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Iterate `(method, kind, codes)` in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ScenarioKind, &[u16])> + '_ {
        self.0.iter().flat_map(|(method, by_kind)| {
            by_kind
                .iter()
                .map(move |(kind, codes)| (method.as_str(), *kind, codes.as_slice()))
        })
    }

    fn normalized(self) -> Self {
        let mut out = Self::empty();
        for (method, by_kind) in self.0 {
            let entry = out.0.entry(method.trim().to_ascii_uppercase()).or_default();
            entry.extend(by_kind);
        }
        out
    }
}

impl Default for StatusMatrix {
    fn default() -> Self {
        use ScenarioKind::{Edge, Error, Happy};
        Self::empty()
            .with("GET", Happy, &[200])
            .with("GET", Error, &[400, 404, 500])
            .with("GET", Edge, &[200, 400])
            .with("POST", Happy, &[201, 200])
            .with("POST", Error, &[400, 409, 415, 500])
            .with("POST", Edge, &[422, 400])
            .with("PUT", Happy, &[200, 204])
            .with("PUT", Error, &[400, 404, 409, 500])
            .with("PUT", Edge, &[422, 400])
            .with("PATCH", Happy, &[200, 204])
            .with("PATCH", Error, &[400, 404, 409, 500])
            .with("PATCH", Edge, &[422, 400])
            .with("DELETE", Happy, &[200, 204])
            .with("DELETE", Error, &[400, 404, 500])
            .with("DELETE", Edge, &[409, 400])
    }
}

/// Minimum number of scenarios per kind in one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecklistTargets(BTreeMap<ScenarioKind, usize>);

impl ChecklistTargets {
    /// No minimums
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Set the minimum for a kind
    #[must_use]
    pub fn with(mut self, kind: ScenarioKind, minimum: usize) -> Self {
        self.0.insert(kind, minimum);
        self
    }

    /// Minimum for a kind, if one is defined
    #[inline]
    #[must_use]
    pub fn get(&self, kind: ScenarioKind) -> Option<usize> {
        self.0.get(&kind).copied()
    }

    /// Iterate targets in happy, error, edge order
    pub fn iter(&self) -> impl Iterator<Item = (ScenarioKind, usize)> + '_ {
        self.0.iter().map(|(kind, minimum)| (*kind, *minimum))
    }
}

impl Default for ChecklistTargets {
    fn default() -> Self {
        Self::empty()
            .with(ScenarioKind::Happy, 3)
            .with(ScenarioKind::Error, 3)
            .with(ScenarioKind::Edge, 4)
    }
}

fn default_keywords() -> Vec<Keyword> {
    Keyword::ALL.to_vec()
}

/// Settings file encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// YAML document
    Yaml,
    /// TOML document
    Toml,
    /// JSON document
    Json,
}

impl SettingsFormat {
    /// Pick the format from a file extension
    ///
    /// # Errors
    /// `PolicyError::UnsupportedFormat` for unknown extensions
    pub fn from_path(path: &Path) -> PolicyResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            _ => Err(PolicyError::UnsupportedFormat(extension)),
        }
    }
}

/// Configurable part of a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicySettings {
    /// Keywords a scenario line may start with
    #[serde(default = "default_keywords")]
    pub allowed_keywords: Vec<Keyword>,
    /// Acceptable status codes per method and kind
    pub status_matrix: StatusMatrix,
    /// Minimum scenarios per kind
    pub checklist_targets: ChecklistTargets,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            allowed_keywords: default_keywords(),
            status_matrix: StatusMatrix::default(),
            checklist_targets: ChecklistTargets::default(),
        }
    }
}

impl PolicySettings {
    /// Parse settings text in the given format
    ///
    /// # Errors
    /// `PolicyError::InvalidSettings` if the text does not decode
    pub fn parse(text: &str, format: SettingsFormat) -> PolicyResult<Self> {
        let settings: Self = match format {
            SettingsFormat::Yaml => serde_yaml::from_str(text)
                .map_err(|e| PolicyError::invalid_settings("yaml", e))?,
            SettingsFormat::Toml => {
                toml::from_str(text).map_err(|e| PolicyError::invalid_settings("toml", e))?
            }
            SettingsFormat::Json => serde_json::from_str(text)
                .map_err(|e| PolicyError::invalid_settings("json", e))?,
        };
        Ok(settings.normalized())
    }

    /// Parse YAML settings
    ///
    /// # Errors
    /// `PolicyError::InvalidSettings` if the text does not decode
    #[inline]
    pub fn from_yaml(text: &str) -> PolicyResult<Self> {
        Self::parse(text, SettingsFormat::Yaml)
    }

    /// Parse TOML settings
    ///
    /// # Errors
    /// `PolicyError::InvalidSettings` if the text does not decode
    #[inline]
    pub fn from_toml(text: &str) -> PolicyResult<Self> {
        Self::parse(text, SettingsFormat::Toml)
    }

    /// Parse JSON settings
    ///
    /// # Errors
    /// `PolicyError::InvalidSettings` if the text does not decode
    #[inline]
    pub fn from_json(text: &str) -> PolicyResult<Self> {
        Self::parse(text, SettingsFormat::Json)
    }

    /// Replace the status matrix
    #[must_use]
    pub fn with_status_matrix(mut self, status_matrix: StatusMatrix) -> Self {
        self.status_matrix = status_matrix;
        self
    }

    /// Replace the checklist targets
    #[must_use]
    pub fn with_checklist_targets(mut self, checklist_targets: ChecklistTargets) -> Self {
        self.checklist_targets = checklist_targets;
        self
    }

    /// Restrict the allowed keywords
    #[must_use]
    pub fn with_allowed_keywords(mut self, keywords: impl IntoIterator<Item = Keyword>) -> Self {
        self.allowed_keywords = keywords.into_iter().collect();
        self
    }

    fn normalized(mut self) -> Self {
        self.status_matrix = self.status_matrix.normalized();
        self.allowed_keywords.sort();
        self.allowed_keywords.dedup();
        self
    }
}
