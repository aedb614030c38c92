//! Input loading
//!
//! Rulebooks are optional: a missing or unreadable file becomes
//! [`RulebookSource::Absent`] and only the keyword set is enforced. Settings
//! and batch files are required once named, so their failures are errors.

use anyhow::{Context, Result};
use rulebook_compliance::ScenarioRecord;
use rulebook_policy::{Policy, PolicySettings, RulebookSource, SettingsFormat};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Environment variable naming the step rulebook
pub const STEPS_ENV: &str = "CUSTOM_KEYWORDS_FILE";

/// Environment variable naming the assertion rulebook
pub const ASSERTIONS_ENV: &str = "CUSTOM_ASSERTIONS_FILE";

/// Step rulebook used when neither flag nor env var is set
pub const DEFAULT_STEPS_FILE: &str = "keywords.txt";

/// Assertion rulebook used when neither flag nor env var is set
pub const DEFAULT_ASSERTIONS_FILE: &str = "assertions.txt";

/// Read one rulebook file
#[must_use]
pub fn read_rulebook(path: &Path) -> RulebookSource {
    match fs::read_to_string(path) {
        Ok(text) => {
            tracing::debug!("Read rulebook {} ({} bytes)", path.display(), text.len());
            RulebookSource::Present(text)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("Rulebook {} not found", path.display());
            RulebookSource::Absent
        }
        Err(e) => {
            tracing::warn!("Rulebook {} unreadable: {}", path.display(), e);
            RulebookSource::Absent
        }
    }
}

/// Load policy settings, or the defaults when no file is given
///
/// # Errors
/// Unknown extension, unreadable file or settings that do not decode
pub fn load_settings(path: Option<&Path>) -> Result<PolicySettings> {
    let Some(path) = path else {
        return Ok(PolicySettings::default());
    };
    let format = SettingsFormat::from_path(path)
        .with_context(|| format!("cannot pick a settings format for {}", path.display()))?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    let settings = PolicySettings::parse(&text, format)
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    tracing::info!("Loaded {:?} settings from {}", format, path.display());
    Ok(settings)
}

/// Read a JSON array of scenario records
///
/// # Errors
/// Unreadable file or JSON that is not an array of records
pub fn read_batch(path: &Path) -> Result<Vec<ScenarioRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read batch {}", path.display()))?;
    let records: Vec<ScenarioRecord> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of scenario records", path.display()))?;
    tracing::info!("Read {} scenario records from {}", records.len(), path.display());
    Ok(records)
}

/// Everything needed to build a [`Policy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyInputs {
    /// Step rulebook file
    pub steps: PathBuf,
    /// Assertion rulebook file
    pub assertions: PathBuf,
    /// Optional settings file (YAML, TOML or JSON)
    pub settings: Option<PathBuf>,
}

impl Default for PolicyInputs {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS_FILE, DEFAULT_ASSERTIONS_FILE)
    }
}

impl PolicyInputs {
    /// Create new inputs from the two rulebook paths
    #[must_use]
    pub fn new(steps: impl Into<PathBuf>, assertions: impl Into<PathBuf>) -> Self {
        Self {
            steps: steps.into(),
            assertions: assertions.into(),
            settings: None,
        }
    }

    /// Use a settings file
    #[must_use]
    pub fn with_settings(mut self, settings: impl Into<PathBuf>) -> Self {
        self.settings = Some(settings.into());
        self
    }

    /// Compile the policy
    ///
    /// # Errors
    /// Only the settings file can fail; missing rulebooks are absent, not errors
    pub fn load(&self) -> Result<Policy> {
        let settings = load_settings(self.settings.as_deref())?;
        Ok(Policy::compile(
            &read_rulebook(&self.steps),
            &read_rulebook(&self.assertions),
            settings,
        ))
    }
}
