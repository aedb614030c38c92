//! Error types for policy construction
//!
//! A missing rulebook is not an error (it compiles to empty lists). Errors
//! here cover settings that cannot be decoded and templates whose rendered
//! pattern the regex engine rejects.

/// Errors while building a [`Policy`](crate::Policy)
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Settings text could not be decoded
    #[error("invalid {format} policy settings: {message}")]
    InvalidSettings {
        /// Source format (yaml, toml, json)
        format: &'static str,
        /// Decoder message
        message: String,
    },

    /// Rendered template pattern was rejected by the regex engine
    #[error("template '{template}' produced an invalid pattern: {source}")]
    InvalidPattern {
        /// Normalized template line
        template: String,
        /// Regex build failure
        #[source]
        source: regex::Error,
    },

    /// Settings name an unsupported file extension
    #[error("unsupported settings format: '{0}' (expected yaml, yml, toml or json)")]
    UnsupportedFormat(String),
}

impl PolicyError {
    /// Create settings decode error
    pub fn invalid_settings(format: &'static str, message: impl ToString) -> Self {
        Self::InvalidSettings {
            format,
            message: message.to_string(),
        }
    }

    /// Create invalid pattern error for template
    pub fn invalid_pattern(template: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            template: template.into(),
            source,
        }
    }
}

/// Result type alias for policy operations
pub type PolicyResult<T> = Result<T, PolicyError>;
