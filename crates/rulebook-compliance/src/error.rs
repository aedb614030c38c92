//! Error types for the compliance checks
//!
//! Checkers never fail a batch. The only typed error is the grammar parser's,
//! which the validator folds into an [`Issue`](crate::Issue).

/// Formal parse failure at a 1-based line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct GrammarError {
    /// Line the parser stopped at
    pub line: usize,
    /// Parser message
    pub message: String,
}

impl GrammarError {
    /// Create new grammar error
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for grammar parsing
pub type GrammarResult<T> = Result<T, GrammarError>;
