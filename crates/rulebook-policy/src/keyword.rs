//! Fixed Gherkin keyword set
//!
//! The restricted dialect only knows seven leading keywords. Detection is a
//! case-insensitive prefix match that must end on a word boundary, so
//! `Givenx` is not `Given` but `Scenario:` is `Scenario`.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Leading keyword of a scenario line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Keyword {
    /// `Feature:` header
    Feature,
    /// `Background:` header
    Background,
    /// `Scenario:` header (also `Scenario Outline:`)
    Scenario,
    /// Setup step
    Given,
    /// Action step
    When,
    /// First assertion of a block
    Then,
    /// Continuation; meaning depends on the enclosing block
    And,
}

impl Keyword {
    /// All keywords in canonical order
    pub const ALL: [Keyword; 7] = [
        Keyword::Feature,
        Keyword::Background,
        Keyword::Scenario,
        Keyword::Given,
        Keyword::When,
        Keyword::Then,
        Keyword::And,
    ];

    /// Canonical spelling
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Keyword::Feature => "Feature",
            Keyword::Background => "Background",
            Keyword::Scenario => "Scenario",
            Keyword::Given => "Given",
            Keyword::When => "When",
            Keyword::Then => "Then",
            Keyword::And => "And",
        }
    }

    /// Whether the keyword opens a section rather than a step
    #[inline]
    #[must_use]
    pub const fn is_header(self) -> bool {
        matches!(self, Keyword::Feature | Keyword::Background | Keyword::Scenario)
    }

    /// Detect the leading keyword of a line.
    ///
    /// Leading whitespace is ignored. Returns the keyword and the remainder of
    /// the line directly after it (not trimmed).
    #[must_use]
    pub fn detect(line: &str) -> Option<(Keyword, &str)> {
        let line = line.trim_start();
        Self::ALL.into_iter().find_map(|keyword| {
            let word = keyword.as_str();
            let head = line.get(..word.len())?;
            if !head.eq_ignore_ascii_case(word) {
                return None;
            }
            let rest = &line[word.len()..];
            match rest.chars().next() {
                Some(c) if c.is_alphanumeric() || c == '_' => None,
                _ => Some((keyword, rest)),
            }
        })
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Keyword {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKeyword(s.to_string()))
    }
}

/// Error for a string that names none of the seven keywords
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown keyword: '{0}'")]
pub struct UnknownKeyword(pub String);
