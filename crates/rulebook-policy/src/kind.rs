//! Scenario intent classification

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Intent of a generated test case
///
/// Serialized as its lower-case name so it can key maps in every settings
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ScenarioKind {
    /// Valid request succeeds
    #[default]
    Happy,
    /// Invalid request is rejected
    Error,
    /// Boundary input
    Edge,
}

impl ScenarioKind {
    /// All kinds in reporting order
    pub const ALL: [ScenarioKind; 3] = [ScenarioKind::Happy, ScenarioKind::Error, ScenarioKind::Edge];

    /// Lower-case name as used in rulebooks and reports
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ScenarioKind::Happy => "happy",
            ScenarioKind::Error => "error",
            ScenarioKind::Edge => "edge",
        }
    }
}

impl Display for ScenarioKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioKind {
    type Err = UnknownScenarioKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownScenarioKind(s.to_string()))
    }
}

impl Serialize for ScenarioKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScenarioKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KindVisitor;

        impl Visitor<'_> for KindVisitor {
            type Value = ScenarioKind;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("one of happy, error, edge")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ScenarioKind, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(KindVisitor)
    }
}

/// Error for an unrecognised scenario kind name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scenario kind: '{0}' (expected happy, error or edge)")]
pub struct UnknownScenarioKind(pub String);
