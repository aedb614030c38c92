//! Scenario records and endpoint metadata
//!
//! Both types are supplied by the surrounding system. The pipeline only ever
//! writes [`ScenarioRecord::canonical_text`].

use rulebook_policy::ScenarioKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scheme assumed for hosts given without one
pub const DEFAULT_SCHEME: &str = "https";

/// Endpoint a scenario exercises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Request path, e.g. `/users/{id}`
    pub path: String,
    /// HTTP method
    pub method: String,
    /// Host, with or without scheme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Example request body
    #[serde(
        default,
        alias = "request_example",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_body_example: Option<Value>,
}

impl EndpointDescriptor {
    /// Create new endpoint without host or body example
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            host: None,
            request_body_example: None,
        }
    }

    /// Set the host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the request body example
    #[must_use]
    pub fn with_request_body(mut self, example: Value) -> Self {
        self.request_body_example = Some(example);
        self
    }

    /// Upper-case method
    #[inline]
    #[must_use]
    pub fn method_upper(&self) -> String {
        self.method.trim().to_ascii_uppercase()
    }

    /// Host with scheme and without trailing `/`, if a host is known
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        let host = self.host.as_deref()?.trim().trim_end_matches('/');
        if host.is_empty() {
            return None;
        }
        if has_scheme(host) {
            Some(host.to_string())
        } else {
            Some(format!("{DEFAULT_SCHEME}://{host}"))
        }
    }

    /// Qualify an endpoint value with the host.
    ///
    /// Values that already carry a scheme, and any value when no host is
    /// known, are returned unchanged.
    #[must_use]
    pub fn qualify(&self, value: &str) -> String {
        if has_scheme(value) {
            return value.to_string();
        }
        match self.base_url() {
            Some(base) if value.starts_with('/') => format!("{base}{value}"),
            Some(base) => format!("{base}/{value}"),
            None => value.to_string(),
        }
    }

    /// Fully qualified URL of the endpoint (the bare path without a host)
    #[inline]
    #[must_use]
    pub fn full_url(&self) -> String {
        self.qualify(&self.path)
    }

    /// The body example, if it carries any content.
    ///
    /// `null`, `{}`, `[]` and `""` count as no example.
    #[must_use]
    pub fn body_example(&self) -> Option<&Value> {
        self.request_body_example.as_ref().filter(|value| match value {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::String(s) => !s.is_empty(),
            Value::Bool(_) | Value::Number(_) => true,
        })
    }
}

fn has_scheme(value: &str) -> bool {
    value.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// One generated test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Endpoint under test
    pub endpoint: EndpointDescriptor,
    /// Scenario intent
    #[serde(default)]
    pub kind: ScenarioKind,
    /// Text as generated
    pub raw_text: String,
    /// Structurally repaired text, written by the normalizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_text: Option<String>,
}

impl ScenarioRecord {
    /// Create new record with no canonical text yet
    #[inline]
    #[must_use]
    pub fn new(endpoint: EndpointDescriptor, kind: ScenarioKind, raw_text: impl Into<String>) -> Self {
        Self {
            endpoint,
            kind,
            raw_text: raw_text.into(),
            canonical_text: None,
        }
    }

    /// Canonical text, falling back to the raw text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        self.canonical_text.as_deref().unwrap_or(&self.raw_text)
    }
}
