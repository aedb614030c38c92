//! Structural normalizer
//!
//! Repairs a generated scenario into canonical shape without touching its
//! assertions:
//!
//! 1. drop code-fence lines
//! 2. qualify (or synthesize) the endpoint line
//! 3. add a JSON `Content-Type` header when a body example exists
//! 4. add the request body docstring when none exists
//! 5. add the `When method …` line when none exists
//! 6. trim surrounding blank lines
//!
//! Each step checks for its own output first, so running the normalizer on
//! canonical text returns it unchanged.

use crate::docstring::{self, DocLine, DELIMITER};
use crate::scenario::{EndpointDescriptor, ScenarioRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use rulebook_policy::Keyword;

static ENDPOINT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\s*(?:Given|And|When)\s+(?:url|endpoint)\s+)(\S.*?)\s*$")
        .expect("endpoint regex is valid")
});
static EXECUTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:When|And)\s+method\s+\S+").expect("execution regex is valid")
});
static REQUEST_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:Given|When|And|\*)\s+request\b").expect("request regex is valid")
});
static CONTENT_TYPE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:Given|When|And|\*)\s+headers?\b.*\bcontent-type\b")
        .expect("content-type regex is valid")
});

/// Normalizer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Media type written into the inserted header line
    pub content_type: String,
    /// Indentation added below a scenario header when no step shows the indent
    pub step_indent: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            content_type: "application/json".to_string(),
            step_indent: "  ".to_string(),
        }
    }
}

impl NormalizerConfig {
    /// Set the inserted media type
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Idempotent structural rewriter
#[derive(Debug, Clone, Default)]
pub struct StructuralNormalizer {
    config: NormalizerConfig,
}

impl StructuralNormalizer {
    /// Create new normalizer
    #[inline]
    #[must_use]
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Settings in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a record in place, writing its canonical text
    pub fn normalize_record(&self, record: &mut ScenarioRecord) {
        let canonical = self.normalize(&record.raw_text, &record.endpoint);
        record.canonical_text = Some(canonical);
    }

    /// Return the canonical form of `text` for `endpoint`
    #[must_use]
    pub fn normalize(&self, text: &str, endpoint: &EndpointDescriptor) -> String {
        let mut doc = Lines::new(text);
        let indent = doc.step_indent(&self.config.step_indent);

        let endpoint_at = match doc.find_endpoint() {
            Some(at) => {
                doc.qualify_endpoint(at, endpoint);
                at
            }
            None => {
                let at = doc.header().map_or(0, |h| h + 1);
                tracing::debug!(
                    "Synthesizing endpoint line for {} {}",
                    endpoint.method_upper(),
                    endpoint.path
                );
                let line = format!("{indent}Given endpoint \"{}\"", endpoint.full_url());
                doc.insert(at, vec![line]);
                at
            }
        };

        let mut anchor = endpoint_at;
        if let Some(example) = endpoint.body_example() {
            if doc.has_content_type_header() {
                if doc.is_content_type_line(endpoint_at + 1) {
                    anchor = endpoint_at + 1;
                }
            } else {
                doc.insert(
                    anchor + 1,
                    vec![format!(
                        "{indent}And header Content-Type = '{}'",
                        self.config.content_type
                    )],
                );
                anchor += 1;
            }

            if !doc.has_body_block() {
                let pretty = serde_json::to_string_pretty(example)
                    .unwrap_or_else(|_| example.to_string());
                let mut block = vec![
                    format!("{indent}And request"),
                    format!("{indent}{DELIMITER}"),
                ];
                block.extend(pretty.lines().map(|l| format!("{indent}{l}")));
                block.push(format!("{indent}{DELIMITER}"));
                doc.insert(anchor + 1, block);
            }
        }

        let method = endpoint.method_upper();
        if !method.is_empty() && !doc.has_execution_line() {
            let at = doc.last_setup_line(endpoint_at).unwrap_or(endpoint_at) + 1;
            doc.insert(at, vec![format!("{indent}When method {method}")]);
        }

        doc.finish()
    }
}

/// Working copy of the scenario lines with their docstring roles
struct Lines {
    lines: Vec<String>,
    roles: Vec<DocLine>,
}

impl Lines {
    fn new(text: &str) -> Self {
        let lines: Vec<String> = text
            .lines()
            .filter(|line| !line.trim_start().starts_with("```"))
            .map(str::to_string)
            .collect();
        let roles = docstring::scan(&lines);
        Self { lines, roles }
    }

    fn insert(&mut self, at: usize, block: Vec<String>) {
        let at = at.min(self.lines.len());
        self.lines.splice(at..at, block);
        self.roles = docstring::scan(&self.lines);
    }

    fn text_lines(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.lines
            .iter()
            .zip(&self.roles)
            .enumerate()
            .filter(|(_, (_, role))| !role.in_docstring())
            .map(|(i, (line, _))| (i, line.as_str()))
    }

    fn keyword_at(&self, index: usize) -> Option<Keyword> {
        if self.roles.get(index)?.in_docstring() {
            return None;
        }
        Keyword::detect(self.lines.get(index)?).map(|(keyword, _)| keyword)
    }

    /// First `Scenario` line, else the last header before any step
    fn header(&self) -> Option<usize> {
        let mut leading = None;
        let mut seen_step = false;
        for (i, line) in self.text_lines() {
            match Keyword::detect(line) {
                Some((Keyword::Scenario, _)) => return Some(i),
                Some((keyword, _)) if keyword.is_header() => {
                    if !seen_step {
                        leading = Some(i);
                    }
                }
                Some(_) => seen_step = true,
                None => {}
            }
        }
        leading
    }

    fn first_then(&self) -> usize {
        self.text_lines()
            .find(|(_, line)| matches!(Keyword::detect(line), Some((Keyword::Then, _))))
            .map_or(self.lines.len(), |(i, _)| i)
    }

    fn is_setup_step(&self, index: usize) -> bool {
        matches!(
            self.keyword_at(index),
            Some(Keyword::Given | Keyword::When | Keyword::And)
        )
    }

    fn step_indent(&self, fallback: &str) -> String {
        let leading = |line: &str| line[..line.len() - line.trim_start().len()].to_string();
        let first_step = self.text_lines().find(|(_, line)| {
            Keyword::detect(line).is_some_and(|(keyword, _)| !keyword.is_header())
        });
        if let Some((_, line)) = first_step {
            return leading(line);
        }
        match self.header() {
            Some(h) => format!("{}{fallback}", leading(self.lines[h].as_str())),
            None => String::new(),
        }
    }

    fn find_endpoint(&self) -> Option<usize> {
        self.text_lines()
            .find(|(_, line)| ENDPOINT_LINE.is_match(line))
            .map(|(i, _)| i)
    }

    fn qualify_endpoint(&mut self, at: usize, endpoint: &EndpointDescriptor) {
        let Some(caps) = ENDPOINT_LINE.captures(&self.lines[at]) else {
            return;
        };
        let prefix = caps.get(1).map_or("", |m| m.as_str());
        let value = caps.get(2).map_or("", |m| m.as_str());
        let (quote, inner) = unquote(value);
        if inner.is_empty() || inner.chars().any(char::is_whitespace) {
            return;
        }
        let qualified = endpoint.qualify(inner);
        if qualified != inner {
            let line = format!("{prefix}{quote}{qualified}{quote}");
            self.lines[at] = line;
        }
    }

    /// A header step setting Content-Type; assertions on it do not count
    fn has_content_type_header(&self) -> bool {
        self.text_lines().any(|(_, line)| CONTENT_TYPE_HEADER.is_match(line))
    }

    fn is_content_type_line(&self, index: usize) -> bool {
        self.roles.get(index).is_some_and(|role| !role.in_docstring())
            && CONTENT_TYPE_HEADER.is_match(&self.lines[index])
    }

    /// A `request` step, or a docstring attached to a setup step before the first `Then`
    fn has_body_block(&self) -> bool {
        if self.text_lines().any(|(_, line)| REQUEST_STEP.is_match(line)) {
            return true;
        }
        let first_then = self.first_then();
        (1..first_then).any(|i| self.roles[i] == DocLine::Open && self.is_setup_step(i - 1))
    }

    fn has_execution_line(&self) -> bool {
        self.text_lines().any(|(_, line)| EXECUTION_LINE.is_match(line))
    }

    /// Last step line (or closing docstring) at or after `from` and before the first `Then`
    fn last_setup_line(&self, from: usize) -> Option<usize> {
        let first_then = self.first_then();
        (from..first_then)
            .rev()
            .find(|&i| self.is_setup_step(i) || self.roles[i] == DocLine::Close)
    }

    fn finish(self) -> String {
        let start = self.lines.iter().position(|l| !l.trim().is_empty());
        let end = self.lines.iter().rposition(|l| !l.trim().is_empty());
        let body = match (start, end) {
            (Some(s), Some(e)) => self.lines[s..=e].join("\n"),
            _ => String::new(),
        };
        format!("{body}\n")
    }
}

fn unquote(value: &str) -> (&'static str, &str) {
    for quote in ["\"", "'"] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return (quote, &value[1..value.len() - 1]);
        }
    }
    ("", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn normalize(text: &str, endpoint: &EndpointDescriptor) -> String {
        StructuralNormalizer::default().normalize(text, endpoint)
    }

    #[test]
    fn canonical_text_is_unchanged() {
        let endpoint = EndpointDescriptor::new("GET", "/p").with_host("h");
        let text = "Feature: X\n  Scenario: Y\n    Given endpoint \"https://h/p\"\n    When method GET\n    Then status 200\n";
        assert_eq!(normalize(text, &endpoint), text);
    }

    #[test]
    fn qualifies_scheme_less_endpoint() {
        let endpoint = EndpointDescriptor::new("GET", "/p").with_host("api.test");
        let out = normalize("Scenario: Y\n  Given url '/p'\n  When method GET\n  Then status 200", &endpoint);
        assert!(out.contains("  Given url 'https://api.test/p'\n"), "{out}");
    }

    #[test]
    fn leaves_endpoint_without_host() {
        let endpoint = EndpointDescriptor::new("GET", "/p");
        let text = "Scenario: Y\n  Given endpoint \"/p\"\n  When method GET\n  Then status 200\n";
        assert_eq!(normalize(text, &endpoint), text);
    }

    #[test]
    fn synthesizes_endpoint_after_header() {
        let endpoint = EndpointDescriptor::new("delete", "/items/1").with_host("https://h/");
        let out = normalize("Feature: X\n  Scenario: Y\n    Then status 204\n", &endpoint);
        assert_eq!(
            out,
            "Feature: X\n  Scenario: Y\n    Given endpoint \"https://h/items/1\"\n    When method DELETE\n    Then status 204\n"
        );
    }

    #[test]
    fn synthesizes_endpoint_at_top_without_header() {
        let endpoint = EndpointDescriptor::new("GET", "/p");
        let out = normalize("Then status 200", &endpoint);
        assert_eq!(out, "Given endpoint \"/p\"\nWhen method GET\nThen status 200\n");
    }

    #[test]
    fn inserts_header_and_body_after_endpoint() {
        let endpoint = EndpointDescriptor::new("POST", "/users")
            .with_host("h")
            .with_request_body(json!({"name": "a"}));
        let out = normalize("Scenario: create\n  Given endpoint \"https://h/users\"\n  Then status 201\n", &endpoint);
        assert_eq!(
            out,
            "Scenario: create\n  Given endpoint \"https://h/users\"\n  And header Content-Type = 'application/json'\n  And request\n  \"\"\"\n  {\n    \"name\": \"a\"\n  }\n  \"\"\"\n  When method POST\n  Then status 201\n"
        );
    }

    #[test]
    fn existing_header_and_body_are_kept() {
        let endpoint = EndpointDescriptor::new("POST", "/u").with_request_body(json!({"a": 1}));
        let text = "Scenario: s\n  Given endpoint \"/u\"\n  And header content-type = 'text/plain'\n  And request {\"a\": 1}\n  When method POST\n  Then status 201\n";
        assert_eq!(normalize(text, &endpoint), text);
    }

    #[test]
    fn method_goes_after_last_setup_line() {
        let endpoint = EndpointDescriptor::new("put", "/p");
        let out = normalize(
            "Scenario: s\n  Given endpoint \"/p\"\n  And param id = 1\n  Then status 200\n  And match id == 1",
            &endpoint,
        );
        assert_eq!(
            out,
            "Scenario: s\n  Given endpoint \"/p\"\n  And param id = 1\n  When method PUT\n  Then status 200\n  And match id == 1\n"
        );
    }

    #[test]
    fn strips_fences_and_blank_edges() {
        let endpoint = EndpointDescriptor::new("GET", "/p");
        let out = normalize("```gherkin\n\nScenario: s\n  Given endpoint \"/p\"\n  When method GET\n```\n\n", &endpoint);
        assert_eq!(out, "Scenario: s\n  Given endpoint \"/p\"\n  When method GET\n");
    }

    #[test]
    fn empty_body_example_adds_nothing() {
        let endpoint = EndpointDescriptor::new("POST", "/p").with_request_body(json!({}));
        let out = normalize("Scenario: s\n  Given endpoint \"/p\"\n  When method POST\n", &endpoint);
        assert!(!out.contains("Content-Type"));
        assert!(!out.contains(DELIMITER));
    }

    #[test]
    fn normalize_record_writes_canonical_text() {
        let mut record = ScenarioRecord::new(
            EndpointDescriptor::new("GET", "/p"),
            rulebook_policy::ScenarioKind::Happy,
            "Then status 200",
        );
        StructuralNormalizer::default().normalize_record(&mut record);
        assert_eq!(record.text(), "Given endpoint \"/p\"\nWhen method GET\nThen status 200\n");
        assert_eq!(record.raw_text, "Then status 200");
    }

    #[test]
    fn content_type_assertion_is_not_a_header() {
        let endpoint = EndpointDescriptor::new("POST", "/users").with_request_body(json!({"name": "a"}));
        let text = "Scenario: create\n  Given endpoint \"/users\"\n  Then status 201\n  And match header Content-Type == 'application/json'\n";
        let out = normalize(text, &endpoint);
        assert_eq!(
            out,
            "Scenario: create\n  Given endpoint \"/users\"\n  And header Content-Type = 'application/json'\n  And request\n  \"\"\"\n  {\n    \"name\": \"a\"\n  }\n  \"\"\"\n  When method POST\n  Then status 201\n  And match header Content-Type == 'application/json'\n"
        );
        assert_eq!(normalize(&out, &endpoint), out);
    }

    #[test]
    fn response_docstring_is_not_a_request_body() {
        let endpoint = EndpointDescriptor::new("POST", "/users").with_request_body(json!({"name": "a"}));
        let text = "Scenario: create\n  Given endpoint \"/users\"\n  And header Content-Type = 'application/json'\n  When method POST\n  Then status 201\n  And match response ==\n  \"\"\"\n  {\"id\": 1}\n  \"\"\"\n";
        let out = normalize(text, &endpoint);
        assert_eq!(
            out,
            "Scenario: create\n  Given endpoint \"/users\"\n  And header Content-Type = 'application/json'\n  And request\n  \"\"\"\n  {\n    \"name\": \"a\"\n  }\n  \"\"\"\n  When method POST\n  Then status 201\n  And match response ==\n  \"\"\"\n  {\"id\": 1}\n  \"\"\"\n"
        );
        assert_eq!(normalize(&out, &endpoint), out);
    }

    #[test]
    fn docstring_on_setup_step_counts_as_body() {
        let endpoint = EndpointDescriptor::new("POST", "/u").with_request_body(json!({"a": 1}));
        let text = "Scenario: s\n  Given endpoint \"/u\"\n  And header Content-Type = 'application/json'\n  And def payload =\n  \"\"\"\n  {\"a\": 1}\n  \"\"\"\n  When method POST\n  Then status 201\n";
        assert_eq!(normalize(text, &endpoint), text);
    }

    #[test]
    fn synthesized_steps_follow_leading_headers() {
        let endpoint = EndpointDescriptor::new("GET", "/p");
        let out = normalize("Feature: F\n  Background:\n    Then status 200", &endpoint);
        assert_eq!(
            out,
            "Feature: F\n  Background:\n    Given endpoint \"/p\"\n    When method GET\n    Then status 200\n"
        );
        assert!(crate::grammar::parse_document(&out).is_ok(), "{out}");
    }

    #[test]
    fn synthesized_steps_stay_below_feature() {
        let endpoint = EndpointDescriptor::new("GET", "/p");
        let raw = "Feature: F\n  Then status 200";
        let out = normalize(raw, &endpoint);
        assert_eq!(out, "Feature: F\n  Given endpoint \"/p\"\n  When method GET\n  Then status 200\n");
        // Steps without a scenario fail at the same line before and after repair
        let before = crate::grammar::parse_document(raw).unwrap_err();
        let after = crate::grammar::parse_document(&out).unwrap_err();
        assert_eq!(before.line, 2);
        assert_eq!(after.line, 2);
    }

    #[test]
    fn custom_content_type_is_inserted() {
        let config = NormalizerConfig::default().with_content_type("application/vnd.api+json");
        let endpoint = EndpointDescriptor::new("PATCH", "/p").with_request_body(json!({"a": 1}));
        let out = StructuralNormalizer::new(config)
            .normalize("Scenario: s\n  Given endpoint \"/p\"\n  Then status 200\n", &endpoint);
        assert!(out.contains("  And header Content-Type = 'application/vnd.api+json'\n"), "{out}");
    }

    #[test]
    fn is_idempotent_on_repaired_text() {
        let endpoint = EndpointDescriptor::new("POST", "/p")
            .with_host("h")
            .with_request_body(json!({"list": [1, 2], "nested": {"k": "v"}}));
        let once = normalize("Feature: F\nScenario: s\nThen status 201\n", &endpoint);
        assert_eq!(normalize(&once, &endpoint), once);
    }
}
