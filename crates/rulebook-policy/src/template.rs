//! Template compiler
//!
//! Turns rulebook lines into anchored regexes:
//!
//! ```text
//! raw line → normalize_line → keyword prefix → tokenize → render → ^\s*…\s*$
//! ```
//!
//! Rendering works on segments (literal runs and placeholder tokens), so
//! placeholder substitution never sees escaped text and one token can never
//! corrupt another. Whitespace inside literals is relaxed to `\s+`.

use crate::error::{PolicyError, PolicyResult};
use crate::keyword::Keyword;
use crate::placeholder::{self, PlaceholderRule};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{self, Display, Formatter};

static ENUMERATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)\-]\s*").expect("enumeration regex is valid"));
static COMMENTARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+-\s+").expect("commentary regex is valid"));
static TYPO_GIVEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GIven\b").expect("typo regex is valid"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Which rulebook a template comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Actions and setup (Given/When phrasing)
    Step,
    /// Observations (Then phrasing)
    Assertion,
}

impl TemplateKind {
    /// Keyword group injected in front of a template written without one
    #[inline]
    #[must_use]
    pub const fn keyword_group(self) -> &'static str {
        match self {
            TemplateKind::Step => "(?i:Given|When|Then|And)",
            TemplateKind::Assertion => "(?i:Then|And)",
        }
    }

    /// Lower-case label for diagnostics
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TemplateKind::Step => "step",
            TemplateKind::Assertion => "assertion",
        }
    }
}

impl Display for TemplateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clean up one rulebook line.
///
/// - drops leading enumeration such as `12. ` or `3) `
/// - drops trailing commentary after a ` - ` separator
/// - straightens curly quotes
/// - fixes the `GIven` typo
/// - collapses whitespace runs to a single space
#[must_use]
pub fn normalize_line(raw: &str) -> String {
    let line = raw.trim();
    if line.is_empty() {
        return String::new();
    }
    let line = ENUMERATION.replace(line, "");
    let line = COMMENTARY.splitn(&line, 2).next().unwrap_or_default().trim().to_string();
    let line = line
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    let line = TYPO_GIVEN.replace(&line, "Given");
    WHITESPACE_RUN.replace_all(&line, " ").trim().to_string()
}

/// Whether a normalized line carries no template (blank, comment or bullet note)
#[inline]
#[must_use]
pub fn is_skippable(normalized: &str) -> bool {
    normalized.is_empty() || normalized.starts_with('#') || normalized.starts_with('*')
}

/// Piece of a template body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text matched literally (whitespace relaxed)
    Literal(&'a str),
    /// Placeholder token replaced by its fragment
    Placeholder(&'static PlaceholderRule),
}

/// Split a template body into literal runs and placeholder tokens
#[must_use]
pub fn tokenize(body: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < body.len() {
        let rest = &body[pos..];
        if let Some(rule) = placeholder::match_at(rest) {
            if literal_start < pos {
                segments.push(Segment::Literal(&body[literal_start..pos]));
            }
            segments.push(Segment::Placeholder(rule));
            pos += rule.token.len();
            literal_start = pos;
        } else {
            pos += rest.chars().next().map_or(1, char::len_utf8);
        }
    }

    if literal_start < body.len() {
        segments.push(Segment::Literal(&body[literal_start..]));
    }
    segments
}

fn render_literal(literal: &str, out: &mut String) {
    let mut in_whitespace = false;
    let mut buf = [0u8; 4];
    for c in literal.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push_str(r"\s+");
                in_whitespace = true;
            }
        } else {
            in_whitespace = false;
            out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        }
    }
}

fn render_body(body: &str, out: &mut String) {
    for segment in tokenize(body) {
        match segment {
            Segment::Literal(text) => render_literal(text, out),
            Segment::Placeholder(rule) => out.push_str(rule.fragment),
        }
    }
}

/// Anchored pattern compiled from one template
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Normalized template text the pattern was built from
    #[inline]
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Regex source text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the whole trimmed line matches
    #[inline]
    #[must_use]
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line.trim())
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template && self.source == other.source
    }
}

impl Eq for CompiledPattern {}

/// Compile one raw rulebook line.
///
/// Returns `Ok(None)` for blank, comment and bullet lines.
///
/// # Errors
/// `PolicyError::InvalidPattern` if the rendered regex is rejected
pub fn compile_template(raw: &str, kind: TemplateKind) -> PolicyResult<Option<CompiledPattern>> {
    let template = normalize_line(raw);
    if is_skippable(&template) {
        return Ok(None);
    }

    let mut source = String::from(r"^\s*");
    match Keyword::detect(&template) {
        Some((keyword, rest)) => {
            source.push_str("(?i:");
            source.push_str(keyword.as_str());
            source.push(')');
            render_body(rest, &mut source);
        }
        None => {
            source.push_str(kind.keyword_group());
            source.push_str(r"\s+");
            render_body(&template, &mut source);
        }
    }
    source.push_str(r"\s*$");

    let regex = Regex::new(&source).map_err(|e| PolicyError::invalid_pattern(&template, e))?;
    Ok(Some(CompiledPattern {
        template,
        source,
        regex,
    }))
}

/// Order-aligned templates and patterns from one rulebook
///
/// `templates()[i]` is always the template of `patterns()[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplates {
    kind: TemplateKind,
    templates: Vec<String>,
    patterns: Vec<CompiledPattern>,
}

impl CompiledTemplates {
    /// Empty list (absent rulebook)
    #[inline]
    #[must_use]
    pub fn empty(kind: TemplateKind) -> Self {
        Self {
            kind,
            templates: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Compile rulebook lines in order.
    ///
    /// Lines whose pattern cannot be built are logged and left out of both
    /// lists.
    pub fn compile<'a, I>(lines: I, kind: TemplateKind) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut compiled = Self::empty(kind);
        for (index, line) in lines.into_iter().enumerate() {
            match compile_template(line, kind) {
                Ok(Some(pattern)) => {
                    compiled.templates.push(pattern.template.clone());
                    compiled.patterns.push(pattern);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping {} template on line {}: {}", kind, index + 1, e);
                }
            }
        }
        tracing::debug!("Compiled {} {} templates", compiled.len(), kind);
        compiled
    }

    /// Rulebook the templates came from
    #[inline]
    #[must_use]
    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Normalized templates
    #[inline]
    #[must_use]
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Compiled patterns
    #[inline]
    #[must_use]
    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Number of templates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the rulebook was absent or held no templates
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// First pattern matching the line, if any
    #[must_use]
    pub fn find_match(&self, line: &str) -> Option<&CompiledPattern> {
        self.patterns.iter().find(|p| p.is_match(line))
    }

    /// Whether any pattern matches the line
    #[inline]
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        self.find_match(line).is_some()
    }
}

/// Compile a whole rulebook text of the given kind
#[inline]
#[must_use]
pub fn compile_templates(text: &str, kind: TemplateKind) -> CompiledTemplates {
    CompiledTemplates::compile(text.lines(), kind)
}
