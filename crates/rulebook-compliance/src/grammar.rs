//! Grammar validator
//!
//! A `nom` parser for the Gherkin document structure:
//!
//! ```text
//! document   := ignorable* [ tags feature ] ignorable* EOF
//! feature    := "Feature:" text NL description background? scenario*
//! background := "Background:" text NL description step*
//! scenario   := tags ("Scenario:" | "Scenario Outline:" | "Example:") text NL description step* examples*
//! examples   := tags "Examples:" text NL description table_row+
//! step       := ("Given " | "When " | "Then " | "And " | "But " | "* ") text NL argument?
//! argument   := docstring | table_row+
//! ignorable  := blank | "#" comment
//! ```
//!
//! Keywords are case-sensitive here, unlike the vocabulary linter. A parse
//! failure becomes a [`GrammarError`] carrying the 1-based line the parser
//! stopped at.

use crate::check::ScenarioCheck;
use crate::error::{GrammarError, GrammarResult};
use crate::issue::{Issue, IssueCategory, ScenarioContext};
use crate::scenario::ScenarioRecord;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, line_ending, not_line_ending, space0},
    combinator::{map, opt, peek, value},
    error::{ErrorKind, ParseError},
    multi::many0,
    sequence::{preceded, terminated, tuple},
    IResult,
};
use std::borrow::Cow;

/// Parsed document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GherkinDocument {
    /// The feature, absent for a document holding only comments
    pub feature: Option<Feature>,
}

impl GherkinDocument {
    /// All scenarios of the feature
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.feature.iter().flat_map(|f| f.scenarios.iter())
    }
}

/// `Feature:` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Tags above the header
    pub tags: Vec<String>,
    /// Header text
    pub name: String,
    /// Free text under the header
    pub description: Vec<String>,
    /// Header line
    pub line: usize,
    /// Shared setup
    pub background: Option<Background>,
    /// Scenarios in order
    pub scenarios: Vec<Scenario>,
}

/// `Background:` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background {
    /// Header text
    pub name: String,
    /// Header line
    pub line: usize,
    /// Setup steps
    pub steps: Vec<Step>,
}

/// `Scenario:`, `Scenario Outline:` or `Example:` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Tags above the header
    pub tags: Vec<String>,
    /// Header keyword without the colon
    pub keyword: String,
    /// Header text
    pub name: String,
    /// Header line
    pub line: usize,
    /// Steps in order
    pub steps: Vec<Step>,
    /// Example tables (outlines only)
    pub examples: Vec<Examples>,
}

/// `Examples:` block of an outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Examples {
    /// Tags above the header
    pub tags: Vec<String>,
    /// Header text
    pub name: String,
    /// Header line
    pub line: usize,
    /// Header row followed by value rows
    pub rows: Vec<TableRow>,
}

/// Step keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKeyword {
    /// `Given`
    Given,
    /// `When`
    When,
    /// `Then`
    Then,
    /// `And`
    And,
    /// `But`
    But,
    /// `*`
    Star,
}

impl StepKeyword {
    const PREFIXES: [(&'static str, StepKeyword); 6] = [
        ("Given ", StepKeyword::Given),
        ("When ", StepKeyword::When),
        ("Then ", StepKeyword::Then),
        ("And ", StepKeyword::And),
        ("But ", StepKeyword::But),
        ("* ", StepKeyword::Star),
    ];

    /// Keyword as written
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StepKeyword::Given => "Given",
            StepKeyword::When => "When",
            StepKeyword::Then => "Then",
            StepKeyword::And => "And",
            StepKeyword::But => "But",
            StepKeyword::Star => "*",
        }
    }
}

/// One step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Leading keyword
    pub keyword: StepKeyword,
    /// Text after the keyword
    pub text: String,
    /// Step line
    pub line: usize,
    /// Attached docstring or table
    pub argument: Option<StepArgument>,
}

/// Block attached to a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArgument {
    /// `"""` or ```` ``` ```` block
    DocString(DocString),
    /// `| a | b |` rows
    DataTable(Vec<TableRow>),
}

/// Docstring content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocString {
    /// Text after the opening delimiter, e.g. `json`
    pub media_type: Option<String>,
    /// Lines between the delimiters, opening indent removed
    pub content: String,
    /// Opening delimiter line
    pub line: usize,
}

/// One table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Trimmed cell values
    pub cells: Vec<String>,
    /// Row line
    pub line: usize,
}

/// Parser error carrying the position and, where known, a readable message
#[derive(Debug)]
struct SyntaxError<'a> {
    input: &'a str,
    message: Option<String>,
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Self {
            input,
            message: None,
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

/// Recoverable mismatch; alternatives are still tried
fn reject<'a, T>(input: &'a str, message: impl Into<String>) -> PResult<'a, T> {
    Err(nom::Err::Error(SyntaxError {
        input,
        message: Some(message.into()),
    }))
}

/// Hard failure; stops the parse at `input`
fn abort<'a, T>(input: &'a str, message: impl Into<String>) -> PResult<'a, T> {
    Err(nom::Err::Failure(SyntaxError {
        input,
        message: Some(message.into()),
    }))
}

/// Remainder of the current line, terminator consumed
fn line(input: &str) -> PResult<'_, &str> {
    terminated(not_line_ending, line_ending)(input)
}

fn blank(input: &str) -> PResult<'_, ()> {
    value((), terminated(space0, line_ending))(input)
}

fn comment(input: &str) -> PResult<'_, ()> {
    value((), tuple((space0, char('#'), not_line_ending, line_ending)))(input)
}

fn ignorable(input: &str) -> PResult<'_, ()> {
    alt((blank, comment))(input)
}

fn skip_ignorable(input: &str) -> PResult<'_, ()> {
    value((), many0(ignorable))(input)
}

fn tag_line(input: &str) -> PResult<'_, Vec<String>> {
    let (rest, (_, _, text)) = tuple((space0, peek(char('@')), line))(input)?;
    Ok((rest, text.split_whitespace().map(str::to_string).collect()))
}

fn tags(input: &str) -> PResult<'_, Vec<String>> {
    let (rest, groups) = many0(terminated(tag_line, skip_ignorable))(input)?;
    Ok((rest, groups.into_iter().flatten().collect()))
}

/// Header line starting with one of `keywords`; returns the keyword and trimmed text
fn header_line<'a>(
    input: &'a str,
    keywords: &[&'static str],
) -> PResult<'a, (&'static str, &'a str)> {
    let (after_indent, _) = space0(input)?;
    for &keyword in keywords {
        if let Ok((rest, _)) = tag::<_, _, SyntaxError<'a>>(keyword)(after_indent) {
            let (rest, text) = line(rest)?;
            return Ok((rest, (keyword.trim_end_matches(':'), text.trim())));
        }
    }
    reject(input, format!("expected {}", keywords.join(" or ")))
}

const STRUCTURAL_PREFIXES: &[&str] = &[
    "Feature:",
    "Background:",
    "Scenario:",
    "Scenario Outline:",
    "Example:",
    "Examples:",
    "Given ",
    "When ",
    "Then ",
    "And ",
    "But ",
    "* ",
    "@",
    "#",
    "|",
    "\"\"\"",
    "```",
];

fn description_line(input: &str) -> PResult<'_, &str> {
    let (rest, text) = line(input)?;
    let text = text.trim();
    if text.is_empty() || STRUCTURAL_PREFIXES.iter().any(|p| text.starts_with(p)) {
        return reject(input, "expected description text");
    }
    Ok((rest, text))
}

fn description(input: &str) -> PResult<'_, Vec<String>> {
    let (rest, lines) = many0(alt((
        map(description_line, |text| Some(text.to_string())),
        value(None, ignorable),
    )))(input)?;
    Ok((rest, lines.into_iter().flatten().collect()))
}

struct GherkinParser<'a> {
    source: &'a str,
}

impl<'a> GherkinParser<'a> {
    fn line_at(&self, input: &str) -> usize {
        let offset = self.source.len().saturating_sub(input.len());
        self.source[..offset].matches('\n').count() + 1
    }

    fn document(&self, input: &'a str) -> PResult<'a, GherkinDocument> {
        let (rest, _) = skip_ignorable(input)?;
        let (rest, feature) = opt(|i: &'a str| self.feature(i))(rest)?;
        let (rest, _) = skip_ignorable(rest)?;
        if rest.is_empty() {
            return Ok((rest, GherkinDocument { feature }));
        }
        let (_, text) = line(rest)?;
        let found = text.trim();
        if feature.is_some() {
            abort(rest, format!("unexpected line '{found}'"))
        } else {
            abort(rest, format!("expected 'Feature:' header, found '{found}'"))
        }
    }

    fn feature(&self, input: &'a str) -> PResult<'a, Feature> {
        let (rest, tags) = tags(input)?;
        let line_no = self.line_at(rest);
        let (rest, (_, name)) = header_line(rest, &["Feature:"])?;
        let (rest, description) = description(rest)?;
        let (rest, background) = opt(preceded(skip_ignorable, |i: &'a str| self.background(i)))(rest)?;
        let (rest, scenarios) = many0(preceded(skip_ignorable, |i: &'a str| self.scenario(i)))(rest)?;
        Ok((
            rest,
            Feature {
                tags,
                name: name.to_string(),
                description,
                line: line_no,
                background,
                scenarios,
            },
        ))
    }

    fn background(&self, input: &'a str) -> PResult<'a, Background> {
        let line_no = self.line_at(input);
        let (rest, (_, name)) = header_line(input, &["Background:"])?;
        let (rest, _) = description(rest)?;
        let (rest, steps) = self.steps(rest)?;
        Ok((
            rest,
            Background {
                name: name.to_string(),
                line: line_no,
                steps,
            },
        ))
    }

    fn scenario(&self, input: &'a str) -> PResult<'a, Scenario> {
        let (rest, tags) = tags(input)?;
        let line_no = self.line_at(rest);
        let (rest, (keyword, name)) =
            header_line(rest, &["Scenario Outline:", "Scenario:", "Example:"])?;
        let (rest, _) = description(rest)?;
        let (rest, steps) = self.steps(rest)?;
        let (rest, examples) = many0(preceded(skip_ignorable, |i: &'a str| self.examples(i)))(rest)?;
        Ok((
            rest,
            Scenario {
                tags,
                keyword: keyword.to_string(),
                name: name.to_string(),
                line: line_no,
                steps,
                examples,
            },
        ))
    }

    fn examples(&self, input: &'a str) -> PResult<'a, Examples> {
        let (rest, tags) = tags(input)?;
        let line_no = self.line_at(rest);
        let (rest, (_, name)) = header_line(rest, &["Examples:"])?;
        let (rest, _) = description(rest)?;
        let (rest, rows) = match self.table(rest) {
            Err(nom::Err::Error(_)) => return abort(rest, "expected a table under 'Examples:'"),
            other => other?,
        };
        Ok((
            rest,
            Examples {
                tags,
                name: name.to_string(),
                line: line_no,
                rows,
            },
        ))
    }

    fn steps(&self, input: &'a str) -> PResult<'a, Vec<Step>> {
        many0(preceded(skip_ignorable, |i: &'a str| self.step(i)))(input)
    }

    fn step(&self, input: &'a str) -> PResult<'a, Step> {
        let line_no = self.line_at(input);
        let (after_indent, _) = space0(input)?;
        let Some((keyword, rest)) = StepKeyword::PREFIXES
            .iter()
            .find_map(|&(prefix, keyword)| after_indent.strip_prefix(prefix).map(|r| (keyword, r)))
        else {
            return reject(input, "expected a step");
        };
        let (rest, text) = line(rest)?;
        let (rest, argument) = opt(preceded(skip_ignorable, |i: &'a str| self.argument(i)))(rest)?;
        Ok((
            rest,
            Step {
                keyword,
                text: text.trim().to_string(),
                line: line_no,
                argument,
            },
        ))
    }

    fn argument(&self, input: &'a str) -> PResult<'a, StepArgument> {
        alt((
            map(|i: &'a str| self.docstring(i), StepArgument::DocString),
            map(|i: &'a str| self.table(i), StepArgument::DataTable),
        ))(input)
    }

    fn docstring(&self, input: &'a str) -> PResult<'a, DocString> {
        let line_no = self.line_at(input);
        let (after_indent, indent) = space0(input)?;
        let (rest, delimiter) = alt((tag("\"\"\""), tag("```")))(after_indent)?;
        let (mut rest, media_type) = line(rest)?;
        let mut body = Vec::new();
        loop {
            if rest.is_empty() {
                return abort(input, format!("unterminated docstring (no closing {delimiter})"));
            }
            let (next, text) = line(rest)?;
            if text.trim() == delimiter {
                let media_type = media_type.trim();
                return Ok((
                    next,
                    DocString {
                        media_type: (!media_type.is_empty()).then(|| media_type.to_string()),
                        content: body.join("\n"),
                        line: line_no,
                    },
                ));
            }
            body.push(text.strip_prefix(indent).unwrap_or_else(|| text.trim_start()));
            rest = next;
        }
    }

    fn table_row(&self, input: &'a str) -> PResult<'a, TableRow> {
        let line_no = self.line_at(input);
        let (rest, (_, _, text)) = tuple((space0, char('|'), line))(input)?;
        let Some(inner) = text.trim_end().strip_suffix('|') else {
            return abort(input, "table row must end with '|'");
        };
        let cells = inner.split('|').map(|cell| cell.trim().to_string()).collect();
        Ok((rest, TableRow { cells, line: line_no }))
    }

    fn table(&self, input: &'a str) -> PResult<'a, Vec<TableRow>> {
        let (mut rest, first) = self.table_row(input)?;
        let width = first.cells.len();
        let mut rows = vec![first];
        loop {
            match self.table_row(rest) {
                Ok((next, row)) => {
                    if row.cells.len() != width {
                        return abort(
                            rest,
                            format!("inconsistent cell count: expected {width}, found {}", row.cells.len()),
                        );
                    }
                    rows.push(row);
                    rest = next;
                }
                Err(nom::Err::Error(_)) => return Ok((rest, rows)),
                Err(e) => return Err(e),
            }
        }
    }

    fn grammar_error(&self, error: SyntaxError<'_>) -> GrammarError {
        let line_no = self.line_at(error.input);
        let message = error.message.unwrap_or_else(|| "malformed line".to_string());
        GrammarError::new(line_no, message)
    }
}

/// Parse a complete document
///
/// # Errors
/// `GrammarError` with the line the parser stopped at
pub fn parse_document(text: &str) -> GrammarResult<GherkinDocument> {
    let source: Cow<'_, str> = if text.is_empty() || text.ends_with('\n') {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{text}\n"))
    };
    let parser = GherkinParser { source: &source };
    match parser.document(&source) {
        Ok((_, document)) => Ok(document),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(parser.grammar_error(e)),
        Err(nom::Err::Incomplete(_)) => {
            Err(GrammarError::new(parser.line_at(""), "unexpected end of input"))
        }
    }
}

/// Validates scenario text against the document grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct GrammarValidator;

impl GrammarValidator {
    /// Create new validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Zero issues, or one issue naming the endpoint and the parser message
    #[must_use]
    pub fn validate(&self, text: &str, context: &ScenarioContext) -> Vec<Issue> {
        match parse_document(text) {
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::debug!("Grammar error in {}: {}", context, e);
                let message = format!(
                    "Gherkin parse error for {} at L{}: {}",
                    context.endpoint(),
                    e.line,
                    e.message
                );
                vec![Issue::new(IssueCategory::Grammar, context, Some(e.line), message)]
            }
        }
    }
}

impl ScenarioCheck for GrammarValidator {
    fn name(&self) -> &'static str {
        "grammar"
    }

    fn check(&self, record: &ScenarioRecord, context: &ScenarioContext) -> Vec<Issue> {
        self.validate(record.text(), context)
    }
}
