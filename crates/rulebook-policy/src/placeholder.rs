//! Placeholder grammar
//!
//! Rulebook templates name variable parts of a phrase with tokens such as
//! `<url>` or `<json_path>`. This module owns the fixed token → regex
//! fragment table used by the template compiler.
//!
//! The table is a `static` slice: built at compile time, shared by every
//! thread, never mutated. Matching is exact, and [`match_at`] tries the
//! longest tokens first so a token can never be shadowed by a shorter one
//! that happens to be its prefix.

use once_cell::sync::Lazy;

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_]*";
const UNQUOTED_TEXT: &str = r#"[^"\\]+"#;
const QUOTED_TEXT: &str = r#"[^"]+"#;
const JSON_PATH: &str = r"[A-Za-z0-9_\.\[\]\*]+";
const DIGITS: &str = r"\d+";

/// One entry of the placeholder grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderRule {
    /// Literal token as written in a rulebook, e.g. `<url>`
    pub token: &'static str,
    /// Regex fragment substituted for the token
    pub fragment: &'static str,
}

impl PlaceholderRule {
    const fn new(token: &'static str, fragment: &'static str) -> Self {
        Self { token, fragment }
    }
}

/// The placeholder table, in authoring order
pub static PLACEHOLDER_RULES: &[PlaceholderRule] = &[
    // Request shape
    PlaceholderRule::new("<url>", r"\S+"),
    PlaceholderRule::new("<variable_name>", IDENT),
    PlaceholderRule::new("<path>", UNQUOTED_TEXT),
    PlaceholderRule::new("<query_param_name>", IDENT),
    PlaceholderRule::new("<query_param_value>", UNQUOTED_TEXT),
    PlaceholderRule::new("<path_param_name>", IDENT),
    PlaceholderRule::new("<value>", r"[^ \t\r\n]+"),
    PlaceholderRule::new("<header_name>", r"[A-Za-z0-9\-]+"),
    PlaceholderRule::new("<header_value>", UNQUOTED_TEXT),
    PlaceholderRule::new("<integer_value>", r"[+-]?[0-9]+"),
    PlaceholderRule::new("<float_value>", r"[+-]?(?:[0-9]+\.[0-9]+|[0-9]+)"),
    PlaceholderRule::new("<string_message>", r".+?"),
    // Response paths
    PlaceholderRule::new("<Json_path>", JSON_PATH),
    PlaceholderRule::new("<jsonPath>", JSON_PATH),
    PlaceholderRule::new("<json_path>", JSON_PATH),
    PlaceholderRule::new("<JSON_path>", JSON_PATH),
    PlaceholderRule::new("<ArrayName>", IDENT),
    PlaceholderRule::new("<AttributeName>", IDENT),
    // Variables
    PlaceholderRule::new("<Variable>", IDENT),
    PlaceholderRule::new("<variable1>", IDENT),
    PlaceholderRule::new("<variable2>", IDENT),
    PlaceholderRule::new("<String Value>", QUOTED_TEXT),
    // Files
    PlaceholderRule::new("<csv_file_path>", UNQUOTED_TEXT),
    PlaceholderRule::new("<excel_sheet_path>", UNQUOTED_TEXT),
    PlaceholderRule::new("<Json_file_path>", UNQUOTED_TEXT),
    PlaceholderRule::new("<feature_file_path>", UNQUOTED_TEXT),
    PlaceholderRule::new("<sheet_name>", QUOTED_TEXT),
    PlaceholderRule::new("<classPath>", QUOTED_TEXT),
    // Method and status
    PlaceholderRule::new("<method>", r"(?:GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)"),
    PlaceholderRule::new("<method_name>", IDENT),
    PlaceholderRule::new("<expectedType>", r"[A-Za-z]+"),
    PlaceholderRule::new("<expected_status_code>", r"\d{3}"),
    PlaceholderRule::new("<path_parameter>", UNQUOTED_TEXT),
    // Authentication
    PlaceholderRule::new("<authorization_type>", r"(?:Bearer|Basic|Digest|OAuth)"),
    PlaceholderRule::new("<username_value>", QUOTED_TEXT),
    PlaceholderRule::new("<password_value>", QUOTED_TEXT),
    PlaceholderRule::new("<token_variable>", IDENT),
    // Spreadsheets
    PlaceholderRule::new("<spreadsheet-id>", QUOTED_TEXT),
    PlaceholderRule::new("<column_name>", r"[A-Za-z_][A-Za-z0-9_]+"),
    PlaceholderRule::new("<column_index>", DIGITS),
    PlaceholderRule::new("<row_index>", DIGITS),
    // Cookies and timing
    PlaceholderRule::new("<new_value>", UNQUOTED_TEXT),
    PlaceholderRule::new("Milliseconds", DIGITS),
];

/// Same rules ordered longest token first (ties broken lexicographically)
static LONGEST_FIRST: Lazy<Vec<&'static PlaceholderRule>> = Lazy::new(|| {
    let mut rules: Vec<&'static PlaceholderRule> = PLACEHOLDER_RULES.iter().collect();
    rules.sort_by(|a, b| {
        b.token
            .len()
            .cmp(&a.token.len())
            .then_with(|| a.token.cmp(b.token))
    });
    rules
});

/// Find the longest placeholder token that `input` starts with
#[must_use]
pub fn match_at(input: &str) -> Option<&'static PlaceholderRule> {
    LONGEST_FIRST
        .iter()
        .copied()
        .find(|rule| input.starts_with(rule.token))
}
