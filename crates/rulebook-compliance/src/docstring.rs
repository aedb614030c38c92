//! Docstring tracking for line scanners

/// Delimiter of a `"""` docstring
pub(crate) const DELIMITER: &str = "\"\"\"";

/// Role of one line relative to `"""` docstrings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DocLine {
    /// Ordinary line
    Text,
    /// Opening delimiter
    Open,
    /// Inside a docstring
    Body,
    /// Closing delimiter
    Close,
}

impl DocLine {
    /// Whether the line belongs to a docstring, delimiters included
    #[inline]
    pub(crate) fn in_docstring(self) -> bool {
        self != DocLine::Text
    }
}

/// Classify every line. An unterminated docstring runs to the end.
pub(crate) fn scan<S: AsRef<str>>(lines: &[S]) -> Vec<DocLine> {
    let mut open = false;
    lines
        .iter()
        .map(|line| {
            let delimiter = line.as_ref().trim_start().starts_with(DELIMITER);
            match (open, delimiter) {
                (false, true) => {
                    open = true;
                    DocLine::Open
                }
                (true, true) => {
                    open = false;
                    DocLine::Close
                }
                (true, false) => DocLine::Body,
                (false, false) => DocLine::Text,
            }
        })
        .collect()
}
