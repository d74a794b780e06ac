//! Specification formats and their fixed lexical conventions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Header keyword that declares variable names (matched case-insensitively).
pub const VARIABLES_HEADER: &str = "variables:";

/// Keyword that declares one variable in the multi-valued network format.
pub const VARIABLE_KEYWORD: &str = "variable";

/// Comment marker; everything from here to end of line is ignored.
pub const COMMENT_CHAR: char = '#';

/// Decimal places written per probability when serializing a table.
pub const SERIALIZED_DECIMALS: usize = 10;

/// The two textual specification formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Raw joint probability table (`.inp`).
    JointTable,
    /// Bayesian network of CPTs (`.net`).
    Network,
}

impl Format {
    /// Pick the format from a file extension (`.inp` or `.net`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("inp") => Some(Format::JointTable),
            Some(ext) if ext.eq_ignore_ascii_case("net") => Some(Format::Network),
            _ => None,
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::JointTable => "inp",
            Format::Network => "net",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::JointTable => write!(f, "joint_table"),
            Format::Network => write!(f, "network"),
        }
    }
}

/// Strip a trailing `#` comment and surrounding whitespace.
///
/// Returns `None` when nothing but whitespace or comment remains.
pub fn strip_comment(line: &str) -> Option<&str> {
    let content = match line.find(COMMENT_CHAR) {
        Some(pos) => &line[..pos],
        None => line,
    };
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// If `line` starts with the `variables:` header (any case), return the rest.
pub fn strip_variables_header(line: &str) -> Option<&str> {
    let head = line.get(..VARIABLES_HEADER.len())?;
    if head.eq_ignore_ascii_case(VARIABLES_HEADER) {
        Some(line[VARIABLES_HEADER.len()..].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            Format::from_path(Path::new("inputs/medical_test.inp")),
            Some(Format::JointTable)
        );
        assert_eq!(
            Format::from_path(Path::new("alarm.NET")),
            Some(Format::Network)
        );
        assert_eq!(Format::from_path(Path::new("notes.txt")), None);
        assert_eq!(Format::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn strip_comment_variants() {
        assert_eq!(strip_comment("00: 0.5   # base"), Some("00: 0.5"));
        assert_eq!(strip_comment("# only a comment"), None);
        assert_eq!(strip_comment("    "), None);
        assert_eq!(strip_comment("  11: 0.25"), Some("11: 0.25"));
    }

    #[test]
    fn header_is_case_insensitive() {
        assert_eq!(strip_variables_header("Variables: A, B"), Some("A, B"));
        assert_eq!(strip_variables_header("VARIABLES:X"), Some("X"));
        assert_eq!(strip_variables_header("variable X"), None);
        assert_eq!(strip_variables_header("00: 0.1"), None);
    }

    #[test]
    fn format_serde_snake_case() {
        let json = serde_json::to_string(&Format::JointTable).unwrap();
        assert_eq!(json, "\"joint_table\"");
        let back: Format = serde_json::from_str("\"network\"").unwrap();
        assert_eq!(back, Format::Network);
    }
}
