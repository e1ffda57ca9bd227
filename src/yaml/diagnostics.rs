//! YAML error diagnostics for mapping, rule, and config files

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

/// YAML syntax or shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("YAML error: {message}")]
#[diagnostic(code(staymap::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    /// The underlying error message
    message: String,
}

impl YamlSyntaxError {
    /// Create a syntax error from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }
}

/// Errors from loading a YAML file
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Byte offset of a 1-based line/column, clamped to the end of that line
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let text = source[line_start..].split('\n').next().unwrap_or_default();
    let column_offset = text
        .char_indices()
        .nth(column.saturating_sub(1))
        .map_or(text.len(), |(i, _)| i);
    line_start + column_offset
}

/// Suggestions for common mistakes in mapping files
fn generate_help(message: &str) -> Option<String> {
    let msg_lower = message.to_lowercase();

    if msg_lower.contains("tab") {
        return Some(
            "YAML requires spaces for indentation, not tabs. Replace tabs with spaces.".to_string(),
        );
    }

    if msg_lower.contains("duplicate") {
        return Some("Each target field can only be mapped once. Remove the duplicate key.".to_string());
    }

    if msg_lower.contains("expected a string") || msg_lower.contains("invalid type") {
        return Some(
            "Locators must be strings: quote column names and path expressions.".to_string(),
        );
    }

    if msg_lower.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have incorrect indentation.".to_string());
    }

    if msg_lower.contains("found unexpected ':'") {
        return Some("Colons in values need to be quoted: \"value:with:colons\"".to_string());
    }

    if msg_lower.contains("did not find expected") {
        return Some("Check for an unclosed bracket or quote.".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 1), 12);
        assert_eq!(line_col_to_offset(source, 2, 3), 8);
        // Past the end of a line or the file
        assert_eq!(line_col_to_offset(source, 1, 40), 5);
        assert_eq!(line_col_to_offset(source, 9, 1), source.len());
    }

    #[test]
    fn test_help_generation() {
        assert!(generate_help("found tab character").is_some());
        assert!(generate_help("duplicate entry with key \"guestName\"").is_some());
        assert!(generate_help("invalid type: sequence, expected a string").is_some());
        assert!(generate_help("some random error").is_none());
    }

    #[test]
    fn test_from_serde_error() {
        let source = "guestName: Guest\ncheckInDate: [a, b]\n";
        let err = serde_yml::from_str::<std::collections::BTreeMap<String, String>>(source)
            .unwrap_err();
        let diag = YamlSyntaxError::from_serde_error(&err, source, "mapping.yaml");
        assert!(!diag.message.is_empty());
        assert!(diag.to_string().starts_with("YAML error: "));
        assert!(diag.help.is_some());
    }
}
