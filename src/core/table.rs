//! Delimited text parsing for booking exports
//!
//! Turns raw CSV text into a header list (with one sample value per column)
//! and a matrix of string rows. Nothing here knows about the target schema.
//!
//! Lines are split on `\n` before tokenizing, so a quoted field cannot span
//! physical lines.

use serde::{Deserialize, Serialize};
use std::fs;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// What to do with a data row whose cell count differs from the header count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaggedRowPolicy {
    /// Pad short rows with empty cells and truncate long rows
    #[default]
    Pad,
    /// Fail the whole parse
    Reject,
    /// Drop the row and keep going
    Skip,
}

/// What to do with a row that ends inside a quoted field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnterminatedQuotePolicy {
    /// Keep scanning to the end of the line and accept what was read
    #[default]
    Lenient,
    /// Fail the whole parse
    Strict,
}

/// Parser settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub ragged_rows: RaggedRowPolicy,
    pub unterminated_quotes: UnterminatedQuotePolicy,
}

/// One source column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHeader {
    /// Ordinal position in the header row
    pub index: usize,
    /// Trimmed header text
    pub name: String,
    /// Trimmed value of this column in the first data row, or empty
    pub sample_value: String,
}

/// A parsed document: headers plus rectangular data rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTable {
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<Vec<String>>,
    pub total_row_count: usize,
}

impl ParsedTable {
    /// Header names in column order
    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|h| h.name.as_str()).collect()
    }

    /// Find a column by name, exact match first, then case-insensitive
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers
            .iter()
            .find(|h| h.name == name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
            })
            .map(|h| h.index)
    }

    /// Get a single cell
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }
}

/// Errors that can occur while reading or parsing a table
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("no data: input is empty after removing blank lines")]
    #[diagnostic(code(staymap::table::empty))]
    Empty,

    #[error("failed to read '{path}': {source}")]
    #[diagnostic(code(staymap::table::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' is not valid UTF-8 text")]
    #[diagnostic(code(staymap::table::encoding), help("re-export the file as UTF-8 CSV"))]
    Encoding(PathBuf),

    #[error("line {line}: unterminated quoted field")]
    #[diagnostic(
        code(staymap::table::unterminated_quote),
        help("set unterminated_quotes: lenient to accept the rest of the line as the cell")
    )]
    UnterminatedQuote { line: usize },

    #[error("line {line}: expected {expected} cells, found {found}")]
    #[diagnostic(
        code(staymap::table::ragged_row),
        help("set ragged_rows: pad or ragged_rows: skip to accept uneven rows")
    )]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Split one line into cells
///
/// Handles RFC 4180 quoting: commas inside quotes are literal and `""`
/// inside a quoted field is an escaped quote. Cells are trimmed. An
/// unterminated quote runs to the end of the line.
pub fn tokenize_row(line: &str) -> Vec<String> {
    scan_row(line).0
}

/// Single left-to-right scan; the flag reports whether the line ended
/// inside quotes.
fn scan_row(line: &str) -> (Vec<String>, bool) {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());

    (cells, in_quotes)
}

/// Parse CSV text with default options
pub fn parse(text: &str) -> Result<ParsedTable, ParseError> {
    parse_with(text, &ParseOptions::default())
}

/// Parse CSV text
pub fn parse_with(text: &str, options: &ParseOptions) -> Result<ParsedTable, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    // (1-based physical line number, content)
    let lines: Vec<(usize, &str)> = text
        .split('\n')
        .enumerate()
        .map(|(i, l)| (i + 1, l.strip_suffix('\r').unwrap_or(l)))
        .filter(|(_, l)| !l.trim().is_empty())
        .collect();

    let (header_line, data_lines) = lines.split_first().ok_or(ParseError::Empty)?;

    let names = tokenize_checked(header_line.0, header_line.1, options)?;
    let width = names.len();

    let mut rows = Vec::with_capacity(data_lines.len());
    for &(line_no, line) in data_lines {
        let mut cells = tokenize_checked(line_no, line, options)?;
        if cells.len() != width {
            match options.ragged_rows {
                RaggedRowPolicy::Pad => {
                    debug!(line = line_no, expected = width, found = cells.len(), "Resizing ragged row");
                    cells.resize(width, String::new());
                }
                RaggedRowPolicy::Reject => {
                    return Err(ParseError::RaggedRow {
                        line: line_no,
                        expected: width,
                        found: cells.len(),
                    });
                }
                RaggedRowPolicy::Skip => {
                    warn!(line = line_no, expected = width, found = cells.len(), "Skipping ragged row");
                    continue;
                }
            }
        }
        rows.push(cells);
    }

    let headers = names
        .into_iter()
        .enumerate()
        .map(|(index, name)| ColumnHeader {
            index,
            name,
            sample_value: rows
                .first()
                .and_then(|r| r.get(index))
                .cloned()
                .unwrap_or_default(),
        })
        .collect();

    let total_row_count = rows.len();
    Ok(ParsedTable {
        headers,
        rows,
        total_row_count,
    })
}

fn tokenize_checked(
    line_no: usize,
    line: &str,
    options: &ParseOptions,
) -> Result<Vec<String>, ParseError> {
    let (cells, unterminated) = scan_row(line);
    if unterminated {
        match options.unterminated_quotes {
            UnterminatedQuotePolicy::Lenient => {
                debug!(line = line_no, "Accepting unterminated quoted field");
            }
            UnterminatedQuotePolicy::Strict => {
                return Err(ParseError::UnterminatedQuote { line: line_no });
            }
        }
    }
    Ok(cells)
}

/// Read and parse a file in one shot
///
/// The whole file is read into memory. A leading UTF-8 byte order mark is
/// ignored.
pub fn read_table(path: &Path, options: &ParseOptions) -> Result<ParsedTable, ParseError> {
    let bytes = fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| ParseError::Encoding(path.to_path_buf()))?;
    parse_with(&text, options)
}
