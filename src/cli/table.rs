//! Table formatting for extracted records and column listings
//!
//! Renders rows of [`CellValue`]s as aligned TSV (the terminal default),
//! CSV, or Markdown. JSON and YAML output is handled by the commands
//! themselves since it serializes the underlying records directly.

use chrono::NaiveDate;
use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::core::TypedValue;

/// Widest a TSV column may grow before values are truncated
const MAX_COLUMN_WIDTH: usize = 40;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    /// Monetary amount; the terminal table shows two decimals
    Money(f64),
    Count(i64),
    Date(NaiveDate),
    /// No value (displayed as "-")
    Empty,
    /// A field that failed to extract
    Error(String),
}

impl From<Option<&TypedValue>> for CellValue {
    fn from(value: Option<&TypedValue>) -> Self {
        match value {
            Some(TypedValue::Money(v)) => CellValue::Money(*v),
            Some(TypedValue::Count(v)) => CellValue::Count(*v),
            Some(TypedValue::Date(d)) => CellValue::Date(*d),
            Some(TypedValue::Text(s)) => CellValue::Text(s.clone()),
            None => CellValue::Empty,
        }
    }
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Money(v) => format!("{:>width$.2}", v, width = width),
            CellValue::Count(n) => format!("{:>width$}", n, width = width),
            CellValue::Date(_) => format!("{:<width$}", self.raw(), width = width),
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
            CellValue::Error(e) => {
                let truncated = truncate_str(e, width.saturating_sub(2));
                format!("{:<width$}", style(truncated).red(), width = width)
            }
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Text(s) | CellValue::Error(s) => escape_csv(s),
            other => other.raw(),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Empty => "-".to_string(),
            CellValue::Error(e) => format!("**{}**", e),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Raw string value, no styling
    pub fn raw(&self) -> String {
        match self {
            CellValue::Text(s) | CellValue::Error(s) => s.clone(),
            CellValue::Money(v) => v.to_string(),
            CellValue::Count(n) => n.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of this cell's content
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter {
    headers: Vec<String>,
    noun: &'static str,
    show_summary: bool,
}

impl TableFormatter {
    pub fn new(headers: Vec<String>, noun: &'static str) -> Self {
        Self {
            headers,
            noun,
            show_summary: true,
        }
    }

    /// Disable the trailing "N item(s)" line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Output rows in the specified format
    pub fn output(&self, rows: &[Vec<CellValue>], format: OutputFormat) {
        match format {
            OutputFormat::Csv => print!("{}", self.render_csv(rows)),
            OutputFormat::Md => println!("{}", self.render_md(rows)),
            _ => self.output_tsv(rows),
        }
    }

    fn calculate_widths(&self, rows: &[Vec<CellValue>]) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                header
                    .chars()
                    .count()
                    .max(max_content.saturating_add(2))
                    .min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }

    fn output_tsv(&self, rows: &[Vec<CellValue>]) {
        let widths = self.calculate_widths(rows);

        let header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<width$}", style(truncate_str(h, *w)).bold(), width = *w))
            .collect();
        println!("{}", header.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let parts: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| row.get(i).unwrap_or(&CellValue::Empty).format_tsv(*w))
                .collect();
            println!("{}", parts.join(" "));
        }

        if self.show_summary {
            println!();
            println!("{} {}(s)", style(rows.len()).cyan(), self.noun);
        }
    }

    /// Header line plus one line per row
    pub fn render_csv(&self, rows: &[Vec<CellValue>]) -> String {
        let mut out = String::new();
        let header: Vec<String> = self.headers.iter().map(|h| escape_csv(h)).collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in rows {
            let cells: Vec<String> = (0..self.headers.len())
                .map(|i| row.get(i).map(CellValue::format_csv).unwrap_or_default())
                .collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }

    pub fn render_md(&self, rows: &[Vec<CellValue>]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(|h| h.replace('|', "\\|")));
        for row in rows {
            builder.push_record(
                (0..self.headers.len())
                    .map(|i| row.get(i).unwrap_or(&CellValue::Empty).format_md()),
            );
        }
        builder.build().with(Style::markdown()).to_string()
    }
}
