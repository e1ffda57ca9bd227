//! `staymap import` command - extract normalized booking records from CSV
//!
//! Records go to stdout; progress and the import summary go to stderr so
//! the output can be piped.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::cli::helpers::{load_mapping, load_rules, print_structured};
use crate::cli::table::{CellValue, TableFormatter};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{
    extract_rows, read_table, suggest, try_coerce, Config, ExtractionBatch, FieldMapping,
    TargetField, TypedValue, ValueOverride,
};
use crate::yaml::read_yaml_file;

#[derive(clap::Args, Debug)]
#[command(group(clap::ArgGroup::new("mapping_source").required(true).args(["mapping", "auto"])))]
pub struct ImportArgs {
    /// CSV file to import
    pub file: PathBuf,

    /// Mapping file of `targetField: column` pairs
    #[arg(long, short = 'm')]
    pub mapping: Option<PathBuf>,

    /// Use the suggested mapping instead of a mapping file
    #[arg(long)]
    pub auto: bool,

    /// YAML rule file for --auto
    #[arg(long, short = 'r', requires = "auto")]
    pub rules: Option<PathBuf>,

    /// YAML list of corrections: `{row, field, value, reason}` (rows are 1-based)
    #[arg(long)]
    pub overrides: Option<PathBuf>,

    /// Check the file without printing records
    #[arg(long)]
    pub dry_run: bool,

    /// Exit successfully even when some fields failed to extract
    #[arg(long)]
    pub skip_errors: bool,
}

/// One entry of an overrides file
#[derive(Debug, Deserialize)]
struct OverrideEntry {
    row: usize,
    field: String,
    value: Value,
    #[serde(default)]
    reason: Option<String>,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let table = read_table(&args.file, &config.parse_options())?;
    let required = config.required_fields();

    let mapping = match &args.mapping {
        Some(path) => load_mapping(path)?,
        None => {
            let rules = load_rules(&config, args.rules.as_deref())?;
            FieldMapping::from(suggest(&table.header_names(), &rules))
        }
    };

    let missing = mapping.missing(&required);
    if !missing.is_empty() {
        warn!(fields = %missing.join(", "), "Mapping has no column for required field(s)");
    }

    if !global.quiet {
        eprintln!(
            "{} Importing {} row(s) from {}{}",
            style("→").blue(),
            style(table.total_row_count).cyan(),
            style(args.file.display()).yellow(),
            if args.dry_run {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        );
    }

    let batch = extract_rows(&table, &mapping, &required);
    info!(
        rows = batch.records.len(),
        field_errors = batch.field_errors,
        "Extraction finished"
    );

    let overrides = match &args.overrides {
        Some(path) => load_overrides(path, &batch)?,
        None => Vec::new(),
    };

    if !global.quiet {
        for record in &batch.records {
            for (field, error) in record.errors() {
                eprintln!(
                    "{} row {}: {} {}",
                    style("✗").red(),
                    record.row + 1,
                    style(field).yellow(),
                    error
                );
            }
        }
    }

    if !args.dry_run {
        print_records(&batch, &mapping, &overrides, global.format)?;
    }

    if !global.quiet {
        print_summary(&batch, overrides.len());
    }

    if !batch.is_clean() && !args.skip_errors {
        return Err(miette::miette!(
            "Import completed with {} field error(s) in {} row(s)",
            batch.field_errors,
            batch.rows_with_errors
        ));
    }

    Ok(())
}

/// Read an overrides file, coercing each value for its field
fn load_overrides(path: &Path, batch: &ExtractionBatch) -> Result<Vec<ValueOverride>> {
    let entries: Vec<OverrideEntry> = read_yaml_file(path)?;
    entries
        .into_iter()
        .map(|entry| {
            let record = entry
                .row
                .checked_sub(1)
                .and_then(|i| batch.records.get(i))
                .ok_or_else(|| {
                    miette::miette!(
                        "Override for '{}' names row {}, but the file has {} row(s)",
                        entry.field,
                        entry.row,
                        batch.records.len()
                    )
                })?;
            let value = try_coerce(&entry.field, &entry.value)
                .map_err(|e| miette::miette!("Override for row {} {}: {}", entry.row, entry.field, e))?;
            debug!(row = entry.row, field = %entry.field, "Applying override");

            let edit = ValueOverride::new(record, entry.field, value);
            Ok(match entry.reason {
                Some(reason) => edit.with_reason(reason),
                None => edit,
            })
        })
        .collect()
}

/// Output columns: schema fields in schema order, then any others by name
fn record_columns(mapping: &FieldMapping) -> Vec<String> {
    let mapped: Vec<&str> = mapping.mapped().map(|(field, _)| field).collect();
    let mut columns: Vec<String> = TargetField::all()
        .iter()
        .map(|f| f.as_str())
        .filter(|f| mapped.contains(f))
        .map(str::to_string)
        .collect();
    for field in mapped {
        if field.parse::<TargetField>().is_err() {
            columns.push(field.to_string());
        }
    }
    columns
}

fn print_records(
    batch: &ExtractionBatch,
    mapping: &FieldMapping,
    overrides: &[ValueOverride],
    format: OutputFormat,
) -> Result<()> {
    let records: Vec<BTreeMap<String, Option<TypedValue>>> = batch
        .records
        .iter()
        .map(|r| r.effective(overrides))
        .collect();

    match format {
        OutputFormat::Auto | OutputFormat::Json | OutputFormat::Yaml => {
            let format = if format == OutputFormat::Yaml {
                OutputFormat::Yaml
            } else {
                OutputFormat::Json
            };
            print_structured(&records, format)
        }
        OutputFormat::Csv | OutputFormat::Tsv | OutputFormat::Md => {
            let columns = record_columns(mapping);
            let rows: Vec<Vec<CellValue>> = batch
                .records
                .iter()
                .zip(&records)
                .map(|(result, values)| {
                    columns
                        .iter()
                        .map(|c| match result.fields.get(c).and_then(|f| f.error.as_ref()) {
                            Some(e) if !overrides.iter().any(|o| o.row == result.row && &o.field == c) => {
                                CellValue::Error(e.clone())
                            }
                            _ => CellValue::from(values.get(c).and_then(Option::as_ref)),
                        })
                        .collect()
                })
                .collect();
            TableFormatter::new(columns, "record")
                .without_summary()
                .output(&rows, format);
            Ok(())
        }
    }
}

fn print_summary(batch: &ExtractionBatch, overrides: usize) {
    eprintln!();
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("{}", style("Import Summary").bold());
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  Rows processed:   {}", style(batch.records.len()).cyan());
    eprintln!(
        "  Clean rows:       {}",
        style(batch.records.len() - batch.rows_with_errors).green()
    );
    if batch.rows_with_errors > 0 {
        eprintln!("  Rows with errors: {}", style(batch.rows_with_errors).red());
        eprintln!("  Field errors:     {}", style(batch.field_errors).red());
    }
    if overrides > 0 {
        eprintln!("  Overrides:        {}", style(overrides).yellow());
    }
}
