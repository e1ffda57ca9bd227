//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::core::{Config, FieldMapping, MappingRule};

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Read a JSON payload from a file, or from stdin when the path is `-`
pub fn read_payload(path: &Path) -> Result<Value> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .into_diagnostic()
            .wrap_err("Failed to read payload from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?
    };

    serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("{} is not valid JSON", path.display()))
}

/// Load a mapping file
pub fn load_mapping(path: &Path) -> Result<FieldMapping> {
    Ok(FieldMapping::load(path)?)
}

/// Suggestion rules from `--rules`, else from config
pub fn load_rules(config: &Config, rules: Option<&Path>) -> Result<Vec<MappingRule>> {
    match rules {
        Some(path) => Ok(crate::yaml::read_yaml_file(path)?),
        None => Ok(config.rules()?),
    }
}

/// Print a serializable value as JSON or YAML; `Auto` means YAML
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}
