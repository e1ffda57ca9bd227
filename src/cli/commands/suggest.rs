//! `staymap suggest` command - propose a field mapping
//!
//! For a CSV export the candidates are the header names; for a JSON
//! payload they are the dotted paths of its scalar leaves.

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::helpers::{load_rules, print_structured, read_payload};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{leaf_paths, read_table, suggest, Config, FieldMapping};

#[derive(clap::Args, Debug)]
#[command(group(clap::ArgGroup::new("source").required(true).args(["file", "payload"])))]
pub struct SuggestArgs {
    /// CSV file whose headers are matched
    pub file: Option<PathBuf>,

    /// JSON payload whose leaf paths are matched instead (`-` for stdin)
    #[arg(long, short = 'p')]
    pub payload: Option<PathBuf>,

    /// YAML rule file replacing the built-in rules
    #[arg(long, short = 'r')]
    pub rules: Option<PathBuf>,

    /// Write the mapping to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: SuggestArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let rules = load_rules(&config, args.rules.as_deref())?;

    let candidates: Vec<String> = match (&args.file, &args.payload) {
        (_, Some(payload)) => leaf_paths(&read_payload(payload)?),
        (Some(file), None) => {
            let table = read_table(file, &config.parse_options())?;
            table.header_names().into_iter().map(str::to_string).collect()
        }
        (None, None) => return Err(miette::miette!("Provide a CSV file or --payload")),
    };
    debug!(candidates = candidates.len(), rules = rules.len(), "Suggesting mapping");

    let mapping = FieldMapping::from(suggest(&candidates, &rules));

    if let Some(path) = &args.output {
        fs::write(path, mapping.to_yaml())
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        if !global.quiet {
            println!(
                "{} Wrote {} suggestion(s) to {}",
                style("✓").green(),
                style(mapping.len()).cyan(),
                style(path.display()).cyan()
            );
        }
    } else {
        match global.format {
            OutputFormat::Json => print_structured(&mapping, OutputFormat::Json)?,
            _ => print!("{}", mapping.to_yaml()),
        }
    }

    let missing = mapping.missing(&config.required_fields());
    if !missing.is_empty() && !global.quiet {
        eprintln!(
            "{} No match for required field(s): {}",
            style("!").yellow(),
            missing.join(", ")
        );
    }
    Ok(())
}
