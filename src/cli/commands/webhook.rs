//! `staymap webhook` command - apply or check a mapping on a JSON payload

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{load_mapping, print_structured, read_payload};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{apply_mappings, suggest_from_payload, validate_mappings, Config, FindAnchor};

#[derive(clap::Args, Debug)]
pub struct WebhookArgs {
    /// JSON payload file (`-` for stdin)
    pub payload: PathBuf,

    /// Mapping file of `targetField: path` pairs; proposed from the payload
    /// when omitted
    #[arg(long, short = 'm')]
    pub mapping: Option<PathBuf>,

    /// Only check that every required field resolves
    #[arg(long)]
    pub check: bool,

    /// Override where `financeField.find(...)` lookups start
    #[arg(long, value_enum)]
    pub anchor: Option<AnchorArg>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum AnchorArg {
    /// Always search data.financeField
    Legacy,
    /// Search whatever the preceding segments resolved to
    Relative,
}

impl From<AnchorArg> for FindAnchor {
    fn from(arg: AnchorArg) -> Self {
        match arg {
            AnchorArg::Legacy => FindAnchor::Legacy,
            AnchorArg::Relative => FindAnchor::Relative,
        }
    }
}

pub fn run(args: WebhookArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let anchor = args.anchor.map(FindAnchor::from).unwrap_or(config.find_anchor);
    let payload = read_payload(&args.payload)?;

    let mapping = match &args.mapping {
        Some(path) => load_mapping(path)?,
        None => suggest_from_payload(&payload),
    };

    if args.check {
        let result = validate_mappings(&payload, &mapping, &config.required_fields(), anchor);
        if global.format == OutputFormat::Json || global.format == OutputFormat::Yaml {
            print_structured(&result, global.format)?;
        } else if !global.quiet {
            for field in &result.missing_fields {
                println!("{} {}: not mapped", style("✗").red(), style(field).yellow());
            }
            for error in &result.errors {
                println!("{} {}", style("✗").red(), error);
            }
            if result.is_valid {
                println!("{} Mapping resolves every required field", style("✓").green());
            }
        }

        if !result.is_valid {
            return Err(miette::miette!(
                "Mapping check failed: {} missing, {} unresolved",
                result.missing_fields.len(),
                result.errors.len()
            ));
        }
        return Ok(());
    }

    let values = apply_mappings(&payload, &mapping, anchor);
    let format = match global.format {
        OutputFormat::Yaml => OutputFormat::Yaml,
        _ => OutputFormat::Json,
    };
    print_structured(&values, format)
}
