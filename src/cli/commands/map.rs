//! `staymap map` command - build a field mapping interactively
//!
//! Walks every target field, offering the CSV's columns with the suggested
//! column preselected. Required fields cannot be skipped.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::{load_rules, truncate_str};
use crate::cli::GlobalOpts;
use crate::core::mapping::IGNORE;
use crate::core::{read_table, suggest, Config, FieldMapping, ParsedTable, TargetField};

#[derive(clap::Args, Debug)]
pub struct MapArgs {
    /// CSV file whose columns are offered
    pub file: PathBuf,

    /// Where to write the mapping
    #[arg(long, short = 'o', default_value = "mapping.yaml")]
    pub output: PathBuf,

    /// YAML rule file replacing the built-in rules
    #[arg(long, short = 'r')]
    pub rules: Option<PathBuf>,

    /// Only prompt for required fields; others keep their suggestion
    #[arg(long)]
    pub required_only: bool,

    /// Overwrite the output file without asking
    #[arg(long)]
    pub force: bool,
}

/// Interactive column picker
pub struct MappingWizard<'a> {
    table: &'a ParsedTable,
    theme: ColorfulTheme,
}

impl<'a> MappingWizard<'a> {
    pub fn new(table: &'a ParsedTable) -> Self {
        Self {
            table,
            theme: ColorfulTheme::default(),
        }
    }

    /// Prompt for each field, starting from `suggested`
    pub fn run(
        &self,
        fields: &[TargetField],
        required: &[String],
        suggested: &FieldMapping,
    ) -> Result<FieldMapping> {
        println!();
        println!(
            "{} Mapping {} column(s) onto {} field(s)",
            style("◆").cyan(),
            style(self.table.headers.len()).bold(),
            style(fields.len()).bold()
        );
        println!("{}", style("─".repeat(50)).dim());
        println!();

        let mut mapping = suggested.clone();
        for field in fields {
            let is_required = required.iter().any(|r| r == field.as_str());
            match self.prompt_field(field.as_str(), is_required, suggested.locator(field.as_str()))? {
                Some(column) => mapping.insert(field.as_str(), column),
                None => mapping.insert(field.as_str(), IGNORE),
            }
        }

        println!();
        println!("{} Mapping complete!", style("✓").green());
        Ok(mapping)
    }

    fn prompt_field(
        &self,
        field: &str,
        required: bool,
        suggestion: Option<&str>,
    ) -> Result<Option<String>> {
        let mut items: Vec<String> = self
            .table
            .headers
            .iter()
            .map(|h| {
                if h.sample_value.is_empty() {
                    h.name.clone()
                } else {
                    format!("{} {}", h.name, style(format!("(e.g. {})", truncate_str(&h.sample_value, 30))).dim())
                }
            })
            .collect();
        if !required {
            items.push(style("(skip)").dim().to_string());
        }

        let default_idx = suggestion
            .and_then(|s| self.table.column_index(s))
            .unwrap_or(if required { 0 } else { items.len() - 1 });

        let prompt = if required {
            format!("{} {}", field, style("*").red())
        } else {
            field.to_string()
        };

        let selection = Select::with_theme(&self.theme)
            .with_prompt(&prompt)
            .items(&items)
            .default(default_idx)
            .interact()
            .into_diagnostic()?;

        Ok(self.table.headers.get(selection).map(|h| h.name.clone()))
    }
}

pub fn run(args: MapArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let table = read_table(&args.file, &config.parse_options())?;
    let rules = load_rules(&config, args.rules.as_deref())?;
    let required = config.required_fields();

    if table.headers.is_empty() {
        return Err(miette::miette!("{} has no columns", args.file.display()));
    }

    let suggested = FieldMapping::from(suggest(&table.header_names(), &rules));
    let fields: Vec<TargetField> = TargetField::all()
        .iter()
        .copied()
        .filter(|f| !args.required_only || required.iter().any(|r| r == f.as_str()))
        .collect();

    if args.output.exists() && !args.force {
        let overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} exists. Overwrite?", args.output.display()))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !overwrite {
            return Err(miette::miette!("Aborted: {} left unchanged", args.output.display()));
        }
    }

    let mapping = MappingWizard::new(&table).run(&fields, &required, &suggested)?;

    fs::write(&args.output, mapping.to_yaml())
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write {}", args.output.display()))?;

    if !global.quiet {
        println!(
            "{} Wrote {} mapped field(s) to {}",
            style("✓").green(),
            style(mapping.mapped().count()).cyan(),
            style(args.output.display()).cyan()
        );
    }
    Ok(())
}
