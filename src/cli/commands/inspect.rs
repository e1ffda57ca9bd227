//! `staymap inspect` command - show the columns of a CSV export

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::print_structured;
use crate::cli::table::{CellValue, TableFormatter};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{read_table, Config};

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// CSV file to inspect
    pub file: PathBuf,

    /// Also preview the first N data rows
    #[arg(long, short = 'n', default_value_t = 0)]
    pub rows: usize,
}

pub fn run(args: InspectArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let table = read_table(&args.file, &config.parse_options())?;

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => {
            return print_structured(&table.headers, global.format);
        }
        _ => {}
    }

    let rows: Vec<Vec<CellValue>> = table
        .headers
        .iter()
        .map(|h| {
            vec![
                CellValue::Count(h.index as i64),
                CellValue::Text(h.name.clone()),
                if h.sample_value.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(h.sample_value.clone())
                },
            ]
        })
        .collect();

    let mut formatter = TableFormatter::new(
        vec!["#".to_string(), "COLUMN".to_string(), "SAMPLE".to_string()],
        "column",
    );
    if global.quiet || global.format != OutputFormat::Auto {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, global.format);

    if !global.quiet && global.format == OutputFormat::Auto {
        println!(
            "{} data row(s) in {}",
            style(table.total_row_count).cyan(),
            args.file.display()
        );
    }

    if args.rows > 0 {
        let preview: Vec<Vec<CellValue>> = table
            .rows
            .iter()
            .take(args.rows)
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text(cell.clone())
                        }
                    })
                    .collect()
            })
            .collect();
        let headers = table.header_names().into_iter().map(str::to_string).collect();
        println!();
        TableFormatter::new(headers, "row")
            .without_summary()
            .output(&preview, global.format);
    }

    Ok(())
}
