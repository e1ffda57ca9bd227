//! `staymap config` command - Configuration management
//!
//! Shows the effective settings and edits the global and per-directory
//! config files.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::print_structured;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::PROJECT_CONFIG;
use crate::core::Config;
use crate::yaml::parse_yaml;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., ragged_rows, find_anchor)
    pub key: String,

    /// Value to set; comma-separated for required_fields
    pub value: String,

    /// Set in global (user) config instead of the current directory's
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of the current directory's
    #[arg(long, short = 'g')]
    pub global: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("ragged_rows", "Rows with the wrong cell count: pad, reject, or skip"),
    ("unterminated_quotes", "Rows ending inside quotes: lenient or strict"),
    ("find_anchor", "Start of financeField.find lookups: legacy or relative"),
    ("required_fields", "Target fields that must be mapped and non-empty"),
    ("rules", "YAML rule file replacing the built-in suggestion rules"),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();

    if let Some(key) = &args.key {
        let value = get_config_value(&config, key)
            .ok_or_else(|| miette::miette!("Unknown configuration key '{}'", key))?;
        println!("{}", value);
        return Ok(());
    }

    if matches!(global.format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&config, global.format);
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in VALID_KEYS {
        let value = get_config_value(&config, key).unwrap_or_default();
        println!("  {}: {}", style(key).cyan(), style(value).yellow());
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (STAYMAP_RAGGED_ROWS, STAYMAP_FIND_ANCHOR, ...)");
    println!("  2. Directory config ({})", PROJECT_CONFIG);
    println!("  3. Global config (~/.config/staymap/config.yaml)");

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    check_key(&args.key)?;
    let config_path = config_path(args.global)?;

    let mut config_map = read_config_map(&config_path)?;
    let value = if args.key == "required_fields" {
        serde_yml::Value::Sequence(
            args.value
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(|f| serde_yml::Value::String(f.to_string()))
                .collect(),
        )
    } else {
        serde_yml::Value::String(args.value.clone())
    };
    config_map.insert(serde_yml::Value::String(args.key.clone()), value);

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    Config::validate_source(&yaml, &config_path.display().to_string())?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Set {} {} {} in {}",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        config_path.display()
    );

    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    check_key(&args.key)?;
    let config_path = config_path(args.global)?;

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_config_map(&config_path)?;
    let removed = config_map
        .remove(&serde_yml::Value::String(args.key.clone()))
        .is_some();
    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Removed {} from {}",
        style("✓").green(),
        style(&args.key).cyan(),
        config_path.display()
    );

    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", style("Configuration file paths:").bold());
    println!();
    for (label, path) in [
        ("Global:   ", Config::global_config_path()),
        ("Directory:", Config::project_config_path()),
    ] {
        match path {
            Some(path) => {
                let status = if path.exists() {
                    style("(exists)").green()
                } else {
                    style("(not created)").dim()
                };
                println!("  {} {} {}", style(label).cyan(), path.display(), status);
            }
            None => println!("  {} {}", style(label).cyan(), style("(unavailable)").dim()),
        }
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'staymap config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn check_key(key: &str) -> Result<()> {
    if VALID_KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "run 'staymap config keys' to list valid keys",
            "Unknown configuration key '{}'",
            key
        ))
    }
}

fn config_path(global: bool) -> Result<PathBuf> {
    let path = if global {
        Config::global_config_path()
    } else {
        Config::project_config_path()
    };
    path.ok_or_else(|| miette::miette!("Could not determine config file location"))
}

fn read_config_map(path: &Path) -> Result<serde_yml::Mapping> {
    if !path.exists() {
        return Ok(serde_yml::Mapping::new());
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value = parse_yaml(&content, &path.display().to_string())?;
    match parsed {
        // An empty file parses as null
        serde_yml::Value::Null => Ok(serde_yml::Mapping::new()),
        serde_yml::Value::Mapping(map) => Ok(map),
        _ => Err(miette::miette!(
            "{} is not a mapping of configuration keys",
            path.display()
        )),
    }
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    let scalar = |v: serde_json::Value| v.as_str().map(str::to_string);
    match key {
        "ragged_rows" => serde_json::to_value(config.ragged_rows).ok().and_then(scalar),
        "unterminated_quotes" => serde_json::to_value(config.unterminated_quotes)
            .ok()
            .and_then(scalar),
        "find_anchor" => serde_json::to_value(config.find_anchor).ok().and_then(scalar),
        "required_fields" => Some(config.required_fields().join(", ")),
        "rules" => Some(
            config
                .rules
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string()),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_value() {
        let config = Config::default();
        assert_eq!(get_config_value(&config, "ragged_rows").as_deref(), Some("pad"));
        assert_eq!(get_config_value(&config, "find_anchor").as_deref(), Some("legacy"));
        assert_eq!(get_config_value(&config, "rules").as_deref(), Some("(built-in)"));
        assert_eq!(
            get_config_value(&config, "required_fields").as_deref(),
            Some("reservationCode, guestName, checkInDate, checkOutDate")
        );
        assert!(get_config_value(&config, "author").is_none());
    }

    #[test]
    fn test_read_config_map_keeps_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".staymap.yaml");
        assert!(read_config_map(&path).unwrap().is_empty());

        fs::write(&path, "ragged_rows: reject\nfind_anchor: [relative\n").unwrap();
        assert!(read_config_map(&path).is_err());

        fs::write(&path, "- ragged_rows\n").unwrap();
        assert!(read_config_map(&path).is_err());

        fs::write(&path, "ragged_rows: reject\n").unwrap();
        assert_eq!(read_config_map(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_check_key() {
        assert!(check_key("unterminated_quotes").is_ok());
        assert!(check_key("editor").is_err());
    }
}
