//! Configuration management with layered hierarchy

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::path::FindAnchor;
use crate::core::schema::{default_rules, MappingRule, TargetField};
use crate::core::table::{ParseOptions, RaggedRowPolicy, UnterminatedQuotePolicy};
use crate::yaml::{parse_yaml, read_yaml_file, YamlError};

/// Name of the per-directory config file
pub const PROJECT_CONFIG: &str = ".staymap.yaml";

/// Effective configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Handling of rows whose cell count differs from the header
    pub ragged_rows: RaggedRowPolicy,

    /// Handling of rows that end inside a quoted field
    pub unterminated_quotes: UnterminatedQuotePolicy,

    /// Where `financeField.find(...)` lookups start
    pub find_anchor: FindAnchor,

    /// Replaces the schema's required fields when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_fields: Option<Vec<String>>,

    /// YAML rule file replacing the built-in suggestion rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<PathBuf>,
}

/// One config file; absent keys leave the lower layer alone
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    ragged_rows: Option<RaggedRowPolicy>,
    unterminated_quotes: Option<UnterminatedQuotePolicy>,
    find_anchor: Option<FindAnchor>,
    required_fields: Option<Vec<String>>,
    rules: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        Self::load_from(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
        )
    }

    /// Load from explicit file locations, then apply environment variables
    pub fn load_from(global: Option<&Path>, project: Option<&Path>) -> Self {
        // 1. Built-in defaults
        let mut config = Config::default();

        // 2. Global user config, 3. project config
        for path in [global, project].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match read_yaml_file::<ConfigLayer>(path) {
                Ok(layer) => config.merge(layer, path.parent()),
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unreadable config file"),
            }
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        config
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "staymap")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Get the path to the config file of the working directory
    pub fn project_config_path() -> Option<PathBuf> {
        std::env::current_dir()
            .ok()
            .map(|dir| dir.join(PROJECT_CONFIG))
    }

    /// Check that YAML text is a well-formed config file
    pub fn validate_source(source: &str, filename: &str) -> Result<(), YamlError> {
        parse_yaml::<ConfigLayer>(source, filename).map(|_| ())
    }

    /// Merge a layer into this config (layer takes precedence); relative
    /// rule paths are resolved against `base`
    fn merge(&mut self, layer: ConfigLayer, base: Option<&Path>) {
        if let Some(v) = layer.ragged_rows {
            self.ragged_rows = v;
        }
        if let Some(v) = layer.unterminated_quotes {
            self.unterminated_quotes = v;
        }
        if let Some(v) = layer.find_anchor {
            self.find_anchor = v;
        }
        if layer.required_fields.is_some() {
            self.required_fields = layer.required_fields;
        }
        if let Some(rules) = layer.rules {
            self.rules = Some(match base {
                Some(base) if rules.is_relative() => base.join(rules),
                _ => rules,
            });
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("STAYMAP_RAGGED_ROWS").and_then(|s| setting("STAYMAP_RAGGED_ROWS", &s)) {
            self.ragged_rows = v;
        }
        if let Some(v) = var("STAYMAP_UNTERMINATED_QUOTES")
            .and_then(|s| setting("STAYMAP_UNTERMINATED_QUOTES", &s))
        {
            self.unterminated_quotes = v;
        }
        if let Some(v) = var("STAYMAP_FIND_ANCHOR").and_then(|s| setting("STAYMAP_FIND_ANCHOR", &s)) {
            self.find_anchor = v;
        }
        if let Some(fields) = var("STAYMAP_REQUIRED_FIELDS") {
            self.required_fields = Some(
                fields
                    .split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect(),
            );
        }
        if let Some(rules) = var("STAYMAP_RULES") {
            self.rules = Some(PathBuf::from(rules));
        }
    }

    /// Parser settings
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            ragged_rows: self.ragged_rows,
            unterminated_quotes: self.unterminated_quotes,
        }
    }

    /// Required target fields
    pub fn required_fields(&self) -> Vec<String> {
        self.required_fields
            .clone()
            .unwrap_or_else(TargetField::required_names)
    }

    /// Suggestion rules: the configured rule file, or the built-in table
    pub fn rules(&self) -> Result<Vec<MappingRule>, YamlError> {
        match &self.rules {
            Some(path) => read_yaml_file(path),
            None => Ok(default_rules()),
        }
    }
}

/// Parse one enum-valued setting from an environment variable
fn setting<T: DeserializeOwned>(key: &str, value: &str) -> Option<T> {
    match serde_yml::from_str(value.trim()) {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value, "Ignoring invalid setting");
            None
        }
    }
}
