//! Field mappings: target field → source locator
//!
//! In CSV mode a locator is a column name; in webhook mode it is a path
//! expression. Empty locators and the `ignore` sentinel both mean
//! "not mapped".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::yaml::{read_yaml_file, YamlError};

/// Locator value meaning "deliberately not mapped" (case-insensitive)
pub const IGNORE: &str = "ignore";

/// Whether a locator is empty, whitespace, or the ignore sentinel
pub fn is_unmapped(locator: &str) -> bool {
    let locator = locator.trim();
    locator.is_empty() || locator.eq_ignore_ascii_case(IGNORE)
}

/// Target field name → locator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    entries: BTreeMap<String, String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a mapping from a YAML file of `targetField: locator` pairs
    pub fn load(path: &Path) -> Result<Self, YamlError> {
        read_yaml_file(path)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> String {
        serde_yml::to_string(&self.entries).unwrap_or_default()
    }

    pub fn insert(&mut self, field: impl Into<String>, locator: impl Into<String>) {
        self.entries.insert(field.into(), locator.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.entries.remove(field)
    }

    /// Locator for a field, `None` when unmapped
    pub fn locator(&self, field: &str) -> Option<&str> {
        self.entries
            .get(field)
            .map(|l| l.trim())
            .filter(|l| !is_unmapped(l))
    }

    /// All entries including unmapped ones
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, l)| (f.as_str(), l.as_str()))
    }

    /// Entries with a usable locator
    pub fn mapped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(f, l)| (f.as_str(), l.trim()))
            .filter(|(_, l)| !is_unmapped(l))
    }

    /// Required fields without a usable locator, in the order given
    pub fn missing<S: AsRef<str>>(&self, required: &[S]) -> Vec<String> {
        required
            .iter()
            .map(|field| field.as_ref())
            .filter(|field| self.locator(field).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Every required field has a usable locator
    pub fn is_complete<S: AsRef<str>>(&self, required: &[S]) -> bool {
        self.missing(required).is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, String>> for FieldMapping {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
