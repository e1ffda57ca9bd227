//! Row-by-row extraction of mapped CSV columns into typed target values
//!
//! One bad cell never aborts a row, and one bad row never aborts a batch:
//! problems are recorded on the field's [`FieldOutcome`].

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::core::coerce::{try_coerce, TypedValue};
use crate::core::mapping::FieldMapping;
use crate::core::table::ParsedTable;

/// Result of extracting one target field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOutcome {
    /// Source text, `None` when the cell was empty or the column missing
    pub raw_value: Option<String>,
    pub coerced_value: Option<TypedValue>,
    pub error: Option<String>,
}

impl FieldOutcome {
    fn failed(raw_value: Option<String>, error: impl Into<String>) -> Self {
        Self {
            raw_value,
            coerced_value: None,
            error: Some(error.into()),
        }
    }
}

/// Extraction of one data row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    /// 0-based data row index
    pub row: usize,
    pub fields: BTreeMap<String, FieldOutcome>,
}

impl ExtractionResult {
    pub fn has_errors(&self) -> bool {
        self.fields.values().any(|f| f.error.is_some())
    }

    /// (field, message) for every field in error
    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|(name, f)| f.error.as_deref().map(|e| (name.as_str(), e)))
    }

    /// Coerced values by field
    pub fn values(&self) -> BTreeMap<String, Option<TypedValue>> {
        self.fields
            .iter()
            .map(|(name, f)| (name.clone(), f.coerced_value.clone()))
            .collect()
    }

    /// Coerced values with overrides for this row layered on top
    ///
    /// Later overrides of the same field win. The extraction itself is left
    /// untouched.
    pub fn effective(&self, overrides: &[ValueOverride]) -> BTreeMap<String, Option<TypedValue>> {
        let mut values = self.values();
        for o in overrides.iter().filter(|o| o.row == self.row) {
            values.insert(o.field.clone(), o.value.clone());
        }
        values
    }
}

/// A user edit of one extracted value, kept beside the original
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueOverride {
    pub row: usize,
    pub field: String,
    pub original: Option<TypedValue>,
    pub value: Option<TypedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValueOverride {
    /// Override `field` of `result`, capturing its current value as the
    /// original
    pub fn new(result: &ExtractionResult, field: impl Into<String>, value: Option<TypedValue>) -> Self {
        let field = field.into();
        let original = result
            .fields
            .get(&field)
            .and_then(|f| f.coerced_value.clone());
        Self {
            row: result.row,
            field,
            original,
            value,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Extraction of a whole table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionBatch {
    pub records: Vec<ExtractionResult>,
    pub rows_with_errors: usize,
    pub field_errors: usize,
}

impl ExtractionBatch {
    pub fn is_clean(&self) -> bool {
        self.field_errors == 0
    }
}

/// Extract every mapped field of every row
///
/// Unmapped fields (empty or `ignore` locators) are left out of each
/// record. A mapped column that does not exist is an error on every row.
/// A required field whose cell is empty is an error.
pub fn extract_rows<S: AsRef<str>>(
    table: &ParsedTable,
    mapping: &FieldMapping,
    required: &[S],
) -> ExtractionBatch {
    let columns: Vec<(&str, &str, Option<usize>)> = mapping
        .mapped()
        .map(|(field, column)| (field, column, table.column_index(column)))
        .collect();

    let mut batch = ExtractionBatch::default();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let mut fields = BTreeMap::new();
        for &(field, column, index) in &columns {
            let is_required = required.iter().any(|r| r.as_ref() == field);
            let outcome = match index {
                None => FieldOutcome::failed(None, format!("column '{}' not found", column)),
                Some(i) => extract_cell(field, row.get(i).map(String::as_str), is_required),
            };
            fields.insert(field.to_string(), outcome);
        }

        let result = ExtractionResult {
            row: row_idx,
            fields,
        };
        let errors = result.errors().count();
        if errors > 0 {
            batch.rows_with_errors += 1;
            batch.field_errors += errors;
        }
        batch.records.push(result);
    }

    batch
}

fn extract_cell(field: &str, cell: Option<&str>, required: bool) -> FieldOutcome {
    let raw_value = cell.filter(|c| !c.trim().is_empty()).map(str::to_string);

    let Some(raw) = raw_value.clone() else {
        return if required {
            FieldOutcome::failed(None, "required value is empty")
        } else {
            FieldOutcome {
                raw_value: None,
                coerced_value: None,
                error: None,
            }
        };
    };

    match try_coerce(field, &Value::String(raw)) {
        Ok(coerced_value) => FieldOutcome {
            raw_value,
            coerced_value,
            error: None,
        },
        Err(e) => FieldOutcome::failed(raw_value, e.to_string()),
    }
}
