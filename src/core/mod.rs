//! Core module - parsing, suggestion, extraction, and coercion

pub mod coerce;
pub mod config;
pub mod extract;
pub mod mapping;
pub mod path;
pub mod schema;
pub mod suggest;
pub mod table;
pub mod value;
pub mod webhook;

pub use coerce::{coerce, try_coerce, CoerceError, TypedValue};
pub use config::Config;
pub use extract::{extract_rows, ExtractionBatch, ExtractionResult, FieldOutcome, ValueOverride};
pub use mapping::FieldMapping;
pub use path::{extract, FindAnchor, PathError, PathExpr, Segment};
pub use schema::{default_rules, FieldKind, MappingRule, TargetField};
pub use suggest::{leaf_paths, normalize, suggest, suggest_inverse};
pub use table::{
    parse, parse_with, read_table, tokenize_row, ColumnHeader, ParseError, ParseOptions,
    ParsedTable, RaggedRowPolicy, UnterminatedQuotePolicy,
};
pub use value::PayloadExt;
pub use webhook::{apply_mappings, suggest_from_payload, validate_mappings, MappingValidation};
