//! Staymap: field mapping and extraction for short-term-rental bookings
//!
//! Parses booking exports (CSV) and webhook payloads (JSON) from rental
//! platforms into a fixed normalized booking schema:
//!
//! - [`core::table`] - delimited text parsing
//! - [`core::suggest`] - fuzzy source-name → target-field suggestions
//! - [`core::path`] - path expressions over nested payloads
//! - [`core::coerce`] - typed, validated target values

pub mod cli;
pub mod core;
pub mod yaml;
