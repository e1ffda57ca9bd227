//! CLI command implementations

pub mod completions;
pub mod config;
pub mod import;
pub mod inspect;
pub mod map;
pub mod suggest;
pub mod webhook;
