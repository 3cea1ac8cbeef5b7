//! Shared utilities for the IMAGEN instrument crates.
//!
//! This crate provides the Polars value helpers every stage of the
//! instrument pipeline uses to read raw questionnaire cells and typed
//! table columns.

pub mod polars;

pub use polars::{
    any_to_f64, any_to_i64, any_to_string, any_to_string_non_empty, code_token,
    column_f64_values, column_string_values, format_numeric, has_column, parse_f64,
};
