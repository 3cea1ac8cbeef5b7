//! Polars AnyValue utility functions.
//!
//! This module provides helper functions for working with Polars `AnyValue` types,
//! including string conversions, numeric parsing and whole-column extraction.

use polars::prelude::*;

/// Converts a Polars `AnyValue` to a `String` representation.
///
/// Returns an empty string for `Null` and formats floats without a
/// trailing `.0`.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use imagen_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Int64(71766352)), "71766352");
/// assert_eq!(any_to_string(AnyValue::String("FU1")), "FU1");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Converts `AnyValue` to `String`, returning `None` if the trimmed result is empty.
pub fn any_to_string_non_empty(value: AnyValue<'_>) -> Option<String> {
    let s = any_to_string(value);
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Formats a floating-point number as a string, dropping an integral `.0`.
///
/// # Examples
///
/// ```
/// use imagen_common::format_numeric;
///
/// assert_eq!(format_numeric(10.0), "10");
/// assert_eq!(format_numeric(1.5), "1.5");
/// assert_eq!(format_numeric(-2.0), "-2");
/// ```
pub fn format_numeric(v: f64) -> String {
    // f64's Display already omits trailing zeros; only negative zero needs care.
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v}")
    }
}

/// Converts an `AnyValue` to `f64`, returning `None` for non-numeric or null values.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        _ => None,
    }
}

/// Converts an `AnyValue` to `i64`, returning `None` for non-integral or null values.
///
/// Floats are accepted only when they carry no fractional part.
pub fn any_to_i64(value: AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(i64::from(v)),
        AnyValue::Int16(v) => Some(i64::from(v)),
        AnyValue::Int32(v) => Some(i64::from(v)),
        AnyValue::Int64(v) => Some(v),
        AnyValue::UInt8(v) => Some(i64::from(v)),
        AnyValue::UInt16(v) => Some(i64::from(v)),
        AnyValue::UInt32(v) => Some(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).ok(),
        AnyValue::Float32(v) => integral_f64(f64::from(v)),
        AnyValue::Float64(v) => integral_f64(v),
        AnyValue::String(s) => parse_integral(s),
        AnyValue::StringOwned(s) => parse_integral(&s),
        _ => None,
    }
}

/// Parses a string as `f64`, returning `None` for invalid, empty or NaN strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn integral_f64(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Some(value as i64)
    } else {
        None
    }
}

fn parse_integral(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| parse_f64(trimmed).and_then(integral_f64))
}

/// Canonical token for a raw survey code.
///
/// Integral numbers collapse to their integer spelling (`"2.0"` and `"2"`
/// both become `"2"`), everything else is the trimmed text. Empty cells
/// have no token.
///
/// # Examples
///
/// ```
/// use imagen_common::code_token;
///
/// assert_eq!(code_token("-1.0").as_deref(), Some("-1"));
/// assert_eq!(code_token(" ALC ").as_deref(), Some("ALC"));
/// assert_eq!(code_token("2.5").as_deref(), Some("2.5"));
/// assert_eq!(code_token("   "), None);
/// ```
pub fn code_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse_integral(trimmed) {
        Some(value) => Some(value.to_string()),
        None => Some(trimmed.to_string()),
    }
}

/// Returns true if the frame has a column with exactly this name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names()
        .iter()
        .any(|column| column.as_str() == name)
}

/// Reads a whole column as trimmed, non-empty strings.
pub fn column_string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?;
    let mut values = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        values.push(any_to_string_non_empty(column.get(idx)?));
    }
    Ok(values)
}

/// Reads a whole column as `f64`, mapping null and non-numeric cells to `None`.
pub fn column_f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let column = df.column(name)?;
    let mut values = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        values.push(any_to_f64(column.get(idx)?));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_string_null() {
        assert_eq!(any_to_string(AnyValue::Null), "");
    }

    #[test]
    fn test_any_to_string_numbers() {
        assert_eq!(any_to_string(AnyValue::Int64(-100)), "-100");
        assert_eq!(any_to_string(AnyValue::Float64(10.0)), "10");
        assert_eq!(any_to_string(AnyValue::Float64(2.25)), "2.25");
    }

    #[test]
    fn test_any_to_string_non_empty() {
        assert_eq!(any_to_string_non_empty(AnyValue::Null), None);
        assert_eq!(any_to_string_non_empty(AnyValue::String("  ")), None);
        assert_eq!(
            any_to_string_non_empty(AnyValue::String(" Yes ")),
            Some("Yes".to_string())
        );
    }

    #[test]
    fn test_any_to_f64() {
        assert_eq!(any_to_f64(AnyValue::Null), None);
        assert_eq!(any_to_f64(AnyValue::Int32(42)), Some(42.0));
        assert_eq!(any_to_f64(AnyValue::String("2.5")), Some(2.5));
        assert_eq!(any_to_f64(AnyValue::String("nan")), None);
        assert_eq!(any_to_f64(AnyValue::String("not known")), None);
    }

    #[test]
    fn test_any_to_i64_rejects_fractions() {
        assert_eq!(any_to_i64(AnyValue::Float64(12.0)), Some(12));
        assert_eq!(any_to_i64(AnyValue::Float64(12.5)), None);
        assert_eq!(any_to_i64(AnyValue::String("7.0")), Some(7));
    }

    #[test]
    fn test_code_token() {
        assert_eq!(code_token("15").as_deref(), Some("15"));
        assert_eq!(code_token("15.0").as_deref(), Some("15"));
        assert_eq!(code_token("-2").as_deref(), Some("-2"));
        assert_eq!(code_token("DPR_R").as_deref(), Some("DPR_R"));
        assert_eq!(code_token(""), None);
    }

    #[test]
    fn test_column_extractors() {
        let df = DataFrame::new(vec![
            Series::new("text".into(), vec![Some(" a "), None, Some("")]).into(),
            Series::new("num".into(), vec![Some("1.5"), Some("x"), None]).into(),
        ])
        .unwrap();

        assert!(has_column(&df, "text"));
        assert!(!has_column(&df, "missing"));
        assert_eq!(
            column_string_values(&df, "text").unwrap(),
            vec![Some("a".to_string()), None, None]
        );
        assert_eq!(
            column_f64_values(&df, "num").unwrap(),
            vec![Some(1.5), None, None]
        );
    }
}
