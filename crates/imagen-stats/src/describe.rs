//! Descriptive statistics.

use std::collections::BTreeMap;

use imagen_common::{any_to_string_non_empty, column_f64_values, has_column};
use polars::prelude::*;

use crate::error::{Result, StatsError};

/// Count, moments and quartiles of one column (missing values skipped).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN for a single value.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summary of one column within one group.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    /// Group value, or `None` when the table was not grouped.
    pub group: Option<String>,
    pub summary: Summary,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Variance with `n - 1` in the denominator.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some(sum / (values.len() - 1) as f64)
}

/// Linear-interpolation quantile of already sorted values.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }
    let idx = p.clamp(0.0, 1.0) * (n as f64 - 1.0);
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, 0.5)
}

/// Summarizes the finite values; `None` if there are none.
pub fn summarize(values: &[f64]) -> Option<Summary> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(Summary {
        count: sorted.len(),
        mean: mean(&sorted)?,
        std: sample_variance(&sorted).map_or(f64::NAN, f64::sqrt),
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25)?,
        q50: quantile_sorted(&sorted, 0.5)?,
        q75: quantile_sorted(&sorted, 0.75)?,
        max: sorted[sorted.len() - 1],
    })
}

pub(crate) fn require_column(df: &DataFrame, column: &str) -> Result<()> {
    if has_column(df, column) {
        Ok(())
    } else {
        Err(StatsError::MissingColumn {
            column: column.to_string(),
        })
    }
}

/// Text value of every row of `column`; missing cells are `None`.
pub(crate) fn group_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    require_column(df, column)?;
    let values = df.column(column)?;
    let mut out = Vec::with_capacity(values.len());
    for idx in 0..values.len() {
        out.push(any_to_string_non_empty(values.get(idx)?));
    }
    Ok(out)
}

/// Non-missing values of `column`, split by the value of `group`.
pub(crate) fn grouped_numbers(
    df: &DataFrame,
    column: &str,
    group: &str,
) -> Result<BTreeMap<String, Vec<f64>>> {
    require_column(df, column)?;
    let numbers = column_f64_values(df, column)?;
    let groups = group_values(df, group)?;
    let mut out: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (value, key) in numbers.into_iter().zip(groups) {
        if let (Some(value), Some(key)) = (value, key)
            && value.is_finite()
        {
            out.entry(key).or_default().push(value);
        }
    }
    Ok(out)
}

/// Describes `columns` of `df`, optionally per value of `group`.
///
/// Groups appear in sorted order; columns or groups without any numeric
/// value are left out. Rows with a missing group value are skipped.
pub fn describe(
    df: &DataFrame,
    columns: &[&str],
    group: Option<&str>,
) -> Result<Vec<ColumnSummary>> {
    let mut out = Vec::new();
    for &column in columns {
        match group {
            Some(group) => {
                for (key, values) in grouped_numbers(df, column, group)? {
                    if let Some(summary) = summarize(&values) {
                        out.push(ColumnSummary {
                            column: column.to_string(),
                            group: Some(key),
                            summary,
                        });
                    }
                }
            }
            None => {
                require_column(df, column)?;
                let values: Vec<f64> = column_f64_values(df, column)?
                    .into_iter()
                    .flatten()
                    .collect();
                if let Some(summary) = summarize(&values) {
                    out.push(ColumnSummary {
                        column: column.to_string(),
                        group: None,
                        summary,
                    });
                }
            }
        }
    }
    Ok(out)
}

/// Names of the numeric (float or integer) columns of `df`, excluding `skip`.
pub fn numeric_columns<'a>(df: &'a DataFrame, skip: &[&str]) -> Vec<&'a str> {
    df.get_columns()
        .iter()
        .filter(|column| column.dtype().is_numeric())
        .map(|column| column.name().as_str())
        .filter(|name| !skip.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_uses_interpolated_quartiles() {
        let summary = summarize(&[4.0, 1.0, 3.0, 2.0, f64::NAN]).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, 2.5);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.q25, 1.75);
        assert_eq!(summary.q50, 2.5);
        assert_eq!(summary.q75, 3.25);
        assert_eq!(summary.max, 4.0);
        assert!((summary.std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_spread() {
        let summary = summarize(&[7.0]).unwrap();
        assert_eq!(summary.q25, 7.0);
        assert!(summary.std.is_nan());
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn grouped_description() {
        let df = DataFrame::new(vec![
            Column::new("Score".into(), vec![Some(1.0), Some(3.0), None, Some(10.0)]),
            Column::new("Class".into(), vec![Some("HC"), Some("HC"), Some("AAM"), Some("AAM")]),
        ])
        .unwrap();

        let rows = describe(&df, &["Score"], Some("Class")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group.as_deref(), Some("AAM"));
        assert_eq!(rows[0].summary.count, 1);
        assert_eq!(rows[1].group.as_deref(), Some("HC"));
        assert_eq!(rows[1].summary.mean, 2.0);
    }

    #[test]
    fn missing_column_is_an_error() {
        let df = DataFrame::new(vec![Column::new("Score".into(), vec![1.0])]).unwrap();
        let err = describe(&df, &["Nope"], None).unwrap_err();
        assert_eq!(err.kind(), "MissingColumn");
    }

    #[test]
    fn numeric_columns_skip_keys() {
        let df = DataFrame::new(vec![
            Column::new("ID".into(), vec![1i64]),
            Column::new("Session".into(), vec!["BL"]),
            Column::new("Score".into(), vec![1.0]),
        ])
        .unwrap();
        assert_eq!(numeric_columns(&df, &["ID"]), vec!["Score"]);
    }
}
