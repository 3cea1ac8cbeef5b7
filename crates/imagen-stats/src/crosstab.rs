//! Contingency tables.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;

use crate::describe::group_values;
use crate::error::Result;

/// Counts of two categorical columns. Rows with either value missing are
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crosstab {
    pub row_variable: String,
    pub column_variable: String,
    /// Sorted row categories.
    pub rows: Vec<String>,
    /// Sorted column categories.
    pub columns: Vec<String>,
    /// `counts[row][column]`.
    pub counts: Vec<Vec<usize>>,
}

impl Crosstab {
    pub fn row_totals(&self) -> Vec<usize> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn column_totals(&self) -> Vec<usize> {
        (0..self.columns.len())
            .map(|col| self.counts.iter().map(|row| row[col]).sum())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.row_totals().iter().sum()
    }

    /// Counts divided by the grand total; all zero for an empty table.
    pub fn frequencies(&self) -> Vec<Vec<f64>> {
        let total = self.total();
        self.counts
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&count| {
                        if total == 0 {
                            0.0
                        } else {
                            count as f64 / total as f64
                        }
                    })
                    .collect()
            })
            .collect()
    }

    pub fn count(&self, row: &str, column: &str) -> Option<usize> {
        let r = self.rows.iter().position(|value| value == row)?;
        let c = self.columns.iter().position(|value| value == column)?;
        Some(self.counts[r][c])
    }
}

/// Cross-tabulates `row` against `column`.
pub fn crosstab(df: &DataFrame, row: &str, column: &str) -> Result<Crosstab> {
    let row_values = group_values(df, row)?;
    let column_values = group_values(df, column)?;

    let mut pairs: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut rows = BTreeSet::new();
    let mut columns = BTreeSet::new();
    for (r, c) in row_values.into_iter().zip(column_values) {
        if let (Some(r), Some(c)) = (r, c) {
            rows.insert(r.clone());
            columns.insert(c.clone());
            *pairs.entry((r, c)).or_insert(0) += 1;
        }
    }

    let rows: Vec<String> = rows.into_iter().collect();
    let columns: Vec<String> = columns.into_iter().collect();
    let counts = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| pairs.get(&(r.clone(), c.clone())).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    Ok(Crosstab {
        row_variable: row.to_string(),
        column_variable: column.to_string(),
        rows,
        columns,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                "Class".into(),
                vec![Some("HC"), Some("HC"), Some("AAM"), Some("AAM"), None],
            ),
            Column::new(
                "Sex".into(),
                vec![Some("Male"), Some("Female"), Some("Male"), Some("Male"), Some("Male")],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn counts_and_totals() {
        let tab = crosstab(&table(), "Class", "Sex").unwrap();
        assert_eq!(tab.rows, vec!["AAM", "HC"]);
        assert_eq!(tab.columns, vec!["Female", "Male"]);
        assert_eq!(tab.counts, vec![vec![0, 2], vec![1, 1]]);
        assert_eq!(tab.row_totals(), vec![2, 2]);
        assert_eq!(tab.column_totals(), vec![1, 3]);
        assert_eq!(tab.total(), 4);
        assert_eq!(tab.count("HC", "Female"), Some(1));
        assert_eq!(tab.count("HC", "Other"), None);
    }

    #[test]
    fn frequencies_sum_to_one() {
        let tab = crosstab(&table(), "Class", "Sex").unwrap();
        let sum: f64 = tab.frequencies().iter().flatten().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(tab.frequencies()[0][1], 0.5);
    }
}
