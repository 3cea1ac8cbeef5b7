//! Two-group inference tests.
//!
//! The comparisons mirror the usual screening of a numeric column between
//! two cohort classes: equal-variance and Welch t-tests for the means,
//! Levene (median-centred) and Bartlett for the variances.

use tracing::debug;

use crate::describe::{grouped_numbers, mean, median, sample_variance};
use crate::error::{Result, StatsError};
use crate::special::{chi_square_survival, f_survival, student_t_two_sided};

/// A test statistic with its degrees of freedom and two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub df: f64,
    /// Denominator degrees of freedom of F-based tests.
    pub df_denominator: Option<f64>,
    pub p_value: f64,
}

/// All tests for one column between groups `a` and `b`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupComparison {
    pub column: String,
    pub group_a: String,
    pub group_b: String,
    pub n_a: usize,
    pub n_b: usize,
    pub mean_a: f64,
    pub mean_b: f64,
    pub student: TestResult,
    pub welch: TestResult,
    pub levene: TestResult,
    pub bartlett: TestResult,
}

/// Outcome of comparing one column; a column with too little data fails
/// on its own without affecting the others.
#[derive(Debug)]
pub struct ColumnComparison {
    pub column: String,
    pub result: Result<GroupComparison>,
}

/// Equal-variance (pooled) two-sample t-test.
pub fn student_t(a: &[f64], b: &[f64]) -> Option<TestResult> {
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (va, vb) = (sample_variance(a)?, sample_variance(b)?);
    let df = na + nb - 2.0;
    let pooled = ((na - 1.0) * va + (nb - 1.0) * vb) / df;
    let statistic = (mean(a)? - mean(b)?) / (pooled * (1.0 / na + 1.0 / nb)).sqrt();
    Some(TestResult {
        statistic,
        df,
        df_denominator: None,
        p_value: student_t_two_sided(statistic, df),
    })
}

/// Welch's unequal-variance t-test with Welch-Satterthwaite degrees of freedom.
pub fn welch_t(a: &[f64], b: &[f64]) -> Option<TestResult> {
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let se_a = sample_variance(a)? / na;
    let se_b = sample_variance(b)? / nb;
    let se = se_a + se_b;
    let statistic = (mean(a)? - mean(b)?) / se.sqrt();
    let df = se * se / (se_a * se_a / (na - 1.0) + se_b * se_b / (nb - 1.0));
    Some(TestResult {
        statistic,
        df,
        df_denominator: None,
        p_value: student_t_two_sided(statistic, df),
    })
}

/// Levene's test centred on group medians (Brown-Forsythe).
pub fn levene(groups: &[&[f64]]) -> Option<TestResult> {
    let k = groups.len();
    if k < 2 || groups.iter().any(|g| g.is_empty()) {
        return None;
    }
    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let center = median(g).unwrap_or(f64::NAN);
            g.iter().map(|v| (v - center).abs()).collect()
        })
        .collect();
    let n: usize = deviations.iter().map(Vec::len).sum();
    if n <= k {
        return None;
    }
    let group_means: Vec<f64> = deviations.iter().filter_map(|d| mean(d)).collect();
    let all: Vec<f64> = deviations.iter().flatten().copied().collect();
    let grand = mean(&all)?;

    let between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(d, m)| d.len() as f64 * (m - grand) * (m - grand))
        .sum();
    let within: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(d, m)| d.iter().map(|z| (z - m) * (z - m)).sum::<f64>())
        .sum();

    let df_num = (k - 1) as f64;
    let df_den = (n - k) as f64;
    let statistic = (df_den / df_num) * between / within;
    Some(TestResult {
        statistic,
        df: df_num,
        df_denominator: Some(df_den),
        p_value: f_survival(statistic, df_num, df_den),
    })
}

/// Bartlett's test for equal variances.
pub fn bartlett(groups: &[&[f64]]) -> Option<TestResult> {
    let k = groups.len();
    if k < 2 {
        return None;
    }
    let variances: Vec<f64> = groups
        .iter()
        .map(|g| sample_variance(g))
        .collect::<Option<Vec<_>>>()?;
    let sizes: Vec<f64> = groups.iter().map(|g| g.len() as f64).collect();
    let n: f64 = sizes.iter().sum();
    let kf = k as f64;

    let pooled = sizes
        .iter()
        .zip(&variances)
        .map(|(ni, vi)| (ni - 1.0) * vi)
        .sum::<f64>()
        / (n - kf);
    let numerator = (n - kf) * pooled.ln()
        - sizes
            .iter()
            .zip(&variances)
            .map(|(ni, vi)| (ni - 1.0) * vi.ln())
            .sum::<f64>();
    let correction = 1.0
        + (sizes.iter().map(|ni| 1.0 / (ni - 1.0)).sum::<f64>() - 1.0 / (n - kf))
            / (3.0 * (kf - 1.0));
    let statistic = numerator / correction;
    let df = kf - 1.0;
    Some(TestResult {
        statistic,
        df,
        df_denominator: None,
        p_value: chi_square_survival(statistic, df),
    })
}

/// Runs every test on two samples of at least two values each.
pub fn compare_samples(
    column: &str,
    (group_a, a): (&str, &[f64]),
    (group_b, b): (&str, &[f64]),
) -> Result<GroupComparison> {
    for (group, values) in [(group_a, a), (group_b, b)] {
        if values.len() < 2 {
            return Err(StatsError::InsufficientData {
                column: column.to_string(),
                group: group.to_string(),
                count: values.len(),
                required: 2,
            });
        }
    }
    let insufficient = || StatsError::InsufficientData {
        column: column.to_string(),
        group: format!("{group_a}/{group_b}"),
        count: a.len().min(b.len()),
        required: 2,
    };
    Ok(GroupComparison {
        column: column.to_string(),
        group_a: group_a.to_string(),
        group_b: group_b.to_string(),
        n_a: a.len(),
        n_b: b.len(),
        mean_a: mean(a).ok_or_else(insufficient)?,
        mean_b: mean(b).ok_or_else(insufficient)?,
        student: student_t(a, b).ok_or_else(insufficient)?,
        welch: welch_t(a, b).ok_or_else(insufficient)?,
        levene: levene(&[a, b]).ok_or_else(insufficient)?,
        bartlett: bartlett(&[a, b]).ok_or_else(insufficient)?,
    })
}

/// Compares each column of `df` between the rows whose `group` column
/// equals `a` and those equal to `b`. Missing values are skipped.
pub fn compare_groups(
    df: &polars::prelude::DataFrame,
    columns: &[&str],
    group: &str,
    a: &str,
    b: &str,
) -> Result<Vec<ColumnComparison>> {
    let mut out = Vec::with_capacity(columns.len());
    for &column in columns {
        let groups = grouped_numbers(df, column, group)?;
        let empty = Vec::new();
        let values_a = groups.get(a).unwrap_or(&empty);
        let values_b = groups.get(b).unwrap_or(&empty);
        let result = compare_samples(column, (a, values_a), (b, values_b));
        if let Err(err) = &result {
            debug!(column, error = %err, "group comparison skipped");
        }
        out.push(ColumnComparison {
            column: column.to_string(),
            result,
        });
    }
    Ok(out)
}
