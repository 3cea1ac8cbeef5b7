//! ROI column derivation.
//!
//! Each [`RoiColumn`] definition turns raw text cells into one typed output
//! column. Missing values propagate: no derivation fills a gap with a default.

use imagen_common::{code_token, column_string_values, parse_f64};
use imagen_model::{
    BandedRecode, CategoricalRecode, CompositeScore, ConcatRecode, RoiColumn, Unmapped, ValueType,
};
use polars::prelude::*;

/// A derived output column plus the number of non-empty cells that were
/// turned into missing because they did not parse as numbers.
#[derive(Debug, Clone)]
pub struct DerivedColumn {
    pub column: Column,
    pub dropped: usize,
}

/// Derives one output column from a raw (all-text) session frame.
pub fn derive_column(raw: &DataFrame, roi: &RoiColumn) -> PolarsResult<DerivedColumn> {
    let name: PlSmallStr = roi.label().into();
    let derived = match roi {
        RoiColumn::Copy { source, value, .. } => {
            let cells = column_string_values(raw, source)?;
            match value {
                ValueType::Number => {
                    let (values, dropped) = parse_numbers(&cells);
                    DerivedColumn {
                        column: Column::new(name, values),
                        dropped,
                    }
                }
                ValueType::Text => DerivedColumn {
                    column: Column::new(name, cells),
                    dropped: 0,
                },
            }
        }
        RoiColumn::Composite(composite) => {
            let (values, dropped) = composite_values(raw, composite)?;
            DerivedColumn {
                column: Column::new(name, values),
                dropped,
            }
        }
        RoiColumn::Recode(recode) => DerivedColumn {
            column: Column::new(name, recode_values(raw, recode)?),
            dropped: 0,
        },
        RoiColumn::Band(band) => {
            let (values, dropped) = band_values(raw, band)?;
            DerivedColumn {
                column: Column::new(name, values),
                dropped,
            }
        }
        RoiColumn::Concat(concat) => DerivedColumn {
            column: Column::new(name, concat_values(raw, concat)?),
            dropped: 0,
        },
    };
    Ok(derived)
}

fn parse_numbers(cells: &[Option<String>]) -> (Vec<Option<f64>>, usize) {
    let mut dropped = 0;
    let values = cells
        .iter()
        .map(|cell| match cell.as_deref() {
            None => None,
            Some(text) => {
                let parsed = parse_f64(text);
                if parsed.is_none() {
                    dropped += 1;
                }
                parsed
            }
        })
        .collect();
    (values, dropped)
}

/// Row-wise sum or mean; a row with any missing item is missing.
pub fn composite_values(
    raw: &DataFrame,
    composite: &CompositeScore,
) -> PolarsResult<(Vec<Option<f64>>, usize)> {
    let mut items = Vec::with_capacity(composite.items.len());
    let mut dropped = 0;
    for item in &composite.items {
        let (values, item_dropped) = parse_numbers(&column_string_values(raw, item)?);
        dropped += item_dropped;
        items.push(values);
    }

    let mut row_values = Vec::with_capacity(items.len());
    let values = (0..raw.height())
        .map(|row| {
            row_values.clear();
            for item in &items {
                row_values.push(item[row]?);
            }
            composite.aggregate.apply(&row_values)
        })
        .collect();
    Ok((values, dropped))
}

fn recode_token(token: Option<String>, recode: &CategoricalRecode) -> Option<String> {
    let token = token?;
    match recode.codelist.lookup(&token) {
        Some(label) => Some(label.to_string()),
        None => match recode.unmapped {
            Unmapped::Missing => None,
            Unmapped::Keep => Some(token),
        },
    }
}

/// Maps raw codes to labels; unmapped codes never raise an error.
pub fn recode_values(
    raw: &DataFrame,
    recode: &CategoricalRecode,
) -> PolarsResult<Vec<Option<String>>> {
    Ok(column_string_values(raw, &recode.source)?
        .into_iter()
        .map(|cell| recode_token(cell.as_deref().and_then(code_token), recode))
        .collect())
}

/// Labels each numeric cell with the first band containing it.
pub fn band_values(
    raw: &DataFrame,
    band: &BandedRecode,
) -> PolarsResult<(Vec<Option<String>>, usize)> {
    let (numbers, dropped) = parse_numbers(&column_string_values(raw, &band.source)?);
    let values = numbers
        .into_iter()
        .map(|value| value.and_then(|v| band.classify(v)).map(str::to_string))
        .collect();
    Ok((values, dropped))
}

/// Recodes each source column and joins the labels present.
pub fn concat_values(raw: &DataFrame, concat: &ConcatRecode) -> PolarsResult<Vec<Option<String>>> {
    let mut sources = Vec::with_capacity(concat.sources.len());
    for source in &concat.sources {
        sources.push(column_string_values(raw, source)?);
    }

    let values = (0..raw.height())
        .map(|row| {
            let labels: Vec<&str> = sources
                .iter()
                .filter_map(|cells| cells[row].as_deref())
                .filter_map(code_token)
                .filter_map(|token| concat.codelist.lookup(&token))
                .collect();
            if labels.is_empty() {
                None
            } else {
                Some(labels.join(concat.separator.as_str()))
            }
        })
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagen_model::{Aggregation, Band, Codelist};
    use std::collections::BTreeMap;

    fn raw(columns: &[(&str, Vec<Option<&str>>)]) -> DataFrame {
        DataFrame::new(
            columns
                .iter()
                .map(|(name, values)| Column::new((*name).into(), values.clone()))
                .collect(),
        )
        .unwrap()
    }

    fn codelist(codes: &[(&str, &str)]) -> Codelist {
        Codelist {
            name: "test".to_string(),
            codes: codes
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn composite_sum_propagates_missing() {
        let df = raw(&[
            ("a", vec![Some("1"), Some("1")]),
            ("b", vec![Some("2"), None]),
            ("c", vec![Some("3"), Some("3")]),
            ("d", vec![Some("4"), Some("4")]),
            ("e", vec![Some("5"), Some("5")]),
        ]);
        let composite = CompositeScore {
            label: "Sum".to_string(),
            items: ["a", "b", "c", "d", "e"].map(String::from).to_vec(),
            aggregate: Aggregation::Sum,
        };
        let (values, dropped) = composite_values(&df, &composite).unwrap();
        assert_eq!(values, vec![Some(15.0), None]);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn composite_mean_treats_text_as_missing() {
        let df = raw(&[
            ("a", vec![Some("2"), Some("x")]),
            ("b", vec![Some("4"), Some("4")]),
        ]);
        let composite = CompositeScore {
            label: "Mean".to_string(),
            items: vec!["a".to_string(), "b".to_string()],
            aggregate: Aggregation::Mean,
        };
        let (values, dropped) = composite_values(&df, &composite).unwrap();
        assert_eq!(values, vec![Some(3.0), None]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn recode_unmapped_is_missing() {
        let df = raw(&[("q", vec![Some("1"), Some("-1.0"), Some("7"), None])]);
        let recode = CategoricalRecode {
            source: "q".to_string(),
            label: "q".to_string(),
            codelist: codelist(&[("0", "No"), ("1", "Yes"), ("-1", "not known")]),
            unmapped: Unmapped::Missing,
        };
        assert_eq!(
            recode_values(&df, &recode).unwrap(),
            vec![
                Some("Yes".to_string()),
                Some("not known".to_string()),
                None,
                None
            ]
        );
    }

    #[test]
    fn recode_keep_passes_token_through() {
        let df = raw(&[("age", vec![Some("31"), Some("-2"), Some("29.0")])]);
        let recode = CategoricalRecode {
            source: "age".to_string(),
            label: "age".to_string(),
            codelist: codelist(&[("-1", "not known"), ("-2", "not available")]),
            unmapped: Unmapped::Keep,
        };
        assert_eq!(
            recode_values(&df, &recode).unwrap(),
            vec![
                Some("31".to_string()),
                Some("not available".to_string()),
                Some("29".to_string())
            ]
        );
    }

    #[test]
    fn bands_label_numbers() {
        let df = raw(&[("ftnd_sum", vec![Some("8"), Some("5"), Some("0"), Some("n/a"), None])]);
        let band = BandedRecode {
            source: "ftnd_sum".to_string(),
            label: "Likelihood".to_string(),
            bands: vec![
                Band {
                    label: "high".to_string(),
                    min: Some(7.0),
                    max: Some(10.0),
                    below: None,
                },
                Band {
                    label: "moderate".to_string(),
                    min: Some(4.0),
                    max: Some(6.0),
                    below: None,
                },
                Band {
                    label: "low".to_string(),
                    min: None,
                    max: None,
                    below: Some(4.0),
                },
            ],
        };
        let (values, dropped) = band_values(&df, &band).unwrap();
        assert_eq!(
            values,
            vec![
                Some("high".to_string()),
                Some("moderate".to_string()),
                Some("low".to_string()),
                None,
                None
            ]
        );
        assert_eq!(dropped, 1);
    }

    #[test]
    fn concat_skips_missing_and_unknown() {
        let df = raw(&[
            ("p1", vec![Some("ALC"), None, Some("XYZ")]),
            ("p2", vec![Some("ANX"), None, None]),
            ("p3", vec![None, None, Some("SUIC")]),
        ]);
        let concat = ConcatRecode {
            label: "Paternal".to_string(),
            sources: vec!["p1".to_string(), "p2".to_string(), "p3".to_string()],
            codelist: codelist(&[
                ("ALC", "Alcohol problems"),
                ("ANX", "Anxiety Disorder"),
                ("SUIC", "Suicide"),
            ]),
            separator: ",".to_string(),
        };
        assert_eq!(
            concat_values(&df, &concat).unwrap(),
            vec![
                Some("Alcohol problems,Anxiety Disorder".to_string()),
                None,
                Some("Suicide".to_string())
            ]
        );
    }

    #[test]
    fn copy_number_counts_dropped_cells() {
        let df = raw(&[("open_mean", vec![Some("3.5"), Some("missing"), None])]);
        let roi = RoiColumn::Copy {
            source: "open_mean".to_string(),
            label: "Openness mean".to_string(),
            value: ValueType::Number,
        };
        let derived = derive_column(&df, &roi).unwrap();
        assert_eq!(derived.column.name().as_str(), "Openness mean");
        assert_eq!(derived.column.dtype(), &DataType::Float64);
        assert_eq!(derived.dropped, 1);
        assert_eq!(derived.column.null_count(), 2);
    }
}
