//! Cohort label stores.
//!
//! A labelled-dataset file holds parallel arrays (binary target, subject
//! index, sex code, site code). They are decoded into [`CohortLabel`]
//! records and exchanged as a label table with the columns
//! `ID, Session, y, Dataset, Sex, Site, Class`.

mod store;

use std::path::Path;

use imagen_common::{any_to_i64, any_to_string_non_empty};
use imagen_model::{
    CohortClass, CohortLabel, DatasetSplit, ID_COLUMN, LabelSetSchema, LabelSource,
    SESSION_COLUMN, Session, Sex, Site, SubjectId,
};
use imagen_standards::DataLayout;
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::csv::{read_source_table, require_columns};
use crate::error::{IngestError, Result};

pub use store::{LabelArrays, read_label_arrays};

/// Column holding the target dataset name.
pub const TARGET_COLUMN: &str = "y";
pub const DATASET_COLUMN: &str = "Dataset";
pub const SEX_COLUMN: &str = "Sex";
pub const SITE_COLUMN: &str = "Site";
pub const CLASS_COLUMN: &str = "Class";

/// Columns of a label table, in order.
pub const LABEL_TABLE_COLUMNS: [&str; 7] = [
    ID_COLUMN,
    SESSION_COLUMN,
    TARGET_COLUMN,
    DATASET_COLUMN,
    SEX_COLUMN,
    SITE_COLUMN,
    CLASS_COLUMN,
];

/// Decodes the raw arrays of one label file.
///
/// All arrays must have the same length and every site code must be one of
/// the eight known sites.
pub fn decode_labels(
    arrays: &LabelArrays,
    source: &LabelSource,
    path: &Path,
) -> Result<Vec<CohortLabel>> {
    let len = arrays.len();
    let lengths = [
        ("target", arrays.target.len()),
        ("sex", arrays.sex.len()),
        ("site", arrays.site.len()),
    ];
    for (name, other) in lengths {
        if other != len {
            return Err(IngestError::label_store(
                path,
                format!("array '{name}' has {other} entries, 'i' has {len}"),
            ));
        }
    }

    let mut labels = Vec::with_capacity(len);
    for idx in 0..len {
        let site_code = arrays.site[idx];
        let site = Site::from_code(site_code).ok_or_else(|| {
            IngestError::label_store(
                path,
                format!("record {idx} has unknown site code {site_code}"),
            )
        })?;
        labels.push(CohortLabel {
            id: SubjectId(arrays.ids[idx]),
            session: source.session,
            target: arrays.target_name.clone(),
            dataset: source.dataset,
            sex: Sex::from_code(arrays.sex[idx]),
            site,
            class: CohortClass::from_target(arrays.target[idx]),
        });
    }
    Ok(labels)
}

/// Reads and decodes every file of a label set, in declared order.
pub fn load_label_set(schema: &LabelSetSchema, layout: &DataLayout) -> Result<Vec<CohortLabel>> {
    let mut labels = Vec::new();
    for source in &schema.sources {
        let path = layout.label_file(source);
        let arrays = read_label_arrays(&path, schema.target.as_deref())?;
        if arrays.is_empty() {
            warn!(
                path = %path.display(),
                session = %source.session,
                "label file holds no records"
            );
        }
        let decoded = decode_labels(&arrays, source, &path)?;
        debug!(
            path = %path.display(),
            session = %source.session,
            dataset = %source.dataset,
            records = decoded.len(),
            "decoded label file"
        );
        labels.extend(decoded);
    }
    info!(
        label_set = %schema.name,
        files = schema.sources.len(),
        records = labels.len(),
        "loaded label set"
    );
    Ok(labels)
}

/// Builds the label table.
pub fn labels_to_frame(labels: &[CohortLabel]) -> PolarsResult<DataFrame> {
    let ids: Vec<i64> = labels.iter().map(|l| l.id.value()).collect();
    let sessions: Vec<&str> = labels.iter().map(|l| l.session.code()).collect();
    let targets: Vec<&str> = labels.iter().map(|l| l.target.as_str()).collect();
    let datasets: Vec<&str> = labels.iter().map(|l| l.dataset.as_str()).collect();
    let sexes: Vec<&str> = labels.iter().map(|l| l.sex.as_str()).collect();
    let sites: Vec<&str> = labels.iter().map(|l| l.site.as_str()).collect();
    let classes: Vec<&str> = labels.iter().map(|l| l.class.as_str()).collect();

    DataFrame::new(vec![
        Column::new(ID_COLUMN.into(), ids),
        Column::new(SESSION_COLUMN.into(), sessions),
        Column::new(TARGET_COLUMN.into(), targets),
        Column::new(DATASET_COLUMN.into(), datasets),
        Column::new(SEX_COLUMN.into(), sexes),
        Column::new(SITE_COLUMN.into(), sites),
        Column::new(CLASS_COLUMN.into(), classes),
    ])
}

/// Parses a label table back into records.
pub fn labels_from_frame(df: &DataFrame, path: &Path) -> Result<Vec<CohortLabel>> {
    require_columns(df, path, &LABEL_TABLE_COLUMNS)?;

    let text = |column: &str, row: usize| -> Result<String> {
        let value = df.column(column)?.get(row)?;
        any_to_string_non_empty(value).ok_or_else(|| {
            IngestError::label_store(path, format!("row {} has no {column}", row + 1))
        })
    };
    let parse_error = |row: usize, err: imagen_model::ParseError| {
        IngestError::label_store(path, format!("row {}: {err}", row + 1))
    };

    let mut labels = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let id = any_to_i64(df.column(ID_COLUMN)?.get(row)?).ok_or_else(|| {
            IngestError::label_store(path, format!("row {} has no integer ID", row + 1))
        })?;
        labels.push(CohortLabel {
            id: SubjectId(id),
            session: text(SESSION_COLUMN, row)?
                .parse::<Session>()
                .map_err(|e| parse_error(row, e))?,
            target: text(TARGET_COLUMN, row)?,
            dataset: text(DATASET_COLUMN, row)?
                .parse::<DatasetSplit>()
                .map_err(|e| parse_error(row, e))?,
            sex: text(SEX_COLUMN, row)?
                .parse::<Sex>()
                .map_err(|e| parse_error(row, e))?,
            site: text(SITE_COLUMN, row)?
                .parse::<Site>()
                .map_err(|e| parse_error(row, e))?,
            class: text(CLASS_COLUMN, row)?
                .parse::<CohortClass>()
                .map_err(|e| parse_error(row, e))?,
        });
    }
    Ok(labels)
}

/// Reloads an exported label table.
pub fn read_label_table(path: &Path) -> Result<Vec<CohortLabel>> {
    let df = read_source_table(path)?;
    let labels = labels_from_frame(&df, path)?;
    debug!(path = %path.display(), records = labels.len(), "read label table");
    Ok(labels)
}
