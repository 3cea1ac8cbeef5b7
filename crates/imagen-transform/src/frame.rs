//! Table types passed between pipeline stages.

use std::path::PathBuf;

use imagen_common::{any_to_i64, any_to_string_non_empty, has_column};
use imagen_model::{
    ID_COLUMN, InstrumentSchema, RecordKey, SESSION_COLUMN, Session, SubjectId, ValueType,
};
use polars::prelude::*;

use crate::error::{Result, TransformError};

/// One session's rows of an instrument, restricted to the declared columns.
#[derive(Debug, Clone)]
pub struct SessionTable {
    pub session: Session,
    /// Raw file the rows were read from.
    pub source: PathBuf,
    pub data: DataFrame,
    /// Non-empty cells that could not be parsed as numbers.
    pub dropped_cells: usize,
}

/// The long-format table of one instrument across all its sessions.
#[derive(Debug, Clone)]
pub struct InstrumentTable {
    pub instrument: String,
    pub data: DataFrame,
}

impl InstrumentTable {
    pub fn new(instrument: impl Into<String>, data: DataFrame) -> Self {
        Self {
            instrument: instrument.into(),
            data,
        }
    }

    pub fn record_count(&self) -> usize {
        self.data.height()
    }
}

/// Expected column names of an instrument table, in order.
pub fn expected_columns(schema: &InstrumentSchema) -> Vec<String> {
    let mut columns = vec![ID_COLUMN.to_string(), SESSION_COLUMN.to_string()];
    columns.extend(schema.output_labels().into_iter().map(str::to_string));
    columns
}

/// Declared column types of an instrument table, in column order.
pub fn instrument_dtypes(schema: &InstrumentSchema) -> Vec<(String, DataType)> {
    let mut types = vec![
        (ID_COLUMN.to_string(), DataType::Int64),
        (SESSION_COLUMN.to_string(), DataType::String),
    ];
    types.extend(schema.columns.iter().map(|roi| {
        let dtype = match roi.output_type() {
            ValueType::Number => DataType::Float64,
            ValueType::Text => DataType::String,
        };
        (roi.label().to_string(), dtype)
    }));
    types
}

/// An instrument table with no rows but the declared column types.
pub fn empty_instrument_frame(schema: &InstrumentSchema) -> PolarsResult<DataFrame> {
    let columns = instrument_dtypes(schema)
        .into_iter()
        .map(|(name, dtype)| Column::new_empty(name.into(), &dtype))
        .collect();
    DataFrame::new(columns)
}

pub(crate) fn require_column(df: &DataFrame, column: &str) -> Result<()> {
    if has_column(df, column) {
        Ok(())
    } else {
        Err(TransformError::MissingColumn {
            column: column.to_string(),
        })
    }
}

/// Reads the (ID, Session) key of every row.
pub fn record_keys(df: &DataFrame) -> Result<Vec<RecordKey>> {
    require_column(df, ID_COLUMN)?;
    require_column(df, SESSION_COLUMN)?;
    let ids = df.column(ID_COLUMN)?;
    let sessions = df.column(SESSION_COLUMN)?;

    let mut keys = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let id_value = ids.get(row)?;
        let id = any_to_i64(id_value.clone()).ok_or_else(|| TransformError::InvalidKey {
            column: ID_COLUMN.to_string(),
            row: row + 1,
            value: id_value.to_string(),
        })?;
        let session_text = any_to_string_non_empty(sessions.get(row)?).unwrap_or_default();
        let session =
            session_text
                .parse::<Session>()
                .map_err(|_| TransformError::InvalidKey {
                    column: SESSION_COLUMN.to_string(),
                    row: row + 1,
                    value: session_text.clone(),
                })?;
        keys.push(RecordKey::new(SubjectId(id), session));
    }
    Ok(keys)
}

/// Keeps only the rows recorded at `session`.
pub fn filter_session(df: &DataFrame, session: Session) -> Result<DataFrame> {
    let keep: Vec<bool> = record_keys(df)?
        .iter()
        .map(|key| key.session == session)
        .collect();
    let mask = BooleanChunked::from_slice("session".into(), &keep);
    Ok(df.filter(&mask)?)
}
