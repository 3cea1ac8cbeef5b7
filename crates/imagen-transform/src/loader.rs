//! Schema-driven loading of per-session instrument files.

use std::path::Path;

use imagen_common::column_string_values;
use imagen_ingest::{IdentifierNormalizer, read_source_table, require_columns};
use imagen_model::{ID_COLUMN, InstrumentSchema, SESSION_COLUMN, Session, USER_CODE_COLUMN};
use imagen_standards::DataLayout;
use polars::prelude::*;
use tracing::{debug, warn};

use crate::derive::derive_column;
use crate::error::{Result, TransformError};
use crate::frame::SessionTable;

/// Loads one declared session of an instrument from the data layout.
pub fn load_session(
    schema: &InstrumentSchema,
    session: Session,
    layout: &DataLayout,
) -> Result<SessionTable> {
    let source = schema
        .source_for(session)
        .ok_or_else(|| TransformError::SessionNotDeclared {
            instrument: schema.name.clone(),
            session,
        })?;
    load_session_from_path(schema, session, &layout.raw_file(source))
}

/// Loads every declared session, in declared order.
///
/// Stops at the first failing session.
pub fn load_instrument(
    schema: &InstrumentSchema,
    layout: &DataLayout,
) -> Result<Vec<SessionTable>> {
    schema
        .sources
        .iter()
        .map(|source| load_session(schema, source.session, layout))
        .collect()
}

/// Loads one session's rows from an explicit raw file.
///
/// The result has exactly the columns `ID`, `Session` and the schema's
/// output labels, in declared order.
pub fn load_session_from_path(
    schema: &InstrumentSchema,
    session: Session,
    path: &Path,
) -> Result<SessionTable> {
    let raw = read_source_table(path).map_err(|e| TransformError::ingest(session, e))?;

    let mut required = vec![USER_CODE_COLUMN];
    required.extend(schema.required_source_columns());
    require_columns(&raw, path, &required).map_err(|e| TransformError::ingest(session, e))?;

    let normalizer = IdentifierNormalizer::for_schema(schema);
    let ids = normalizer
        .normalize_column(
            &column_string_values(&raw, USER_CODE_COLUMN)?,
            session,
            path,
        )
        .map_err(|e| TransformError::ingest(session, e))?;

    let height = raw.height();
    let mut columns = Vec::with_capacity(schema.columns.len() + 2);
    columns.push(Column::new(
        ID_COLUMN.into(),
        ids.iter().map(|id| id.value()).collect::<Vec<i64>>(),
    ));
    columns.push(Column::new(
        SESSION_COLUMN.into(),
        vec![session.code(); height],
    ));

    let mut dropped_cells = 0;
    for roi in &schema.columns {
        let derived = derive_column(&raw, roi)?;
        if derived.dropped > 0 {
            warn!(
                instrument = %schema.name,
                session = %session,
                column = roi.label(),
                cells = derived.dropped,
                "non-numeric cells treated as missing"
            );
        }
        dropped_cells += derived.dropped;
        columns.push(derived.column);
    }

    let data = DataFrame::new(columns)?;
    debug!(
        instrument = %schema.name,
        session = %session,
        path = %path.display(),
        rows = data.height(),
        "loaded session table"
    );

    Ok(SessionTable {
        session,
        source: path.to_path_buf(),
        data,
        dropped_cells,
    })
}
