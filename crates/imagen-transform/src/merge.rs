//! Session merging.
//!
//! Per-session tables are stacked into one long-format table and the
//! schema's declared exclusions are dropped. Nothing else is deduplicated:
//! (ID, Session) pairs that still repeat are reported, never collapsed.

use std::collections::BTreeMap;

use imagen_model::{InstrumentSchema, RecordKey, Session, SubjectId};
use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, TransformError};
use crate::frame::{
    InstrumentTable, SessionTable, empty_instrument_frame, expected_columns, record_keys,
};

/// An (ID, Session) pair that occurs more than once after exclusions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    pub id: SubjectId,
    pub session: Session,
    pub count: usize,
}

/// Result of merging one instrument's session tables.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub table: InstrumentTable,
    /// Rows dropped by the schema's exclusion list.
    pub excluded: usize,
    /// Unresolved duplicate keys, ordered by session then ID.
    pub duplicates: Vec<DuplicateRecord>,
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Stacks the session tables, applies exclusions and reports duplicates.
pub fn merge_sessions(schema: &InstrumentSchema, tables: &[SessionTable]) -> Result<MergeOutcome> {
    let expected = expected_columns(schema);
    let mut combined: Option<DataFrame> = None;

    for table in tables {
        let found = column_names(&table.data);
        if found != expected {
            return Err(TransformError::ColumnMismatch {
                session: table.session,
                path: table.source.clone(),
                expected: expected.join(", "),
                found: found.join(", "),
            });
        }
        match combined.as_mut() {
            Some(existing) => {
                existing.vstack_mut(&table.data)?;
            }
            None => combined = Some(table.data.clone()),
        }
    }

    let stacked = match combined {
        Some(df) => df,
        None => empty_instrument_frame(schema)?,
    };
    let before = stacked.height();

    let keys = record_keys(&stacked)?;
    let keep: Vec<bool> = keys.iter().map(|key| !schema.is_excluded(key)).collect();
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let data = stacked.filter(&mask)?;
    let excluded = before - data.height();

    let kept_keys: Vec<RecordKey> = keys
        .into_iter()
        .zip(&keep)
        .filter_map(|(key, keep)| keep.then_some(key))
        .collect();
    let duplicates = find_duplicates(&kept_keys);

    if !duplicates.is_empty() {
        let ids: Vec<String> = duplicates
            .iter()
            .map(|d| format!("{}@{}x{}", d.id, d.session, d.count))
            .collect();
        warn!(
            instrument = %schema.name,
            duplicates = duplicates.len(),
            ids = %ids.join(", "),
            "duplicate (ID, Session) records remain after exclusions"
        );
    }
    info!(
        instrument = %schema.name,
        sessions = tables.len(),
        rows = data.height(),
        excluded,
        "merged session tables"
    );

    Ok(MergeOutcome {
        table: InstrumentTable::new(schema.name.clone(), data),
        excluded,
        duplicates,
    })
}

/// Counts keys that occur more than once.
pub fn find_duplicates(keys: &[RecordKey]) -> Vec<DuplicateRecord> {
    let mut counts: BTreeMap<(Session, SubjectId), usize> = BTreeMap::new();
    for key in keys {
        *counts.entry((key.session, key.id)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((session, id), count)| DuplicateRecord { id, session, count })
        .collect()
}
