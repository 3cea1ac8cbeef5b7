//! Instrument pipeline with explicit stages.
//!
//! One instrument runs these stages in order:
//! 1. **Schema lookup** in the registry
//! 2. **Load** every declared session file
//! 3. **Merge** the session tables and apply exclusions
//! 4. **Annotate** with cohort labels (optional)
//! 5. **Export** the tables (unless persistence is off)
//!
//! A failing stage aborts only its own instrument; [`run_batch`] carries on
//! with the rest.

use std::path::{Path, PathBuf};
use std::time::Instant;

use imagen_ingest::{
    IngestError, labels_to_frame, load_label_set, read_label_table, read_typed_table,
};
use imagen_model::{CohortLabel, InstrumentSchema, Session};
use imagen_output::{ExportOptions, export_table, export_tables};
use imagen_standards::{DataLayout, InstrumentRegistry};
use imagen_transform::{
    annotate, filter_session, instrument_dtypes, labels_for_session, load_instrument,
    merge_sessions,
};
use polars::prelude::DataFrame;
use tracing::{error, info, info_span, warn};

use crate::types::{
    AnnotationSummary, BuildError, BuildResult, InstrumentFailure, InstrumentSummary,
    LabelSetSummary,
};

/// Options shared by the pipeline commands.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Write tables under the layout's output directory.
    pub save: bool,
    /// Label set to annotate each built instrument with.
    pub label_set: Option<String>,
    pub export: ExportOptions,
}

fn export_if(
    save: bool,
    df: &DataFrame,
    path: PathBuf,
    options: ExportOptions,
) -> Result<Option<PathBuf>, BuildError> {
    if !save {
        return Ok(None);
    }
    export_table(df, &path, options)?;
    Ok(Some(path))
}

/// Reads a label set's exported table.
pub fn read_labels(layout: &DataLayout, label_set: &str) -> Result<Vec<CohortLabel>, BuildError> {
    Ok(read_label_table(&layout.table_path(label_set))?)
}

/// Reloads an exported table with the declared types of its instrument.
pub fn read_instrument_table(
    schema: &InstrumentSchema,
    path: &Path,
) -> Result<DataFrame, BuildError> {
    Ok(read_typed_table(path, &instrument_dtypes(schema))?)
}

/// The instrument an exported table belongs to, from its file name.
///
/// Instrument tables are named after the instrument; annotated tables end
/// in `_<instrument>`.
pub fn instrument_for_table<'r>(
    registry: &'r InstrumentRegistry,
    path: &Path,
) -> Option<&'r InstrumentSchema> {
    let stem = path.file_stem()?.to_str()?;
    registry.schema_for(stem).ok().or_else(|| {
        let (_, instrument) = stem.rsplit_once('_')?;
        registry.schema_for(instrument).ok()
    })
}

/// Loads, merges and (optionally) annotates and exports one instrument.
pub fn build_instrument(
    registry: &InstrumentRegistry,
    layout: &DataLayout,
    name: &str,
    options: &BuildOptions,
) -> Result<InstrumentSummary, BuildError> {
    let schema = registry.schema_for(name)?;
    let start = Instant::now();

    let sessions = load_instrument(schema, layout)?;
    let dropped_cells: usize = sessions.iter().map(|table| table.dropped_cells).sum();
    let merged = merge_sessions(schema, &sessions)?;
    let records = merged.table.record_count();

    let annotated = match &options.label_set {
        Some(label_set) => {
            let label_set = registry.label_set(label_set)?.name.clone();
            let labels = read_labels(layout, &label_set)?;
            let outcome = annotate(&merged.table.data, &labels, schema.label_join)?;
            let path = layout.annotated_path(&label_set, None, &schema.name);
            Some((label_set, outcome, path))
        }
        None => None,
    };

    // The instrument table and its annotated table are committed together.
    let table_path = layout.table_path(&schema.name);
    if options.save {
        let mut tables = vec![(&merged.table.data, table_path.as_path())];
        if let Some((_, outcome, path)) = &annotated {
            tables.push((&outcome.table, path.as_path()));
        }
        export_tables(&tables, options.export)?;
    }
    let output = options.save.then_some(table_path);
    let annotation = annotated.map(|(label_set, outcome, path)| AnnotationSummary {
        label_set,
        session: None,
        records: outcome.table.height(),
        matched: outcome.matched,
        unmatched: outcome.unmatched,
        conflicting_keys: outcome.conflicting_keys,
        output: options.save.then_some(path),
    });

    info!(
        instrument = %schema.name,
        records,
        excluded = merged.excluded,
        duplicates = merged.duplicates.len(),
        duration_ms = start.elapsed().as_millis(),
        "instrument built"
    );

    Ok(InstrumentSummary {
        instrument: schema.name.clone(),
        description: schema.description.clone(),
        sessions: schema.sessions(),
        records,
        excluded: merged.excluded,
        dropped_cells,
        duplicates: merged.duplicates,
        output,
        annotation,
    })
}

/// Builds every named instrument; failures are collected, not propagated.
pub fn run_batch(
    registry: &InstrumentRegistry,
    layout: &DataLayout,
    names: &[String],
    options: &BuildOptions,
) -> BuildResult {
    let mut result = BuildResult::default();
    for name in names {
        let span = info_span!("instrument", name = %name);
        let _guard = span.enter();
        match build_instrument(registry, layout, name, options) {
            Ok(summary) => result.built.push(summary),
            Err(err) => {
                error!(
                    instrument = %name,
                    kind = err.kind(),
                    session = ?err.session(),
                    error = %err,
                    "instrument build failed"
                );
                result.failed.push(InstrumentFailure::new(name.clone(), &err));
            }
        }
    }
    if result.has_errors() {
        warn!(
            built = result.built.len(),
            failed = result.failed.len(),
            "batch finished with failures"
        );
    }
    result
}

/// Decodes a label set from its stores and exports the label table.
pub fn build_label_set(
    registry: &InstrumentRegistry,
    layout: &DataLayout,
    name: &str,
    save: bool,
) -> Result<LabelSetSummary, BuildError> {
    let schema = registry.label_set(name)?;
    let labels = load_label_set(schema, layout)?;
    let frame = labels_to_frame(&labels).map_err(IngestError::from)?;
    let output = export_if(
        save,
        &frame,
        layout.table_path(&schema.name),
        ExportOptions::default(),
    )?;
    Ok(LabelSetSummary {
        label_set: schema.name.clone(),
        records: labels.len(),
        sessions: schema.sessions(),
        output,
    })
}

/// Reloads an exported instrument table and annotates it with an exported
/// label table, optionally restricted to one session.
pub fn annotate_exported(
    registry: &InstrumentRegistry,
    layout: &DataLayout,
    instrument: &str,
    label_set: &str,
    session: Option<Session>,
    save: bool,
) -> Result<AnnotationSummary, BuildError> {
    let schema = registry.schema_for(instrument)?;
    let label_set = registry.label_set(label_set)?.name.clone();

    let mut table = read_instrument_table(schema, &layout.table_path(&schema.name))?;
    let mut labels = read_labels(layout, &label_set)?;
    if let Some(session) = session {
        table = filter_session(&table, session)?;
        labels = labels_for_session(&labels, session);
    }

    let outcome = annotate(&table, &labels, schema.label_join)?;
    let output = export_if(
        save,
        &outcome.table,
        layout.annotated_path(&label_set, session, &schema.name),
        ExportOptions::default(),
    )?;
    Ok(AnnotationSummary {
        label_set,
        session,
        records: outcome.table.height(),
        matched: outcome.matched,
        unmatched: outcome.unmatched,
        conflicting_keys: outcome.conflicting_keys,
        output,
    })
}
