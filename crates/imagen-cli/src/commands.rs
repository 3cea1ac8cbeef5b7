use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use comfy_table::Table;
use tracing::{info, info_span};

use imagen_ingest::read_table;
use imagen_output::ExportOptions;
use imagen_standards::{
    DEFAULT_RELEASE, DataLayout, InstrumentRegistry, data_root, load_default_registry,
};
use imagen_stats::{compare_groups, crosstab, describe, numeric_columns};

use imagen_cli::pipeline::{
    BuildOptions, annotate_exported, build_label_set, instrument_for_table, read_instrument_table,
    run_batch,
};
use imagen_cli::types::{AnnotationSummary, BuildResult, LabelSetSummary};

use crate::cli::{AnnotateArgs, BuildArgs, DataArgs, LabelsArgs, StatsArgs};
use crate::summary::{
    apply_table_style, print_annotation_summary, print_comparisons, print_crosstab,
    print_describe, print_label_summary,
};

/// Column never treated as a measurement.
const ID_COLUMN: &str = "ID";

fn load_registry(data: &DataArgs) -> Result<InstrumentRegistry> {
    match &data.registry {
        Some(path) => InstrumentRegistry::from_path(path)
            .with_context(|| format!("load registry {}", path.display())),
        None => load_default_registry().context("load built-in registry"),
    }
}

fn data_layout(data: &DataArgs) -> DataLayout {
    let root = data.data_root.clone().unwrap_or_else(data_root);
    let release = data
        .release
        .clone()
        .unwrap_or_else(|| DEFAULT_RELEASE.to_string());
    DataLayout::new(root, release)
}

pub fn run_instruments(data: &DataArgs) -> Result<()> {
    let registry = load_registry(data)?;
    let mut table = Table::new();
    table.set_header(vec!["Instrument", "Sessions", "Columns", "Description"]);
    apply_table_style(&mut table);
    for schema in registry.instruments() {
        let sessions: Vec<&str> = schema.sources.iter().map(|s| s.session.code()).collect();
        table.add_row(vec![
            schema.name.clone(),
            sessions.join(", "),
            schema.columns.len().to_string(),
            schema.description.clone().unwrap_or_default(),
        ]);
    }
    println!("{table}");

    let label_sets = registry.label_set_names();
    if !label_sets.is_empty() {
        println!("Label sets: {}", label_sets.join(", "));
    }
    Ok(())
}

pub fn run_build(data: &DataArgs, args: &BuildArgs) -> Result<BuildResult> {
    let registry = load_registry(data)?;
    let layout = data_layout(data);
    let names: Vec<String> = if args.all {
        registry
            .instrument_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        args.instruments.clone()
    };
    let span = info_span!("build", root = %layout.root().display(), instruments = names.len());
    let _guard = span.enter();

    let options = BuildOptions {
        save: !args.no_save,
        label_set: args.labels.clone(),
        export: ExportOptions::default().with_index(args.index),
    };
    let result = run_batch(&registry, &layout, &names, &options);
    if let Some(path) = &args.report {
        write_report(path, &result)?;
        info!(path = %path.display(), "build report written");
    }
    Ok(result)
}

fn write_report(path: &Path, result: &BuildResult) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), result)
        .with_context(|| format!("write report {}", path.display()))
}

pub fn run_labels(data: &DataArgs, args: &LabelsArgs) -> Result<LabelSetSummary> {
    let registry = load_registry(data)?;
    let layout = data_layout(data);
    let summary = build_label_set(&registry, &layout, &args.label_set, !args.no_save)
        .with_context(|| format!("decode label set {}", args.label_set))?;
    print_label_summary(&summary);
    Ok(summary)
}

pub fn run_annotate(data: &DataArgs, args: &AnnotateArgs) -> Result<AnnotationSummary> {
    let registry = load_registry(data)?;
    let layout = data_layout(data);
    let summary = annotate_exported(
        &registry,
        &layout,
        &args.instrument,
        &args.labels,
        args.session,
        !args.no_save,
    )
    .with_context(|| format!("annotate {} with {}", args.instrument, args.labels))?;
    print_annotation_summary(&summary);
    Ok(summary)
}

/// A CSV path is used as is; anything else names a table in the output
/// directory.
fn resolve_table(layout: &DataLayout, table: &str) -> PathBuf {
    let path = Path::new(table);
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) || path.is_file() {
        path.to_path_buf()
    } else {
        layout.table_path(table)
    }
}

pub fn run_stats(data: &DataArgs, args: &StatsArgs) -> Result<()> {
    let registry = load_registry(data)?;
    let layout = data_layout(data);
    let path = resolve_table(&layout, &args.table);
    let df = match instrument_for_table(&registry, &path) {
        Some(schema) => read_instrument_table(schema, &path)
            .with_context(|| format!("read {} table {}", schema.name, path.display()))?,
        None => read_table(&path).with_context(|| format!("read {}", path.display()))?,
    };

    let columns: Vec<&str> = if args.columns.is_empty() {
        numeric_columns(&df, &[ID_COLUMN])
    } else {
        args.columns.iter().map(String::as_str).collect()
    };
    if columns.is_empty() {
        bail!("{} has no numeric columns", path.display());
    }

    let has_group = df.column(&args.group).is_ok();
    let group = has_group.then_some(args.group.as_str());
    print_describe(&describe(&df, &columns, group).context("describe columns")?);

    if !has_group {
        info!(group = %args.group, "no grouping column; group statistics skipped");
        return Ok(());
    }
    if df.column(&args.crosstab).is_ok() {
        println!();
        print_crosstab(&crosstab(&df, &args.group, &args.crosstab).context("cross-tabulate")?);
    }
    let [a, b] = args.compare.as_slice() else {
        bail!("--compare takes exactly two group values");
    };
    let comparisons =
        compare_groups(&df, &columns, &args.group, a, b).context("compare groups")?;
    println!();
    print_comparisons(&comparisons);
    Ok(())
}
