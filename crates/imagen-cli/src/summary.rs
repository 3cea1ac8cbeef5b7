use std::path::PathBuf;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use imagen_model::Session;
use imagen_stats::{ColumnComparison, ColumnSummary, Crosstab, TestResult};

use imagen_cli::types::{AnnotationSummary, BuildResult, LabelSetSummary};

/// Significance level used to highlight p-values.
const ALPHA: f64 = 0.05;

pub fn print_build_summary(result: &BuildResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Instrument"),
        header_cell("Description"),
        header_cell("Sessions"),
        header_cell("Records"),
        header_cell("Excluded"),
        header_cell("Dropped cells"),
        header_cell("Duplicates"),
        header_cell("CSV"),
        header_cell("Annotated"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 3..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 7, CellAlignment::Center);
    align_column(&mut table, 8, CellAlignment::Center);

    let mut total_records = 0usize;
    for summary in &result.built {
        total_records += summary.records;
        table.add_row(vec![
            Cell::new(&summary.instrument)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            match &summary.description {
                Some(description) => Cell::new(description),
                None => dim_cell("-"),
            },
            Cell::new(session_list(&summary.sessions)),
            Cell::new(summary.records),
            count_cell(Some(summary.excluded), Color::Yellow),
            count_cell(Some(summary.dropped_cells), Color::Yellow),
            count_cell(Some(summary.duplicates.len()), Color::Yellow),
            output_cell(summary.output.as_ref()),
            output_cell(
                summary
                    .annotation
                    .as_ref()
                    .and_then(|annotation| annotation.output.as_ref()),
            ),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} built, {} failed", result.built.len(), result.failed.len()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_records).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(Some(result.duplicate_count()), Color::Yellow).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");
    print_duplicate_table(result);
    for summary in &result.built {
        if let Some(annotation) = &summary.annotation {
            print_annotation_summary(annotation);
        }
    }
    if result.has_errors() {
        eprintln!("Errors:");
        for failure in &result.failed {
            match failure.session {
                Some(session) => eprintln!(
                    "- {} [{}, {}]: {}",
                    failure.instrument, failure.kind, session, failure.message
                ),
                None => eprintln!(
                    "- {} [{}]: {}",
                    failure.instrument, failure.kind, failure.message
                ),
            }
        }
    }
}

fn print_duplicate_table(result: &BuildResult) {
    if result.duplicate_count() == 0 {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Instrument"),
        header_cell("ID"),
        header_cell("Session"),
        header_cell("Rows"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    for summary in &result.built {
        for duplicate in &summary.duplicates {
            table.add_row(vec![
                Cell::new(&summary.instrument),
                Cell::new(duplicate.id),
                Cell::new(duplicate.session),
                Cell::new(duplicate.count).fg(Color::Yellow),
            ]);
        }
    }
    println!();
    println!("Duplicate records:");
    println!("{table}");
}

pub fn print_label_summary(summary: &LabelSetSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Label set"),
        header_cell("Sessions"),
        header_cell("Records"),
        header_cell("CSV"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    table.add_row(vec![
        Cell::new(&summary.label_set).add_attribute(Attribute::Bold),
        Cell::new(session_list(&summary.sessions)),
        Cell::new(summary.records),
        output_cell(summary.output.as_ref()),
    ]);
    println!("{table}");
    if let Some(path) = &summary.output {
        println!("Output: {}", path.display());
    }
}

pub fn print_annotation_summary(summary: &AnnotationSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Label set"),
        header_cell("Session"),
        header_cell("Records"),
        header_cell("Matched"),
        header_cell("Unmatched"),
        header_cell("Conflicts"),
    ]);
    apply_table_style(&mut table);
    for index in 2..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(&summary.label_set).add_attribute(Attribute::Bold),
        Cell::new(summary.session.map_or("ALL", |session| session.code())),
        Cell::new(summary.records),
        Cell::new(summary.matched).fg(Color::Green),
        count_cell(Some(summary.unmatched), Color::Yellow),
        count_cell(Some(summary.conflicting_keys), Color::Red),
    ]);
    println!("{table}");
    if let Some(path) = &summary.output {
        println!("Output: {}", path.display());
    }
}

pub fn print_describe(summaries: &[ColumnSummary]) {
    if summaries.is_empty() {
        println!("No numeric values to describe.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Group"),
        header_cell("Count"),
        header_cell("Mean"),
        header_cell("Std"),
        header_cell("Min"),
        header_cell("25%"),
        header_cell("50%"),
        header_cell("75%"),
        header_cell("Max"),
    ]);
    apply_table_style(&mut table);
    for index in 2..=9 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for entry in summaries {
        let s = &entry.summary;
        table.add_row(vec![
            Cell::new(&entry.column).add_attribute(Attribute::Bold),
            match &entry.group {
                Some(group) => Cell::new(group),
                None => dim_cell("-"),
            },
            Cell::new(s.count),
            number_cell(s.mean),
            number_cell(s.std),
            number_cell(s.min),
            number_cell(s.q25),
            number_cell(s.q50),
            number_cell(s.q75),
            number_cell(s.max),
        ]);
    }
    println!("{table}");
}

pub fn print_crosstab(tab: &Crosstab) {
    let mut header = vec![header_cell(&format!(
        "{} / {}",
        tab.row_variable, tab.column_variable
    ))];
    header.extend(tab.columns.iter().map(|column| header_cell(column)));
    header.push(header_cell("Total"));

    let mut table = Table::new();
    table.set_header(header);
    apply_table_style(&mut table);
    for index in 1..=tab.columns.len() + 1 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let frequencies = tab.frequencies();
    for ((row, counts), (freqs, total)) in tab
        .rows
        .iter()
        .zip(&tab.counts)
        .zip(frequencies.iter().zip(tab.row_totals()))
    {
        let mut cells = vec![Cell::new(row).add_attribute(Attribute::Bold)];
        cells.extend(
            counts
                .iter()
                .zip(freqs)
                .map(|(count, freq)| Cell::new(format!("{count} ({:.1}%)", freq * 100.0))),
        );
        cells.push(Cell::new(total).add_attribute(Attribute::Bold));
        table.add_row(cells);
    }
    let mut totals = vec![
        Cell::new("Total")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
    ];
    totals.extend(tab.column_totals().into_iter().map(Cell::new));
    totals.push(Cell::new(tab.total()).add_attribute(Attribute::Bold));
    table.add_row(totals);
    println!("{table}");
}

pub fn print_comparisons(comparisons: &[ColumnComparison]) {
    let Some(first) = comparisons
        .iter()
        .find_map(|comparison| comparison.result.as_ref().ok())
    else {
        if !comparisons.is_empty() {
            eprintln!("No column has enough values in both groups to compare.");
        }
        print_skipped(comparisons);
        return;
    };
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell(&format!("n {}", first.group_a)),
        header_cell(&format!("n {}", first.group_b)),
        header_cell(&format!("Mean {}", first.group_a)),
        header_cell(&format!("Mean {}", first.group_b)),
        header_cell("t"),
        header_cell("p (t)"),
        header_cell("t Welch"),
        header_cell("p (Welch)"),
        header_cell("p (Levene)"),
        header_cell("p (Bartlett)"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=10 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for comparison in comparisons {
        let Ok(result) = &comparison.result else {
            continue;
        };
        table.add_row(vec![
            Cell::new(&result.column).add_attribute(Attribute::Bold),
            Cell::new(result.n_a),
            Cell::new(result.n_b),
            number_cell(result.mean_a),
            number_cell(result.mean_b),
            number_cell(result.student.statistic),
            p_value_cell(&result.student),
            number_cell(result.welch.statistic),
            p_value_cell(&result.welch),
            p_value_cell(&result.levene),
            p_value_cell(&result.bartlett),
        ]);
    }
    println!("{table}");
    print_skipped(comparisons);
}

fn print_skipped(comparisons: &[ColumnComparison]) {
    for comparison in comparisons {
        if let Err(error) = &comparison.result {
            eprintln!("- skipped {}: {error}", comparison.column);
        }
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn session_list(sessions: &[Session]) -> String {
    sessions
        .iter()
        .map(Session::code)
        .collect::<Vec<_>>()
        .join(", ")
}

fn output_cell(path: Option<&PathBuf>) -> Cell {
    match path {
        Some(_) => Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        None => dim_cell("-"),
    }
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn number_cell(value: f64) -> Cell {
    if value.is_nan() {
        dim_cell("NaN")
    } else {
        Cell::new(format!("{value:.3}"))
    }
}

fn p_value_cell(result: &TestResult) -> Cell {
    let p = result.p_value;
    if p.is_nan() {
        dim_cell("NaN")
    } else if p < ALPHA {
        Cell::new(format!("{p:.4}"))
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new(format!("{p:.4}"))
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
