//! Export then generic reload.

use imagen_ingest::read_table;
use imagen_output::{ExportOptions, export_table};
use polars::prelude::*;

#[test]
fn exported_table_reloads_row_for_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Instrument").join("PBQ.csv");
    let df = DataFrame::new(vec![
        Column::new("ID".into(), vec![71766352i64, 12809392, 15765805]),
        Column::new("Session".into(), vec!["BL", "BL", "FU1"]),
        Column::new(
            "Emotional abuse sum".into(),
            vec![Some(5.0f64), None, Some(12.5)],
        ),
        Column::new(
            "pbq_03".into(),
            vec![Some("Yes"), Some("not known"), None],
        ),
    ])
    .unwrap();

    export_table(&df, &path, ExportOptions::default()).unwrap();
    let reloaded = read_table(&path).unwrap();

    assert_eq!(reloaded.shape(), df.shape());
    assert_eq!(reloaded.get_column_names(), df.get_column_names());
    assert!(reloaded.equals_missing(&df));
}
