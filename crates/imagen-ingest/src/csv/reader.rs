//! CSV file reading.
//!
//! Raw questionnaire exports are read with every column as text so the
//! identifier and code columns keep their exact spelling; derivation parses
//! cells explicitly. Exported tables are reloaded with type inference, or
//! with declared types where the caller knows them.

use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Rows sampled for type inference when reloading exported tables.
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(IngestError::SourceFileMissing {
            path: path.to_path_buf(),
        })
    }
}

fn read_csv(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    ensure_exists(path)?;

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(infer_schema_length))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    normalize_headers(&mut df)?;
    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read CSV"
    );
    Ok(df)
}

/// Strips byte-order marks and surrounding whitespace from column names.
fn normalize_headers(df: &mut DataFrame) -> Result<()> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim().trim_matches('\u{feff}').to_string())
        .collect();
    let changed = df
        .get_column_names()
        .iter()
        .zip(&names)
        .any(|(old, new)| old.as_str() != new);
    if changed {
        df.set_column_names(names.iter().map(String::as_str))?;
    }
    Ok(())
}

/// Reads a raw questionnaire export with every column as text.
///
/// Fails with [`IngestError::SourceFileMissing`] when the file is absent.
pub fn read_source_table(path: &Path) -> Result<DataFrame> {
    read_csv(path, 0)
}

/// Reloads a tabular file with inferred column types.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    read_csv(path, DEFAULT_INFER_SCHEMA_LENGTH)
}

/// Reloads a tabular file and casts the named columns to their declared
/// types.
///
/// Inference reads a column with no values as text; the cast restores its
/// declared type. Columns absent from the file are skipped.
pub fn read_typed_table(path: &Path, types: &[(String, DataType)]) -> Result<DataFrame> {
    let mut df = read_table(path)?;
    for (name, dtype) in types {
        let Ok(column) = df.column(name) else {
            continue;
        };
        if column.dtype() == dtype {
            continue;
        }
        let cast = column
            .strict_cast(dtype)
            .map_err(|e| IngestError::CsvParse {
                path: path.to_path_buf(),
                message: format!("column '{name}' is not {dtype}: {e}"),
            })?;
        df.with_column(cast)?;
    }
    Ok(df)
}

/// Checks that every expected column is present.
///
/// Reports all missing columns at once, in the order given.
pub fn require_columns(df: &DataFrame, path: &Path, columns: &[&str]) -> Result<()> {
    let present: Vec<&str> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .collect();
    let missing: Vec<String> = columns
        .iter()
        .filter(|column| !present.contains(column))
        .map(|column| (*column).to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestError::SourceSchemaMismatch {
            path: path.to_path_buf(),
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn source_table_keeps_text() {
        let file = write_csv("User code,open_mean\n000000012345-C,3.0\n000000067890-C,\n");
        let df = read_source_table(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("User code").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("open_mean").unwrap().dtype(), &DataType::String);
        let codes = df.column("User code").unwrap().str().unwrap();
        assert_eq!(codes.get(0), Some("000000012345-C"));
    }

    #[test]
    fn read_table_infers_numbers() {
        let file = write_csv("ID,Session,Score\n1,BL,2.5\n2,FU1,\n");
        let df = read_table(file.path()).unwrap();
        assert_eq!(df.column("ID").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Score").unwrap().null_count(), 1);
    }

    #[test]
    fn declared_types_override_inference() {
        let file = write_csv("ID,Session,Score,Count,Note\n1,BL,,2,a\n2,FU1,,3,b\n");
        let inferred = read_table(file.path()).unwrap();
        assert_ne!(inferred.column("Score").unwrap().dtype(), &DataType::Float64);

        let types = vec![
            ("ID".to_string(), DataType::Int64),
            ("Score".to_string(), DataType::Float64),
            ("Count".to_string(), DataType::Float64),
            ("Absent".to_string(), DataType::Float64),
        ];
        let df = read_typed_table(file.path(), &types).unwrap();
        assert_eq!(df.column("Score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Score").unwrap().null_count(), 2);
        assert_eq!(df.column("Count").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Note").unwrap().dtype(), &DataType::String);
        assert!(df.column("Absent").is_err());
    }

    #[test]
    fn declared_type_mismatch_is_a_parse_error() {
        let file = write_csv("ID,Score\n1,high\n");
        let types = vec![("Score".to_string(), DataType::Float64)];
        let err = read_typed_table(file.path(), &types).unwrap_err();
        assert_eq!(err.kind(), "CsvParse");
        assert!(err.to_string().contains("Score"));
    }

    #[test]
    fn bom_is_stripped_from_header() {
        let file = write_csv("\u{feff}User code,x\nA,1\n");
        let df = read_source_table(file.path()).unwrap();
        assert!(df.column("User code").is_ok());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let err = read_source_table(&path).unwrap_err();
        assert!(matches!(err, IngestError::SourceFileMissing { .. }));
    }

    #[test]
    fn require_columns_lists_every_missing_column() {
        let file = write_csv("User code,CTQ_3\nA,1\n");
        let df = read_source_table(file.path()).unwrap();
        let err = require_columns(&df, file.path(), &["User code", "CTQ_3", "CTQ_8", "CTQ_14"])
            .unwrap_err();
        match err {
            IngestError::SourceSchemaMismatch { missing, .. } => {
                assert_eq!(missing, vec!["CTQ_8", "CTQ_14"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
