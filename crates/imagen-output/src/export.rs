//! Atomic CSV export.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{ExportError, Result};

/// Header of the optional row-index column.
pub const INDEX_COLUMN: &str = "index";

/// Options for [`export_table`] and [`export_tables`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Prepend a zero-based row index column.
    pub include_index: bool,
}

impl ExportOptions {
    pub fn with_index(mut self, include_index: bool) -> Self {
        self.include_index = include_index;
        self
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `df` to `path` as CSV with a header row.
///
/// Parent directories are created. The table is written to a temporary
/// sibling first and renamed into place, so a failed export never leaves a
/// partial file at `path`.
pub fn export_table(df: &DataFrame, path: &Path, options: ExportOptions) -> Result<()> {
    export_tables(&[(df, path)], options)
}

/// Writes several tables as one unit.
///
/// Every table is staged to its temporary sibling before any is renamed into
/// place. If a table fails to stage or commit, the temporaries and the tables
/// already committed by this call are removed.
pub fn export_tables(tables: &[(&DataFrame, &Path)], options: ExportOptions) -> Result<()> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(tables.len());
    for (df, path) in tables {
        match stage(df, path, options) {
            Ok(temp) => staged.push(temp),
            Err(err) => {
                discard(&staged);
                return Err(err);
            }
        }
    }

    for (idx, ((_, path), temp)) in tables.iter().zip(&staged).enumerate() {
        if let Err(e) = fs::rename(temp, path) {
            let committed: Vec<PathBuf> =
                tables[..idx].iter().map(|(_, p)| p.to_path_buf()).collect();
            discard(&committed);
            discard(&staged[idx..]);
            return Err(ExportError::unwritable("rename", *path, e));
        }
    }

    for (df, path) in tables {
        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "exported table"
        );
    }
    Ok(())
}

/// Writes one table to the temporary sibling of `path` and returns it.
fn stage(df: &DataFrame, path: &Path, options: ExportOptions) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| ExportError::unwritable("create directory", parent, e))?;
    }

    let mut out = if options.include_index {
        df.with_row_index(INDEX_COLUMN.into(), None)
            .map_err(|e| ExportError::unwritable("index", path, std::io::Error::other(e)))?
    } else {
        df.clone()
    };

    let temp = temp_path(path);
    if let Err(err) = write_csv(&mut out, &temp) {
        let _ = fs::remove_file(&temp);
        return Err(err);
    }
    Ok(temp)
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            debug!(path = %path.display(), error = %err, "could not remove export");
        }
    }
}

fn write_csv(df: &mut DataFrame, temp: &Path) -> Result<()> {
    let mut file = File::create(temp).map_err(|e| ExportError::unwritable("create", temp, e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| ExportError::unwritable("write", temp, std::io::Error::other(e)))?;
    file.sync_all()
        .map_err(|e| ExportError::unwritable("sync", temp, e))?;
    debug!(path = %temp.display(), "wrote temporary export");
    Ok(())
}
