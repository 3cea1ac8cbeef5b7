//! Data directory layout.
//!
//! Directory conventions under the data root are fixed; only the root and
//! the raw-data release are configurable.

use std::path::{Path, PathBuf};

use imagen_model::{LabelSource, Session, SessionSource};

/// Environment variable for overriding the data root.
pub const DATA_ROOT_ENV_VAR: &str = "IMAGEN_DATA_DIR";

/// Data root used when nothing else is configured.
pub const DEFAULT_DATA_ROOT: &str = "/ritter/share/data/IMAGEN";

/// Raw-data release read by default.
pub const DEFAULT_RELEASE: &str = "2.7";

/// Get the data root directory.
///
/// Resolution order:
/// 1. `IMAGEN_DATA_DIR` environment variable
/// 2. `/ritter/share/data/IMAGEN`
pub fn data_root() -> PathBuf {
    match std::env::var(DATA_ROOT_ENV_VAR) {
        Ok(root) if !root.trim().is_empty() => PathBuf::from(root),
        _ => PathBuf::from(DEFAULT_DATA_ROOT),
    }
}

/// Resolves every path the pipeline reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
    release: String,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>, release: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            release: release.into(),
        }
    }

    /// Layout rooted at [`data_root`] with the default release.
    pub fn from_env() -> Self {
        Self::new(data_root(), DEFAULT_RELEASE)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    /// `<root>/IMAGEN_RAW/<release>/<folder>/psytools/<file>`
    pub fn raw_file(&self, source: &SessionSource) -> PathBuf {
        self.root
            .join("IMAGEN_RAW")
            .join(&self.release)
            .join(&source.folder)
            .join("psytools")
            .join(&source.file)
    }

    /// `<root>/h5files/<file>`
    pub fn label_file(&self, source: &LabelSource) -> PathBuf {
        self.root.join("h5files").join(&source.file)
    }

    /// Directory holding every exported table.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("Instrument")
    }

    /// `<root>/Instrument/<name>.csv`
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.output_dir().join(format!("{name}.csv"))
    }

    /// `<root>/Instrument/<labels>_<session|ALL>_<instrument>.csv`
    pub fn annotated_path(
        &self,
        label_set: &str,
        session: Option<Session>,
        instrument: &str,
    ) -> PathBuf {
        let scope = session.map_or("ALL", |s| s.code());
        self.output_dir()
            .join(format!("{label_set}_{scope}_{instrument}.csv"))
    }
}
