//! Raw array access to labelled-dataset stores.

use std::path::Path;

use crate::error::Result;
#[cfg(feature = "hdf5")]
use crate::error::IngestError;

/// The raw per-record arrays of one labelled-dataset file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelArrays {
    /// Name of the dataset holding the binary target.
    pub target_name: String,
    pub target: Vec<i64>,
    /// Subject IDs (the `i` dataset).
    pub ids: Vec<i64>,
    pub sex: Vec<i64>,
    pub site: Vec<i64>,
}

impl LabelArrays {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Reads the target, `i`, `sex` and `site` datasets of an HDF5 store.
///
/// Without an explicit `target`, the first dataset of the file holds the
/// binary target.
#[cfg(feature = "hdf5")]
pub fn read_label_arrays(path: &Path, target: Option<&str>) -> Result<LabelArrays> {
    if !path.is_file() {
        return Err(IngestError::SourceFileMissing {
            path: path.to_path_buf(),
        });
    }
    let file =
        ::hdf5::File::open(path).map_err(|e| IngestError::label_store(path, e.to_string()))?;

    let target_name = match target {
        Some(name) => name.to_string(),
        None => file
            .member_names()
            .map_err(|e| IngestError::label_store(path, e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::label_store(path, "store holds no datasets"))?,
    };

    let read = |name: &str| -> Result<Vec<i64>> {
        let dataset = file
            .dataset(name)
            .map_err(|e| IngestError::label_store(path, format!("dataset '{name}': {e}")))?;
        let raw = dataset
            .read_raw::<f64>()
            .map_err(|e| IngestError::label_store(path, format!("dataset '{name}': {e}")))?;
        raw.into_iter()
            .map(|value| {
                if value.is_finite() && value.fract() == 0.0 {
                    Ok(value as i64)
                } else {
                    Err(IngestError::label_store(
                        path,
                        format!("dataset '{name}' holds non-integral value {value}"),
                    ))
                }
            })
            .collect()
    };

    Ok(LabelArrays {
        target: read(&target_name)?,
        ids: read("i")?,
        sex: read("sex")?,
        site: read("site")?,
        target_name,
    })
}

/// Always fails: HDF5 support was not compiled in.
#[cfg(not(feature = "hdf5"))]
pub fn read_label_arrays(path: &Path, _target: Option<&str>) -> Result<LabelArrays> {
    Err(crate::error::IngestError::LabelStoreUnsupported {
        path: path.to_path_buf(),
    })
}
