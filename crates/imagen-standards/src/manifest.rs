#![deny(unsafe_code)]

//! Serde shape of `instruments.toml`.
//!
//! Entries reference codelists by name; [`crate::registry`] resolves them
//! into [`imagen_model::InstrumentSchema`] values.

use std::collections::BTreeMap;

use imagen_model::{Aggregation, Band, LabelJoinKey, LabelSource, Session, Unmapped, ValueType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryDocument {
    #[serde(default)]
    pub codelists: BTreeMap<String, CodelistEntry>,
    #[serde(default)]
    pub instruments: BTreeMap<String, InstrumentEntry>,
    #[serde(default)]
    pub label_sets: BTreeMap<String, LabelSetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodelistEntry {
    #[serde(default)]
    pub description: Option<String>,
    pub codes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentEntry {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub plain_id_sessions: Vec<Session>,
    #[serde(default)]
    pub label_join: LabelJoinKey,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
    #[serde(default)]
    pub columns: Vec<ColumnEntry>,
    #[serde(default)]
    pub exclude: Vec<ExclusionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    pub session: Session,
    /// Defaults to the session code.
    #[serde(default)]
    pub folder: Option<String>,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnEntry {
    Copy {
        source: String,
        /// Defaults to the source column name.
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        value: ValueType,
    },
    Composite {
        label: String,
        items: Vec<String>,
        aggregate: Aggregation,
    },
    Recode {
        source: String,
        #[serde(default)]
        label: Option<String>,
        codelist: String,
        #[serde(default)]
        unmapped: Unmapped,
    },
    Band {
        source: String,
        label: String,
        bands: Vec<Band>,
    },
    Concat {
        label: String,
        sources: Vec<String>,
        codelist: String,
        #[serde(default = "default_separator")]
        separator: String,
    },
}

fn default_separator() -> String {
    ",".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExclusionEntry {
    pub id: i64,
    pub session: Session,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelSetEntry {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    pub sources: Vec<LabelSource>,
}
