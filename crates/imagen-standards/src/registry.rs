#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use imagen_model::{
    BandedRecode, CategoricalRecode, Codelist, CompositeScore, ConcatRecode, ID_COLUMN,
    InstrumentSchema, LabelSetSchema, RecordKey, RoiColumn, SESSION_COLUMN, SessionSource,
};
use tracing::debug;

use crate::error::StandardsError;
use crate::manifest::{ColumnEntry, InstrumentEntry, LabelSetEntry, RegistryDocument};

/// The instrument catalogue compiled into the crate.
pub const BUILTIN_REGISTRY: &str = include_str!("../data/instruments.toml");

const BUILTIN_ORIGIN: &str = "<builtin>/instruments.toml";

/// Enumerated instrument and label-set definitions.
#[derive(Debug, Clone)]
pub struct InstrumentRegistry {
    codelists: BTreeMap<String, Codelist>,
    instruments: BTreeMap<String, InstrumentSchema>,
    label_sets: BTreeMap<String, LabelSetSchema>,
}

/// Load the built-in catalogue.
pub fn load_default_registry() -> Result<InstrumentRegistry, StandardsError> {
    InstrumentRegistry::from_toml_str(BUILTIN_REGISTRY, Path::new(BUILTIN_ORIGIN))
}

impl InstrumentRegistry {
    /// Load a catalogue from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, StandardsError> {
        let contents = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
        Self::from_toml_str(&contents, path)
    }

    /// Parse and validate a catalogue. `origin` only labels parse errors.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, StandardsError> {
        let document: RegistryDocument =
            toml::from_str(contents).map_err(|e| StandardsError::Toml {
                path: origin.to_path_buf(),
                source: e,
            })?;
        let registry = Self::from_document(document)?;
        debug!(
            origin = %origin.display(),
            instruments = registry.instruments.len(),
            label_sets = registry.label_sets.len(),
            codelists = registry.codelists.len(),
            "loaded instrument registry"
        );
        Ok(registry)
    }

    pub fn from_document(document: RegistryDocument) -> Result<Self, StandardsError> {
        let codelists: BTreeMap<String, Codelist> = document
            .codelists
            .into_iter()
            .map(|(name, entry)| {
                let codelist = Codelist {
                    name: name.clone(),
                    codes: entry.codes,
                };
                (name, codelist)
            })
            .collect();

        let mut instruments = BTreeMap::new();
        for (name, entry) in document.instruments {
            let schema = resolve_instrument(&name, entry, &codelists)?;
            instruments.insert(name, schema);
        }

        let mut label_sets = BTreeMap::new();
        for (name, entry) in document.label_sets {
            let schema = resolve_label_set(&name, entry)?;
            label_sets.insert(name, schema);
        }

        Ok(Self {
            codelists,
            instruments,
            label_sets,
        })
    }

    /// Look up an instrument by name (case-insensitive).
    pub fn schema_for(&self, name: &str) -> Result<&InstrumentSchema, StandardsError> {
        lookup(&self.instruments, name).ok_or_else(|| StandardsError::UnknownInstrument {
            name: name.to_string(),
            known: self.instrument_names().join(", "),
        })
    }

    /// Look up a label set by name (case-insensitive).
    pub fn label_set(&self, name: &str) -> Result<&LabelSetSchema, StandardsError> {
        lookup(&self.label_sets, name).ok_or_else(|| StandardsError::UnknownLabelSet {
            name: name.to_string(),
            known: self.label_set_names().join(", "),
        })
    }

    pub fn instrument_names(&self) -> Vec<&str> {
        self.instruments.keys().map(String::as_str).collect()
    }

    pub fn label_set_names(&self) -> Vec<&str> {
        self.label_sets.keys().map(String::as_str).collect()
    }

    pub fn instruments(&self) -> impl Iterator<Item = &InstrumentSchema> {
        self.instruments.values()
    }
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, name: &str) -> Option<&'a T> {
    let trimmed = name.trim();
    map.get(trimmed).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(trimmed))
            .map(|(_, value)| value)
    })
}

fn resolve_instrument(
    name: &str,
    entry: InstrumentEntry,
    codelists: &BTreeMap<String, Codelist>,
) -> Result<InstrumentSchema, StandardsError> {
    if entry.sources.is_empty() {
        return Err(StandardsError::invalid(format!(
            "instrument {name} declares no sources"
        )));
    }
    if entry.columns.is_empty() {
        return Err(StandardsError::invalid(format!(
            "instrument {name} declares no columns"
        )));
    }

    let mut sessions = BTreeSet::new();
    let mut sources = Vec::with_capacity(entry.sources.len());
    for source in entry.sources {
        if !sessions.insert(source.session) {
            return Err(StandardsError::invalid(format!(
                "instrument {name} declares session {} twice",
                source.session
            )));
        }
        sources.push(SessionSource {
            session: source.session,
            folder: source
                .folder
                .unwrap_or_else(|| source.session.code().to_string()),
            file: source.file,
        });
    }

    let mut columns = Vec::with_capacity(entry.columns.len());
    let mut labels = BTreeSet::new();
    for column in entry.columns {
        let column = resolve_column(name, column, codelists)?;
        let label = column.label().to_string();
        if label.trim().is_empty() {
            return Err(StandardsError::invalid(format!(
                "instrument {name} has a column with an empty label"
            )));
        }
        if label == ID_COLUMN || label == SESSION_COLUMN {
            return Err(StandardsError::invalid(format!(
                "instrument {name} uses reserved column label {label}"
            )));
        }
        if !labels.insert(label.clone()) {
            return Err(StandardsError::invalid(format!(
                "instrument {name} declares column label {label} twice"
            )));
        }
        columns.push(column);
    }

    let mut exclusions = Vec::with_capacity(entry.exclude.len());
    for exclusion in entry.exclude {
        if !sessions.contains(&exclusion.session) {
            return Err(StandardsError::invalid(format!(
                "instrument {name} excludes ID {} in undeclared session {}",
                exclusion.id, exclusion.session
            )));
        }
        exclusions.push(RecordKey::new(exclusion.id, exclusion.session));
    }

    for session in &entry.plain_id_sessions {
        if !sessions.contains(session) {
            return Err(StandardsError::invalid(format!(
                "instrument {name} marks undeclared session {session} as plain-ID"
            )));
        }
    }

    Ok(InstrumentSchema {
        name: name.to_string(),
        description: entry.description,
        sources,
        columns,
        exclusions,
        plain_id_sessions: entry.plain_id_sessions,
        label_join: entry.label_join,
    })
}

fn resolve_column(
    instrument: &str,
    column: ColumnEntry,
    codelists: &BTreeMap<String, Codelist>,
) -> Result<RoiColumn, StandardsError> {
    let codelist = |codelist: &str| {
        codelists.get(codelist).cloned().ok_or_else(|| {
            StandardsError::invalid(format!(
                "instrument {instrument} references unknown codelist {codelist}"
            ))
        })
    };

    let column = match column {
        ColumnEntry::Copy {
            source,
            label,
            value,
        } => RoiColumn::Copy {
            label: label.unwrap_or_else(|| source.clone()),
            source,
            value,
        },
        ColumnEntry::Composite {
            label,
            items,
            aggregate,
        } => {
            if items.is_empty() {
                return Err(StandardsError::invalid(format!(
                    "composite {label} of instrument {instrument} has no items"
                )));
            }
            RoiColumn::Composite(CompositeScore {
                label,
                items,
                aggregate,
            })
        }
        ColumnEntry::Recode {
            source,
            label,
            codelist: name,
            unmapped,
        } => RoiColumn::Recode(CategoricalRecode {
            label: label.unwrap_or_else(|| source.clone()),
            source,
            codelist: codelist(&name)?,
            unmapped,
        }),
        ColumnEntry::Band {
            source,
            label,
            bands,
        } => {
            if bands.is_empty() {
                return Err(StandardsError::invalid(format!(
                    "band column {label} of instrument {instrument} has no bands"
                )));
            }
            RoiColumn::Band(BandedRecode {
                source,
                label,
                bands,
            })
        }
        ColumnEntry::Concat {
            label,
            sources,
            codelist: name,
            separator,
        } => {
            if sources.is_empty() {
                return Err(StandardsError::invalid(format!(
                    "concat column {label} of instrument {instrument} has no sources"
                )));
            }
            RoiColumn::Concat(ConcatRecode {
                label,
                sources,
                codelist: codelist(&name)?,
                separator,
            })
        }
    };
    Ok(column)
}

fn resolve_label_set(name: &str, entry: LabelSetEntry) -> Result<LabelSetSchema, StandardsError> {
    if entry.sources.is_empty() {
        return Err(StandardsError::invalid(format!(
            "label set {name} declares no sources"
        )));
    }
    let mut seen = BTreeSet::new();
    for source in &entry.sources {
        if !seen.insert((source.session, source.dataset.as_str())) {
            return Err(StandardsError::invalid(format!(
                "label set {name} declares {} {} twice",
                source.session, source.dataset
            )));
        }
    }
    Ok(LabelSetSchema {
        name: name.to_string(),
        target: entry.target,
        sources: entry.sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<InstrumentRegistry, StandardsError> {
        InstrumentRegistry::from_toml_str(contents, Path::new("test.toml"))
    }

    #[test]
    fn folder_defaults_to_session_code() {
        let registry = parse(
            r#"
            [instruments.X]
            sources = [{ session = "FU1", file = "x.csv" }]
            columns = [{ kind = "copy", source = "a" }]
            "#,
        )
        .unwrap();
        let schema = registry.schema_for("x").unwrap();
        assert_eq!(schema.sources[0].folder, "FU1");
        assert_eq!(schema.output_labels(), vec!["a"]);
    }

    #[test]
    fn rejects_reserved_label() {
        let err = parse(
            r#"
            [instruments.X]
            sources = [{ session = "BL", file = "x.csv" }]
            columns = [{ kind = "copy", source = "a", label = "Session" }]
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "InvalidRegistry");
    }

    #[test]
    fn rejects_unknown_codelist() {
        let err = parse(
            r#"
            [instruments.X]
            sources = [{ session = "BL", file = "x.csv" }]
            columns = [{ kind = "recode", source = "a", codelist = "nope" }]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn rejects_exclusion_outside_declared_sessions() {
        let err = parse(
            r#"
            [instruments.X]
            sources = [{ session = "BL", file = "x.csv" }]
            columns = [{ kind = "copy", source = "a" }]
            exclude = [{ id = 1, session = "FU1" }]
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "InvalidRegistry");
    }

    #[test]
    fn rejects_duplicate_session() {
        let err = parse(
            r#"
            [instruments.X]
            sources = [
                { session = "BL", file = "x.csv" },
                { session = "BL", file = "y.csv" },
            ]
            columns = [{ kind = "copy", source = "a" }]
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "InvalidRegistry");
    }

    #[test]
    fn toml_errors_carry_origin() {
        let err = parse("[instruments.X\n").unwrap_err();
        assert!(matches!(err, StandardsError::Toml { .. }));
        assert!(err.to_string().contains("test.toml"));
    }
}
