//! Instrument schema types.
//!
//! An [`InstrumentSchema`] is pure configuration: where each session's raw
//! file lives, which ROI columns to keep or derive, and which known-bad
//! records to drop after merging. The loader interprets it without any
//! instrument-specific code path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cohort::DatasetSplit;
use crate::session::Session;
use crate::subject::SubjectId;

/// How a verbatim ROI column is typed in the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    Number,
    Text,
}

/// Row-wise aggregation of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
}

impl Aggregation {
    /// Aggregates a complete item group. Callers only pass rows without
    /// missing items.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        match self {
            Aggregation::Sum => Some(sum),
            Aggregation::Mean => Some(sum / values.len() as f64),
        }
    }
}

/// What a recode does with a code that has no label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unmapped {
    #[default]
    Missing,
    /// Pass the canonical raw token through unchanged.
    Keep,
}

/// Join key used when cohort labels are attached to an instrument table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelJoinKey {
    #[default]
    Id,
    IdSession,
}

/// A named mapping from raw code tokens to labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codelist {
    pub name: String,
    pub codes: BTreeMap<String, String>,
}

impl Codelist {
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.codes.get(token).map(String::as_str)
    }
}

/// Sum or mean over a fixed group of item columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub label: String,
    pub items: Vec<String>,
    pub aggregate: Aggregation,
}

/// Maps raw codes of one column to labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalRecode {
    pub source: String,
    pub label: String,
    pub codelist: Codelist,
    pub unmapped: Unmapped,
}

/// One numeric band of a [`BandedRecode`].
///
/// `min` and `max` are inclusive bounds, `below` is an exclusive upper bound.
/// A band without bounds matches every number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub label: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub below: Option<f64>,
}

impl Band {
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min)
            && self.max.is_none_or(|max| value <= max)
            && self.below.is_none_or(|below| value < below)
    }
}

/// Maps a numeric score to the label of the first band containing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandedRecode {
    pub source: String,
    pub label: String,
    pub bands: Vec<Band>,
}

impl BandedRecode {
    pub fn classify(&self, value: f64) -> Option<&str> {
        self.bands
            .iter()
            .find(|band| band.contains(value))
            .map(|band| band.label.as_str())
    }
}

/// Recodes several columns and joins the labels present into one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatRecode {
    pub label: String,
    pub sources: Vec<String>,
    pub codelist: Codelist,
    pub separator: String,
}

/// One output ROI column of an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoiColumn {
    Copy {
        source: String,
        label: String,
        value: ValueType,
    },
    Composite(CompositeScore),
    Recode(CategoricalRecode),
    Band(BandedRecode),
    Concat(ConcatRecode),
}

impl RoiColumn {
    /// Output column name.
    pub fn label(&self) -> &str {
        match self {
            RoiColumn::Copy { label, .. } => label,
            RoiColumn::Composite(c) => &c.label,
            RoiColumn::Recode(r) => &r.label,
            RoiColumn::Band(b) => &b.label,
            RoiColumn::Concat(c) => &c.label,
        }
    }

    /// Raw columns this definition reads.
    pub fn source_columns(&self) -> Vec<&str> {
        match self {
            RoiColumn::Copy { source, .. } => vec![source.as_str()],
            RoiColumn::Composite(c) => c.items.iter().map(String::as_str).collect(),
            RoiColumn::Recode(r) => vec![r.source.as_str()],
            RoiColumn::Band(b) => vec![b.source.as_str()],
            RoiColumn::Concat(c) => c.sources.iter().map(String::as_str).collect(),
        }
    }

    pub fn output_type(&self) -> ValueType {
        match self {
            RoiColumn::Copy { value, .. } => *value,
            RoiColumn::Composite(_) => ValueType::Number,
            RoiColumn::Recode(_) | RoiColumn::Band(_) | RoiColumn::Concat(_) => ValueType::Text,
        }
    }
}

/// Where one session's raw export lives, relative to the release directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSource {
    pub session: Session,
    /// Session folder under the release; may name another session when a
    /// file is reused.
    pub folder: String,
    pub file: String,
}

/// The (ID, Session) key of a long-format row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub id: SubjectId,
    pub session: Session,
}

impl RecordKey {
    pub fn new(id: impl Into<SubjectId>, session: Session) -> Self {
        Self {
            id: id.into(),
            session,
        }
    }
}

/// Declarative definition of one questionnaire instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSchema {
    pub name: String,
    pub description: Option<String>,
    pub sources: Vec<SessionSource>,
    pub columns: Vec<RoiColumn>,
    /// Known-bad records dropped after merging.
    pub exclusions: Vec<RecordKey>,
    /// Sessions whose identifier column already holds the integer ID.
    pub plain_id_sessions: Vec<Session>,
    pub label_join: LabelJoinKey,
}

impl InstrumentSchema {
    /// Output ROI labels in declared order.
    pub fn output_labels(&self) -> Vec<&str> {
        self.columns.iter().map(RoiColumn::label).collect()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.sources.iter().map(|source| source.session).collect()
    }

    pub fn source_for(&self, session: Session) -> Option<&SessionSource> {
        self.sources.iter().find(|source| source.session == session)
    }

    /// Raw columns the loader needs, deduplicated, in first-use order.
    pub fn required_source_columns(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for column in &self.columns {
            for source in column.source_columns() {
                if !seen.contains(&source) {
                    seen.push(source);
                }
            }
        }
        seen
    }

    pub fn is_plain_id_session(&self, session: Session) -> bool {
        self.plain_id_sessions.contains(&session)
    }

    pub fn is_excluded(&self, key: &RecordKey) -> bool {
        self.exclusions.contains(key)
    }

    pub fn composites(&self) -> impl Iterator<Item = &CompositeScore> {
        self.columns.iter().filter_map(|column| match column {
            RoiColumn::Composite(c) => Some(c),
            _ => None,
        })
    }

    pub fn recodes(&self) -> impl Iterator<Item = &CategoricalRecode> {
        self.columns.iter().filter_map(|column| match column {
            RoiColumn::Recode(r) => Some(r),
            _ => None,
        })
    }
}

/// One labelled-dataset file of a label set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSource {
    pub session: Session,
    pub dataset: DatasetSplit,
    pub file: String,
}

/// A named group of labelled-dataset files (for example the binge target
/// across sessions and splits).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSetSchema {
    pub name: String,
    /// Dataset holding the binary target; the first dataset of each file
    /// when unset.
    pub target: Option<String>,
    pub sources: Vec<LabelSource>,
}

impl LabelSetSchema {
    pub fn sessions(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sources.iter().map(|s| s.session).collect();
        sessions.sort();
        sessions.dedup();
        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ftnd_bands() -> BandedRecode {
        BandedRecode {
            source: "ftnd_sum".to_string(),
            label: "Likelihood of nicotine dependence child".to_string(),
            bands: vec![
                Band {
                    label: "highly dependent".to_string(),
                    min: Some(7.0),
                    max: Some(10.0),
                    below: None,
                },
                Band {
                    label: "moderately dependent".to_string(),
                    min: Some(4.0),
                    max: Some(6.0),
                    below: None,
                },
                Band {
                    label: "less dependent".to_string(),
                    min: None,
                    max: None,
                    below: Some(4.0),
                },
            ],
        }
    }

    #[test]
    fn bands_pick_first_match() {
        let bands = ftnd_bands();
        assert_eq!(bands.classify(10.0), Some("highly dependent"));
        assert_eq!(bands.classify(4.0), Some("moderately dependent"));
        assert_eq!(bands.classify(3.0), Some("less dependent"));
        assert_eq!(bands.classify(6.5), None);
        assert_eq!(bands.classify(11.0), None);
    }

    #[test]
    fn aggregation_sum_and_mean() {
        assert_eq!(Aggregation::Sum.apply(&[1.0, 2.0, 3.0]), Some(6.0));
        assert_eq!(Aggregation::Mean.apply(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(Aggregation::Mean.apply(&[]), None);
    }

    #[test]
    fn required_columns_are_deduplicated() {
        let schema = InstrumentSchema {
            name: "X".to_string(),
            description: None,
            sources: vec![SessionSource {
                session: Session::Baseline,
                folder: "BL".to_string(),
                file: "x.csv".to_string(),
            }],
            columns: vec![
                RoiColumn::Copy {
                    source: "a".to_string(),
                    label: "A".to_string(),
                    value: ValueType::Number,
                },
                RoiColumn::Composite(CompositeScore {
                    label: "Sum".to_string(),
                    items: vec!["a".to_string(), "b".to_string()],
                    aggregate: Aggregation::Sum,
                }),
            ],
            exclusions: vec![RecordKey::new(5, Session::Baseline)],
            plain_id_sessions: Vec::new(),
            label_join: LabelJoinKey::Id,
        };

        assert_eq!(schema.required_source_columns(), vec!["a", "b"]);
        assert_eq!(schema.output_labels(), vec!["A", "Sum"]);
        assert!(schema.is_excluded(&RecordKey::new(5, Session::Baseline)));
        assert!(!schema.is_excluded(&RecordKey::new(5, Session::FollowUp1)));
        assert_eq!(schema.composites().count(), 1);
        assert_eq!(schema.recodes().count(), 0);
    }
}
