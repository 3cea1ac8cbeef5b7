//! Cohort label annotation.
//!
//! Appends `Dataset`, `Sex`, `Site` and `Class` to an instrument table by a
//! left join on the subject ID (or on ID and session). Rows without a label
//! keep missing values; no row is ever added or dropped.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use imagen_common::has_column;
use imagen_model::{CohortLabel, LabelJoinKey, RecordKey, Session, SubjectId};
use polars::prelude::*;
use tracing::{info, warn};

use crate::error::{Result, TransformError};
use crate::frame::record_keys;

/// Columns appended by [`annotate`], in order.
pub const ANNOTATION_COLUMNS: [&str; 4] = ["Dataset", "Sex", "Site", "Class"];

/// Result of annotating one table.
#[derive(Debug, Clone)]
pub struct AnnotationOutcome {
    pub table: DataFrame,
    /// Rows that found a label.
    pub matched: usize,
    /// Rows left with missing labels.
    pub unmatched: usize,
    /// Join keys whose label rows disagree on Sex, Site or Class; the first
    /// label row is used.
    pub conflicting_keys: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum JoinKey {
    Id(SubjectId),
    IdSession(SubjectId, Session),
}

impl JoinKey {
    fn for_record(join: LabelJoinKey, id: SubjectId, session: Session) -> Self {
        match join {
            LabelJoinKey::Id => JoinKey::Id(id),
            LabelJoinKey::IdSession => JoinKey::IdSession(id, session),
        }
    }

    fn for_row(join: LabelJoinKey, key: &RecordKey) -> Self {
        Self::for_record(join, key.id, key.session)
    }
}

fn same_cohort(a: &CohortLabel, b: &CohortLabel) -> bool {
    a.sex == b.sex && a.site == b.site && a.class == b.class
}

/// Left-joins cohort labels onto `table`.
pub fn annotate(
    table: &DataFrame,
    labels: &[CohortLabel],
    join: LabelJoinKey,
) -> Result<AnnotationOutcome> {
    for column in ANNOTATION_COLUMNS {
        if has_column(table, column) {
            return Err(TransformError::ColumnConflict {
                column: column.to_string(),
            });
        }
    }

    let mut lookup: HashMap<JoinKey, &CohortLabel> = HashMap::with_capacity(labels.len());
    let mut conflicting: Vec<JoinKey> = Vec::new();
    for label in labels {
        let key = JoinKey::for_record(join, label.id, label.session);
        match lookup.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(label);
            }
            Entry::Occupied(slot) => {
                if !same_cohort(slot.get(), label) && !conflicting.contains(&key) {
                    conflicting.push(key);
                }
            }
        }
    }
    if !conflicting.is_empty() {
        warn!(
            keys = conflicting.len(),
            "label rows disagree on Sex/Site/Class; first row used"
        );
    }

    let keys = record_keys(table)?;
    let height = keys.len();
    let mut datasets: Vec<Option<&str>> = Vec::with_capacity(height);
    let mut sexes: Vec<Option<&str>> = Vec::with_capacity(height);
    let mut sites: Vec<Option<&str>> = Vec::with_capacity(height);
    let mut classes: Vec<Option<&str>> = Vec::with_capacity(height);
    let mut matched = 0;

    for key in &keys {
        let label = lookup.get(&JoinKey::for_row(join, key));
        if label.is_some() {
            matched += 1;
        }
        datasets.push(label.map(|l| l.dataset.as_str()));
        sexes.push(label.map(|l| l.sex.as_str()));
        sites.push(label.map(|l| l.site.as_str()));
        classes.push(label.map(|l| l.class.as_str()));
    }

    let mut annotated = table.clone();
    let [dataset_name, sex_name, site_name, class_name] = ANNOTATION_COLUMNS;
    annotated.with_column(Column::new(dataset_name.into(), datasets))?;
    annotated.with_column(Column::new(sex_name.into(), sexes))?;
    annotated.with_column(Column::new(site_name.into(), sites))?;
    annotated.with_column(Column::new(class_name.into(), classes))?;

    info!(
        rows = height,
        matched,
        unmatched = height - matched,
        "annotated table with cohort labels"
    );

    Ok(AnnotationOutcome {
        table: annotated,
        matched,
        unmatched: height - matched,
        conflicting_keys: conflicting.len(),
    })
}

/// Keeps only labels recorded at `session`.
pub fn labels_for_session(labels: &[CohortLabel], session: Session) -> Vec<CohortLabel> {
    labels
        .iter()
        .filter(|label| label.session == session)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagen_model::{CohortClass, DatasetSplit, ID_COLUMN, SESSION_COLUMN, Sex, Site};

    fn label(id: i64, session: Session, site: Site, class: CohortClass) -> CohortLabel {
        CohortLabel {
            id: SubjectId(id),
            session,
            target: "Binge".to_string(),
            dataset: DatasetSplit::Training,
            sex: Sex::Male,
            site,
            class,
        }
    }

    fn table() -> DataFrame {
        DataFrame::new(vec![
            Column::new(ID_COLUMN.into(), vec![1i64, 1, 2, 3]),
            Column::new(SESSION_COLUMN.into(), vec!["BL", "FU1", "BL", "BL"]),
            Column::new("Score".into(), vec![Some(1.0), Some(2.0), None, Some(4.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn id_join_applies_across_sessions() {
        let labels = vec![
            label(1, Session::FollowUp3, Site::Paris, CohortClass::HealthyControl),
            label(2, Session::FollowUp3, Site::Berlin, CohortClass::AlcoholMisuse),
        ];
        let outcome = annotate(&table(), &labels, LabelJoinKey::Id).unwrap();

        assert_eq!(outcome.table.height(), 4);
        assert_eq!(outcome.matched, 3);
        assert_eq!(outcome.unmatched, 1);
        let sites = outcome.table.column("Site").unwrap().str().unwrap().clone();
        assert_eq!(sites.get(0), Some("Paris"));
        assert_eq!(sites.get(1), Some("Paris"));
        assert_eq!(sites.get(2), Some("Berlin"));
        assert_eq!(sites.get(3), None);
        let classes = outcome.table.column("Class").unwrap().str().unwrap().clone();
        assert_eq!(classes.get(2), Some("AAM"));
        assert_eq!(classes.get(3), None);
    }

    #[test]
    fn session_join_matches_exact_session() {
        let labels = vec![label(1, Session::FollowUp1, Site::Dublin, CohortClass::HealthyControl)];
        let outcome = annotate(&table(), &labels, LabelJoinKey::IdSession).unwrap();
        assert_eq!(outcome.matched, 1);
        let sites = outcome.table.column("Site").unwrap().str().unwrap().clone();
        assert_eq!(sites.get(0), None);
        assert_eq!(sites.get(1), Some("Dublin"));
    }

    #[test]
    fn first_label_wins_and_conflicts_are_counted() {
        let labels = vec![
            label(1, Session::FollowUp3, Site::Paris, CohortClass::HealthyControl),
            label(1, Session::Baseline, Site::London, CohortClass::HealthyControl),
            label(2, Session::FollowUp3, Site::Berlin, CohortClass::AlcoholMisuse),
            label(2, Session::Baseline, Site::Berlin, CohortClass::AlcoholMisuse),
        ];
        let outcome = annotate(&table(), &labels, LabelJoinKey::Id).unwrap();
        assert_eq!(outcome.conflicting_keys, 1);
        let sites = outcome.table.column("Site").unwrap().str().unwrap().clone();
        assert_eq!(sites.get(0), Some("Paris"));
    }

    #[test]
    fn existing_label_columns_conflict() {
        let mut df = table();
        df.with_column(Column::new("Sex".into(), vec!["Male"; 4]))
            .unwrap();
        let err = annotate(&df, &[], LabelJoinKey::Id).unwrap_err();
        assert_eq!(err.kind(), "ColumnConflict");
    }

    #[test]
    fn session_filter() {
        let labels = vec![
            label(1, Session::FollowUp3, Site::Paris, CohortClass::HealthyControl),
            label(2, Session::Baseline, Site::Paris, CohortClass::HealthyControl),
        ];
        let filtered = labels_for_session(&labels, Session::Baseline);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, SubjectId(2));
    }
}
