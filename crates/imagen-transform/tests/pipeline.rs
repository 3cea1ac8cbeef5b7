//! End-to-end tests of load, merge and annotate over the built-in catalogue.

use std::fs;
use std::path::Path;

use imagen_model::{
    CohortClass, CohortLabel, DatasetSplit, ID_COLUMN, LabelJoinKey, SESSION_COLUMN, Session, Sex,
    Site, SubjectId,
};
use imagen_standards::{DataLayout, load_default_registry};
use imagen_transform::{
    DuplicateRecord, TransformError, annotate, empty_instrument_frame, expected_columns,
    instrument_dtypes, load_instrument, load_session, merge_sessions, record_keys,
};

fn write_raw(root: &Path, folder: &str, file: &str, contents: &str) {
    let dir = root.join("IMAGEN_RAW").join("2.7").join(folder).join("psytools");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), contents).unwrap();
}

const CTQ_FILE: &str = "IMAGEN-IMGN_CTQ_CHILD_FU2-IMAGEN_DIGEST.csv";

fn ctq_csv() -> String {
    let header: Vec<String> = (1..=28).map(|i| format!("CTQ_{i}")).collect();
    let full: Vec<&str> = vec!["1"; 28];
    // CTQ_3 belongs to the emotional abuse group.
    let mut gap = full.clone();
    gap[2] = "";
    format!(
        "User code,{}\n000071766352-I1,{}\n000058060181-I1,{}\n",
        header.join(","),
        full.join(","),
        gap.join(",")
    )
}

fn float_column(df: &polars::prelude::DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

#[test]
fn ctq_reuses_one_file_for_every_session() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(dir.path(), "FU2", CTQ_FILE, &ctq_csv());
    let layout = DataLayout::new(dir.path(), "2.7");
    let registry = load_default_registry().unwrap();
    let schema = registry.schema_for("CTQ").unwrap();

    let sessions = load_instrument(schema, &layout).unwrap();
    assert_eq!(sessions.len(), 4);
    let outcome = merge_sessions(schema, &sessions).unwrap();
    let df = &outcome.table.data;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, expected_columns(schema));
    assert_eq!(names[0], ID_COLUMN);
    assert_eq!(names[1], SESSION_COLUMN);
    assert_eq!(names[2], "Emotional abuse sum");

    assert_eq!(df.height(), 8);
    let keys = record_keys(df).unwrap();
    for id in [71766352, 58060181] {
        let mut sessions: Vec<Session> = keys
            .iter()
            .filter(|key| key.id == SubjectId(id))
            .map(|key| key.session)
            .collect();
        sessions.sort();
        assert_eq!(sessions, Session::ALL.to_vec());
    }
    assert!(outcome.duplicates.is_empty());
    assert_eq!(outcome.excluded, 0);
}

#[test]
fn declared_types_follow_column_order() {
    let registry = load_default_registry().unwrap();
    let pbq = registry.schema_for("PBQ").unwrap();

    let types = instrument_dtypes(pbq);
    let names: Vec<String> = types.iter().map(|(name, _)| name.clone()).collect();
    assert_eq!(names, expected_columns(pbq));
    assert_eq!(types[0].1, polars::prelude::DataType::Int64);
    assert_eq!(types[1].1, polars::prelude::DataType::String);

    let empty = empty_instrument_frame(pbq).unwrap();
    assert_eq!(empty.height(), 0);
    for (name, dtype) in &types {
        assert_eq!(empty.column(name).unwrap().dtype(), dtype, "{name}");
    }
}

#[test]
fn composite_with_one_missing_item_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(dir.path(), "FU2", CTQ_FILE, &ctq_csv());
    let layout = DataLayout::new(dir.path(), "2.7");
    let registry = load_default_registry().unwrap();
    let schema = registry.schema_for("CTQ").unwrap();

    let table = load_session(schema, Session::FollowUp2, &layout).unwrap();
    assert_eq!(
        float_column(&table.data, "Emotional abuse sum"),
        vec![Some(5.0), None]
    );
    assert_eq!(
        float_column(&table.data, "Physical abuse sum"),
        vec![Some(5.0), Some(5.0)]
    );
    assert_eq!(
        float_column(&table.data, "Denial sum"),
        vec![Some(3.0), Some(3.0)]
    );
}

const PBQ_COLUMNS: [&str; 15] = [
    "pbq_03", "pbq_03a", "pbq_03b", "pbq_03c", "pbq_05", "pbq_05a", "pbq_05b", "pbq_05c",
    "pbq_06", "pbq_06a", "pbq_12", "pbq_13", "pbq_13a", "pbq_13b", "pbq_13g",
];

fn pbq_csv(rows: &[(&str, &str)]) -> String {
    let mut out = format!("User code,{}\n", PBQ_COLUMNS.join(","));
    for (code, first) in rows {
        let mut cells = vec!["0"; PBQ_COLUMNS.len()];
        cells[0] = first;
        out.push_str(&format!("{code},{}\n", cells.join(",")));
    }
    out
}

#[test]
fn pbq_unmapped_codes_and_exclusions() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(
        dir.path(),
        "FU1",
        "IMAGEN-IMGN_PBQ_FU_RC1-BASIC_DIGEST.csv",
        &pbq_csv(&[("000071766352-I1", "1"), ("000011111111-I1", "9")]),
    );
    write_raw(
        dir.path(),
        "BL",
        "IMAGEN-IMGN_PBQ_RC1-BASIC_DIGEST.csv",
        &pbq_csv(&[("000071766352-I1", "-1"), ("000012809392-I1", "0")]),
    );
    let layout = DataLayout::new(dir.path(), "2.7");
    let registry = load_default_registry().unwrap();
    let schema = registry.schema_for("PBQ").unwrap();

    let sessions = load_instrument(schema, &layout).unwrap();
    let outcome = merge_sessions(schema, &sessions).unwrap();
    assert_eq!(outcome.excluded, 2);

    let keys = record_keys(&outcome.table.data).unwrap();
    assert!(
        !keys
            .iter()
            .any(|key| key.id == SubjectId(71766352) && key.session == Session::FollowUp1)
    );
    assert!(!keys.iter().any(|key| key.id == SubjectId(12809392)));
    assert_eq!(keys.len(), 2);

    let pbq_03 = outcome.table.data.column("pbq_03").unwrap().str().unwrap().clone();
    // FU1 subject 11111111 answered an out-of-range code.
    assert_eq!(pbq_03.get(0), None);
    assert_eq!(pbq_03.get(1), Some("not known"));
}

#[test]
fn shared_user_code_prefix_is_kept_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(
        dir.path(),
        "BL",
        "IMAGEN-IMGN_PBQ_RC1-BASIC_DIGEST.csv",
        &pbq_csv(&[
            ("000022222222-A", "1"),
            ("000022222222-B", "0"),
            ("000071766352-I1", "1"),
        ]),
    );
    write_raw(
        dir.path(),
        "FU1",
        "IMAGEN-IMGN_PBQ_FU_RC1-BASIC_DIGEST.csv",
        &pbq_csv(&[("000022222222-A", "1")]),
    );
    let layout = DataLayout::new(dir.path(), "2.7");
    let registry = load_default_registry().unwrap();
    let schema = registry.schema_for("PBQ").unwrap();

    let sessions = load_instrument(schema, &layout).unwrap();
    let outcome = merge_sessions(schema, &sessions).unwrap();
    assert_eq!(outcome.excluded, 0);
    assert_eq!(outcome.table.record_count(), 4);

    let keys = record_keys(&outcome.table.data).unwrap();
    let baseline_rows = keys
        .iter()
        .filter(|key| key.id == SubjectId(22222222) && key.session == Session::Baseline)
        .count();
    assert_eq!(baseline_rows, 2);

    // The same subject at another session is not a duplicate.
    assert_eq!(
        outcome.duplicates,
        vec![DuplicateRecord {
            id: SubjectId(22222222),
            session: Session::Baseline,
            count: 2,
        }]
    );
}

#[test]
fn missing_source_reports_session() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(
        dir.path(),
        "BL",
        "IMAGEN-IMGN_PBQ_RC1-BASIC_DIGEST.csv",
        &pbq_csv(&[("000071766352-I1", "1")]),
    );
    let layout = DataLayout::new(dir.path(), "2.7");
    let registry = load_default_registry().unwrap();
    let schema = registry.schema_for("PBQ").unwrap();

    let err = load_instrument(schema, &layout).unwrap_err();
    assert_eq!(err.kind(), "SourceFileMissing");
    assert_eq!(err.session(), Some(Session::FollowUp1));
    assert!(err.to_string().contains("IMAGEN-IMGN_PBQ_FU_RC1-BASIC_DIGEST.csv"));
}

#[test]
fn missing_column_is_schema_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(
        dir.path(),
        "FU2",
        CTQ_FILE,
        "User code,CTQ_1,CTQ_2\n000071766352-I1,1,1\n",
    );
    let layout = DataLayout::new(dir.path(), "2.7");
    let registry = load_default_registry().unwrap();
    let schema = registry.schema_for("CTQ").unwrap();

    let err = load_session(schema, Session::Baseline, &layout).unwrap_err();
    assert_eq!(err.kind(), "SourceSchemaMismatch");
    assert_eq!(err.session(), Some(Session::Baseline));
    assert!(err.to_string().contains("CTQ_3"));
}

#[test]
fn malformed_user_code_aborts_the_file() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(
        dir.path(),
        "BL",
        "IMAGEN-IMGN_PBQ_RC1-BASIC_DIGEST.csv",
        &pbq_csv(&[("000071766352-I1", "1"), ("ABC", "1")]),
    );
    let layout = DataLayout::new(dir.path(), "2.7");
    let registry = load_default_registry().unwrap();
    let schema = registry.schema_for("PBQ").unwrap();

    let err = load_session(schema, Session::Baseline, &layout).unwrap_err();
    assert_eq!(err.kind(), "MalformedIdentifier");
    assert_eq!(err.session(), Some(Session::Baseline));
}

#[test]
fn undeclared_session_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path(), "2.7");
    let registry = load_default_registry().unwrap();
    let schema = registry.schema_for("PBQ").unwrap();

    let err = load_session(schema, Session::FollowUp3, &layout).unwrap_err();
    assert!(matches!(err, TransformError::SessionNotDeclared { .. }));
}

#[test]
fn annotation_keeps_unlabelled_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(dir.path(), "FU2", CTQ_FILE, &ctq_csv());
    let layout = DataLayout::new(dir.path(), "2.7");
    let registry = load_default_registry().unwrap();
    let schema = registry.schema_for("CTQ").unwrap();

    let sessions = load_instrument(schema, &layout).unwrap();
    let merged = merge_sessions(schema, &sessions).unwrap();
    let labels = vec![CohortLabel {
        id: SubjectId(71766352),
        session: Session::FollowUp3,
        target: "Binge".to_string(),
        dataset: DatasetSplit::Training,
        sex: Sex::Female,
        site: Site::Hamburg,
        class: CohortClass::AlcoholMisuse,
    }];

    let before = merged.table.record_count();
    let outcome = annotate(&merged.table.data, &labels, LabelJoinKey::Id).unwrap();
    assert_eq!(outcome.table.height(), before);
    assert_eq!(outcome.matched, 4);
    assert_eq!(outcome.unmatched, 4);

    let keys = record_keys(&outcome.table).unwrap();
    let sex = outcome.table.column("Sex").unwrap().str().unwrap().clone();
    for (row, key) in keys.iter().enumerate() {
        if key.id == SubjectId(58060181) {
            assert_eq!(sex.get(row), None);
        } else {
            assert_eq!(sex.get(row), Some("Female"));
        }
    }
}
