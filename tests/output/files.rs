//! Tests for writing and reading documents and snapshots.

use sheetwise_foundation::ErrorKind;
use sheetwise_output::{
    AUTOMATION_RULES_FILE, CONFIRMATION_UI_FILE, OutputBundle, RELATIONSHIPS_FILE, SCHEMA_FILE,
    generate, snapshot,
};

use crate::store;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn writes_four_files() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = generate(&store());
    let written = bundle.write_to_dir(dir.path()).unwrap();

    let names: Vec<_> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [SCHEMA_FILE, RELATIONSHIPS_FILE, AUTOMATION_RULES_FILE, CONFIRMATION_UI_FILE]
    );
    for path in &written {
        let text = std::fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version"], "1.0", "{}", path.display());
    }
}

#[test]
fn creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("out").join("store");
    generate(&store()).write_to_dir(&nested).unwrap();
    assert!(nested.join(SCHEMA_FILE).is_file());
}

#[test]
fn documents_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = generate(&store());
    bundle.write_to_dir(dir.path()).unwrap();
    let read = OutputBundle::read_from_dir(dir.path()).unwrap();

    let tables = |b: &OutputBundle| -> Vec<(String, Vec<String>)> {
        b.schema
            .entities
            .iter()
            .map(|e| (e.table_name.clone(), e.columns.iter().map(|c| c.name.clone()).collect()))
            .collect()
    };
    assert_eq!(tables(&read), tables(&bundle));

    assert_eq!(read.relationships.relationships.len(), bundle.relationships.relationships.len());
    for (a, b) in read
        .relationships
        .relationships
        .iter()
        .zip(&bundle.relationships.relationships)
    {
        assert_eq!(
            (&a.from_entity, &a.from_column, &a.to_entity, &a.to_column),
            (&b.from_entity, &b.from_column, &b.to_entity, &b.to_column)
        );
        assert_eq!(a.kind, b.kind);
        assert!(close(a.confidence, b.confidence));
    }

    let rule_ids = |b: &OutputBundle| -> Vec<String> {
        b.automation_rules.rules.iter().map(|r| r.id.clone()).collect()
    };
    assert_eq!(rule_ids(&read), rule_ids(&bundle));
    assert_eq!(read.automation_rules.workflows.len(), bundle.automation_rules.workflows.len());
    assert_eq!(read.confirmation_ui.sections.len(), 5);
    assert!(close(read.schema.metadata.confidence, bundle.schema.metadata.confidence));
    assert_eq!(read.schema.metadata.generated_at, bundle.schema.metadata.generated_at);
}

#[test]
fn reading_empty_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = OutputBundle::read_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Io(_)), "{err}");
}

#[test]
fn malformed_document_is_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    generate(&store()).write_to_dir(dir.path()).unwrap();
    std::fs::write(dir.path().join(RELATIONSHIPS_FILE), "{\"version\": 1").unwrap();

    let err = OutputBundle::read_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization(_)), "{err}");
    assert!(err.to_string().contains(RELATIONSHIPS_FILE));
}

#[test]
fn snapshot_regenerates_same_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.snapshot");
    let result = store();
    snapshot::save_to_file(&result, &path).unwrap();
    let restored = snapshot::load_from_file(&path).unwrap();

    assert_eq!(restored.source_file, result.source_file);
    assert_eq!(restored.sheets, result.sheets);
    assert_eq!(restored.entities.len(), result.entities.len());
    assert_eq!(restored.relationships, result.relationships);

    let before = generate(&result);
    let after = generate(&restored);
    assert_eq!(after.automation_rules.workflows, before.automation_rules.workflows);
    assert_eq!(after.relationships.diagram, before.relationships.diagram);
}

#[test]
fn truncated_snapshot_is_rejected() {
    let bytes = snapshot::to_bytes(&store()).unwrap();
    let err = snapshot::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization(_)));
}
