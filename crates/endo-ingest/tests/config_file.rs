use std::fs;

use endo_ingest::{
    ConfigWarning, IngestError, check_file_size_with_limit, columns, read_config_file,
};

const MENU: &str = "\u{feff}Diagnosis,Section,Subsection,Esophagus,Stomach,Attribute1,Attribute2\n\
Ulcer,Size,,,x,int_box mm,\n\
Ulcer,Base,Colour,,X,\"Clean, white\",Black\n";

#[test]
fn reads_menu_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("endo_menu.csv");
    fs::write(&path, MENU).expect("write menu");

    let parsed = read_config_file(&path).expect("read menu");
    assert!(parsed.warnings.is_empty());
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.records[1].get(columns::SUBSECTION), "Colour");
    assert_eq!(parsed.records[1].get("Attribute1"), "Clean, white");
    assert_eq!(
        parsed.headers.attribute_columns(),
        vec!["Attribute1", "Attribute2"]
    );

    let source = parsed.source.expect("fingerprint");
    assert_eq!(source.name.as_deref(), Some("endo_menu.csv"));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = read_config_file(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn oversized_file_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("big.csv");
    fs::write(&path, MENU).expect("write menu");
    let err = check_file_size_with_limit(&path, 10).unwrap_err();
    assert!(matches!(err, IngestError::FileTooLarge { max_size: 10, .. }));
}

#[test]
fn utf16_file_loads_as_empty_with_warning() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("utf16.csv");
    fs::write(&path, [0xFE, 0xFF, 0x00, b'D']).expect("write menu");
    let parsed = read_config_file(&path).expect("read menu");
    assert!(parsed.is_empty());
    assert!(matches!(
        parsed.warnings.as_slice(),
        [ConfigWarning::MalformedInput { reason }] if reason.contains("UTF-16 BE")
    ));
}
