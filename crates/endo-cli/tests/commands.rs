//! Commands driven against menu and report files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use endo_cli::commands::{
    CheckOutcome, load_menu, load_report, render_report, schema_json, schema_table, visible_rows,
};
use endo_model::ProcedureType;
use tempfile::TempDir;

const MENU: &str = "\
Diagnosis,Section,Subsection,Esophagus,Stomach,Multi_Attribute,Default_Attr,Conditional_on,Attribute1,Attribute2
Ulcer,Base,,,x,,Clean,,Clean,Black
Ulcer,Bleeding,,,x,,,Section(Base = Black),Active,Stigmata
Ulcer,Size,,,x,,,,int_box mm,
Varices,Grade,,x,,,,,Small,Large
";

const REPORT: &str = r#"{
  "__retroMeta": { "uhid": "UH42", "startFrame": 10 },
  "__meta": { "lastActive": { "loc": "Stomach", "disease": "Ulcer" } },
  "report": {
    "Esophagus": { "diseases": { "Varices": { "sections": { "Grade": { "attrs": { "Large": true } } } } } },
    "Stomach": { "diseases": { "Ulcer": {
      "sublocations": ["Antrum"],
      "sections": { "Base": { "attrs": { "Black": true } } },
      "comments": "Clip applied"
    } } }
  },
  "overallRemarks": "Otherwise normal"
}"#;

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn fixtures() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let menu = write_fixture(&dir, "menu.csv", MENU);
    let report = write_fixture(&dir, "report.json", REPORT);
    (dir, menu, report)
}

#[test]
fn test_check_clean_menu() {
    let (_dir, menu, _) = fixtures();
    let compilation = load_menu(&menu, ProcedureType::Endoscopy).unwrap();
    let outcome = CheckOutcome::from_compilation(&compilation);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.render(), "2 diseases, 0 warnings");
}

#[test]
fn test_check_menu_for_other_procedure_warns() {
    let (_dir, menu, _) = fixtures();
    let compilation = load_menu(&menu, ProcedureType::Colonoscopy).unwrap();
    let outcome = CheckOutcome::from_compilation(&compilation);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.render().contains("no location columns for colonoscopy"));
}

#[test]
fn test_missing_menu_reports_path() {
    let error = load_menu(Path::new("/nonexistent/menu.csv"), ProcedureType::Endoscopy)
        .err()
        .unwrap();
    assert!(format!("{error:#}").contains("/nonexistent/menu.csv"));
}

#[test]
fn test_schema_table_and_json() {
    let (_dir, menu, _) = fixtures();
    let schema = load_menu(&menu, ProcedureType::Endoscopy).unwrap().schema;

    let table = schema_table(&schema).to_string();
    assert!(table.contains("Ulcer"));
    assert!(table.contains("Varices"));
    assert!(table.contains("Base, Bleeding, Size"));

    let json: serde_json::Value = serde_json::from_str(&schema_json(&schema).unwrap()).unwrap();
    assert!(json.is_object());
}

#[test]
fn test_render_saved_report() {
    let (_dir, menu, report) = fixtures();
    let schema = load_menu(&menu, ProcedureType::Endoscopy).unwrap().schema;
    let document = load_report(&report).unwrap();

    insta::assert_snapshot!(render_report(schema, document), @r"
Esophagus
  Varices
    Sub-locations: none
    Grade
      - Large
Stomach
  Ulcer
    Sub-locations: Antrum
    Base
      - Black
    Comments: Clip applied

Overall remarks: Otherwise normal
");
}

#[test]
fn test_visible_rows_for_last_active_disease() {
    let (_dir, menu, report) = fixtures();
    let schema = load_menu(&menu, ProcedureType::Endoscopy).unwrap().schema;
    let document = load_report(&report).unwrap();

    let visible = visible_rows(schema, document, None).unwrap();
    assert_eq!(visible.active.loc, "Stomach");
    assert_eq!(visible.active.disease, "Ulcer");
    let table = visible.table.to_string();
    assert!(table.contains("Bleeding"));
    assert!(table.contains("Section(Base = Black)"));
    assert!(table.contains("int_box mm"));
}

#[test]
fn test_visible_rows_for_explicit_target() {
    let (_dir, menu, report) = fixtures();
    let schema = load_menu(&menu, ProcedureType::Endoscopy).unwrap().schema;

    let document = load_report(&report).unwrap();
    let visible = visible_rows(schema.clone(), document, Some(("Esophagus", "Varices"))).unwrap();
    assert_eq!(visible.active.disease, "Varices");
    assert!(visible.table.to_string().contains("Small, Large"));

    let document = load_report(&report).unwrap();
    let missing = visible_rows(schema, document, Some(("Stomach", "Varices")));
    assert!(missing.is_err());
}
