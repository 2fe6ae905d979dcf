//! Template persistence tests.

use chrono::NaiveDate;
use tempfile::TempDir;

use rapport::input::record;
use rapport::pipeline::{
    AggregationFunction, AggregationSpec, GroupByStage, GroupFieldSpec, Operation,
};
use rapport::template::{DateRange, ReportTemplate, TemplateStore};
use rapport::{RapportError, ReportBuilder, Value};

fn operations() -> Vec<Operation> {
    vec![Operation::GroupBy(GroupByStage::new(
        vec![GroupFieldSpec::new("Status")],
        vec![AggregationSpec::new("Amount", AggregationFunction::Sum, "Total")],
    ))]
}

#[test]
fn test_save_and_load_roundtrip_preserves_operations() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::new(dir.path().join("templates"));

    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    )
    .unwrap();
    let template = ReportTemplate::new("Skader per status", operations())
        .with_report_kind("claims")
        .with_date_range(range);

    let path = store.save(&template).unwrap();
    assert!(path.ends_with("skader-per-status.template.json"));
    assert!(store.contains("Skader per status"));

    let loaded = store.load("Skader per status").unwrap();
    assert_eq!(loaded, template);
}

#[test]
fn test_list_sorted_and_skips_foreign_files() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::new(dir.path());

    store.save(&ReportTemplate::new("b report", operations())).unwrap();
    store.save(&ReportTemplate::new("A report", vec![])).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a template").unwrap();
    std::fs::write(dir.path().join("broken.template.json"), "{").unwrap();

    let names: Vec<String> = store.list().unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["A report", "b report"]);
}

#[test]
fn test_list_missing_directory_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::new(dir.path().join("does-not-exist"));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_delete_and_not_found() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::new(dir.path());
    store.save(&ReportTemplate::new("Temp", operations())).unwrap();

    store.delete("Temp").unwrap();
    assert!(!store.contains("Temp"));
    assert!(matches!(store.load("Temp"), Err(RapportError::TemplateNotFound(_))));
    assert!(matches!(store.delete("Temp"), Err(RapportError::TemplateNotFound(_))));
}

#[test]
fn test_empty_name_rejected() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::new(dir.path());
    let result = store.save(&ReportTemplate::new("  ", operations()));
    assert!(matches!(result, Err(RapportError::Config(_))));
}

#[test]
fn test_loaded_template_runs() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::new(dir.path());
    store.save(&ReportTemplate::new("Totals", operations())).unwrap();

    let data = vec![
        record([("Status", Value::from("Open")), ("Amount", Value::from(100))]),
        record([("Status", Value::from("Open")), ("Amount", Value::from(50))]),
    ];
    let template = store.load("Totals").unwrap();
    let result = ReportBuilder::new().run_template(&data, &template).unwrap();
    assert_eq!(result.rows[0]["Total"], Value::Number(150.0));
}
