//! Integration tests for the JSON billable import

use practice_store::adapters::database::VisitStore;
use practice_store::adapters::sqlite::SqliteStore;
use practice_store::core::entities::EntityService;
use practice_store::core::import::import_billables_from_file;
use practice_store::core::repair::AutoRepairPolicy;
use practice_store::core::visits::VisitService;
use practice_store::domain::{BillableCode, NewVisit, PracticeError};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn write_json(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_import_fee_schedule_file() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let file = write_json(
        r#"[
            {"Procedure Code": "D0120", "Description": "Periodic oral evaluation", "Price": "$55.00"},
            {"Procedure Code": "D1110", "Abbrev Description": "Prophy adult", "Price": "1,095.50"},
            {"BillableCode": "X1", "Cost": 12},
            {"Description": "row without a code", "Price": 10},
            {"Procedure Code": "D2740", "Description": "Crown", "Price": "ask front desk"}
        ]"#,
    );

    let summary = import_billables_from_file(store.as_ref(), file.path())
        .await
        .unwrap();
    assert_eq!(summary.total_rows, 5);
    assert_eq!(summary.imported, 3);
    let skipped: Vec<usize> = summary.skipped.iter().map(|s| s.index).collect();
    assert_eq!(skipped, vec![3, 4]);

    let entities = EntityService::new(store.clone());
    let prophy = entities
        .get_billable(&BillableCode::new("D1110").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(prophy.description, "Prophy adult");
    assert_eq!(prophy.cost, 1095.5);

    let x1 = entities
        .get_billable(&BillableCode::new("X1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(x1.description, "");
    assert_eq!(x1.cost, 12.0);
}

#[tokio::test]
async fn test_reimport_replaces_existing_codes() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let first = write_json(r#"[{"Procedure Code": "D0120", "Description": "Old", "Price": 50}]"#);
    let second = write_json(r#"[{"Procedure Code": "D0120", "Description": "New", "Price": 60}]"#);

    import_billables_from_file(store.as_ref(), first.path()).await.unwrap();
    import_billables_from_file(store.as_ref(), second.path()).await.unwrap();

    assert_eq!(store.table_counts().await.unwrap().billables, 1);
    let billable = EntityService::new(store.clone())
        .get_billable(&BillableCode::new("D0120").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(billable.description, "New");
    assert_eq!(billable.cost, 60.0);
}

#[tokio::test]
async fn test_numeric_code_is_shared_with_visits() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let file = write_json(r#"[{"BillableCode": 120, "Description": "Exam", "Cost": 40}]"#);
    let summary = import_billables_from_file(store.as_ref(), file.path())
        .await
        .unwrap();
    assert_eq!(summary.imported, 1);

    let visit: NewVisit = serde_json::from_str(
        r#"{"Paid": "1", "details": [{"BillableCode": 120, "Quantity": "2"}],
            "images": [{"name": "scan", "data": "AQID"}]}"#,
    )
    .unwrap();
    let visits = VisitService::new(store.clone(), Arc::new(AutoRepairPolicy));
    let aggregate = visits.create_visit(&visit).await.unwrap();

    assert!(aggregate.visit.paid);
    assert_eq!(aggregate.details[0].billable_code.as_str(), "120");
    assert_eq!(aggregate.details[0].quantity, 2);
    assert_eq!(aggregate.images[0].image_type, "");

    let billable = EntityService::new(store.clone())
        .get_billable(&BillableCode::new("120").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(billable.description, "Exam");
    assert_eq!(store.table_counts().await.unwrap().billables, 1);
}

#[tokio::test]
async fn test_import_rejects_non_array() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let file = write_json(r#"{"Procedure Code": "D0120"}"#);

    let err = import_billables_from_file(&store, file.path()).await.unwrap_err();
    assert!(matches!(err, PracticeError::Validation(_)));
    assert_eq!(store.table_counts().await.unwrap().billables, 0);
}

#[tokio::test]
async fn test_import_missing_file() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let err = import_billables_from_file(&store, "/nonexistent/fees.json")
        .await
        .unwrap_err();
    assert!(matches!(err, PracticeError::Io(_)));
}

#[tokio::test]
async fn test_import_malformed_json() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let file = write_json("[{\"Procedure Code\": ");
    let err = import_billables_from_file(&store, file.path()).await.unwrap_err();
    assert!(matches!(err, PracticeError::Serialization(_)));
}
