//! Bulk billable import from a JSON price list
//!
//! The source is a JSON array of objects exported from a fee schedule. Column
//! names vary between exports, so each field is taken from the first
//! non-empty of several keys:
//!
//! | field       | keys                                   | fallback |
//! |-------------|----------------------------------------|----------|
//! | code        | `Procedure Code`, `BillableCode`       | skip row |
//! | description | `Description`, `Abbrev Description`    | `""`     |
//! | cost        | `Price`, `Cost`                        | `0`      |
//!
//! A value counts as empty when it is null, `false`, `0` or `""`. String costs
//! may carry `$` and thousands separators.

use super::summary::ImportSummary;
use crate::adapters::database::{SessionMode, VisitStore};
use crate::core::transaction::complete;
use crate::domain::{Billable, BillableCode, PracticeError, Result};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Instant;

const CODE_KEYS: [&str; 2] = ["Procedure Code", "BillableCode"];
const DESCRIPTION_KEYS: [&str; 2] = ["Description", "Abbrev Description"];
const COST_KEYS: [&str; 2] = ["Price", "Cost"];

/// Read a JSON file and import every row
///
/// # Errors
///
/// Fails if the file cannot be read, is not a JSON array, or the store
/// rejects the batch.
pub async fn import_billables_from_file(
    store: &dyn VisitStore,
    path: impl AsRef<Path>,
) -> Result<ImportSummary> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        PracticeError::Io(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let rows = match serde_json::from_str::<Value>(&content)? {
        Value::Array(rows) => rows,
        _ => {
            return Err(PracticeError::Validation(format!(
                "{} must contain a JSON array of billables",
                path.display()
            )))
        }
    };

    tracing::info!(path = %path.display(), rows = rows.len(), "Importing billables");
    import_billables(store, &rows).await
}

/// Upsert every parseable row in one transaction
///
/// An existing code is replaced. Rows that cannot be parsed are recorded in
/// the summary and left out; a store failure rolls back the whole batch.
pub async fn import_billables(store: &dyn VisitStore, rows: &[Value]) -> Result<ImportSummary> {
    let start = Instant::now();
    let mut summary = ImportSummary::new(rows.len());

    let mut billables = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match parse_billable_row(row) {
            Ok(billable) => billables.push(billable),
            Err(reason) => summary.skip(index, reason),
        }
    }

    let mut session = store.begin(SessionMode::Write).await?;
    let outcome = async {
        for billable in &billables {
            session.upsert_billable(billable).await?;
        }
        Ok::<_, PracticeError>(billables.len())
    }
    .await;
    summary.imported = complete(session, outcome).await?;

    let summary = summary.with_duration(start.elapsed());
    summary.log_summary();
    Ok(summary)
}

/// Map one source object to a billable
///
/// Returns the reason when the row has to be skipped.
pub fn parse_billable_row(row: &Value) -> std::result::Result<Billable, String> {
    let object = row
        .as_object()
        .ok_or_else(|| "row is not a JSON object".to_string())?;

    let code = match first_present(object, &CODE_KEYS) {
        Some(value) => text(value).ok_or_else(|| format!("unsupported code value {}", value))?,
        None => return Err("missing billable code".to_string()),
    };
    let code = BillableCode::new(code)?;

    let description = first_present(object, &DESCRIPTION_KEYS)
        .and_then(text)
        .unwrap_or_default();

    let cost = match first_present(object, &COST_KEYS) {
        Some(value) => parse_cost(value)
            .ok_or_else(|| format!("unparseable cost {} for code {}", value, code))?,
        None => 0.0,
    };

    Ok(Billable::new(code, description, cost))
}

/// Parse a cost given as a number or as text such as `"$1,250.00"`
pub fn parse_cost(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
            cleaned.trim().parse::<f64>().ok().filter(|c| c.is_finite())
        }
        _ => None,
    }
}

fn first_present<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStore;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(json!(95) => Some(95.0); "integer")]
    #[test_case(json!(12.5) => Some(12.5); "float")]
    #[test_case(json!("$1,250.00") => Some(1250.0); "currency string")]
    #[test_case(json!(" 40 ") => Some(40.0); "padded string")]
    #[test_case(json!("call office") => None; "text")]
    #[test_case(json!(true) => None; "boolean")]
    fn test_parse_cost(value: Value) -> Option<f64> {
        parse_cost(&value)
    }

    #[test]
    fn test_parse_row_prefers_procedure_code_and_price() {
        let row = json!({
            "Procedure Code": "D0120",
            "BillableCode": "IGNORED",
            "Abbrev Description": "Periodic exam",
            "Price": "$55.00",
            "Cost": 10
        });
        let billable = parse_billable_row(&row).unwrap();
        assert_eq!(billable.billable_code.as_str(), "D0120");
        assert_eq!(billable.description, "Periodic exam");
        assert_eq!(billable.cost, 55.0);
    }

    #[test]
    fn test_parse_row_falls_back_on_empty_values() {
        let row = json!({
            "Procedure Code": "",
            "BillableCode": "X1",
            "Description": "",
            "Price": 0,
            "Cost": "7"
        });
        let billable = parse_billable_row(&row).unwrap();
        assert_eq!(billable.billable_code.as_str(), "X1");
        assert_eq!(billable.description, "");
        assert_eq!(billable.cost, 7.0);
    }

    #[test]
    fn test_parse_row_numeric_code() {
        let billable = parse_billable_row(&json!({"BillableCode": 120})).unwrap();
        assert_eq!(billable.billable_code.as_str(), "120");
        assert_eq!(billable.cost, 0.0);
    }

    #[test]
    fn test_parse_row_rejections() {
        assert!(parse_billable_row(&json!({"Description": "no code"}))
            .unwrap_err()
            .contains("missing billable code"));
        assert!(parse_billable_row(&json!("D0120")).is_err());
        assert!(parse_billable_row(&json!({"BillableCode": "  "})).is_err());
        assert!(parse_billable_row(&json!({"BillableCode": "X", "Price": "n/a"}))
            .unwrap_err()
            .contains("unparseable cost"));
    }

    #[tokio::test]
    async fn test_import_upserts_and_skips() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let rows = vec![
            json!({"Procedure Code": "A1", "Description": "First", "Price": 10}),
            json!({"Description": "orphan"}),
            json!({"Procedure Code": "A1", "Description": "Replaced", "Price": "$12"}),
        ];

        let summary = import_billables(&store, &rows).await.unwrap();
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped_count(), 1);
        assert_eq!(summary.skipped[0].index, 1);
        assert_eq!(store.table_counts().await.unwrap().billables, 1);

        let mut session = store.begin(SessionMode::Read).await.unwrap();
        let stored = session
            .get_billable(&BillableCode::new("A1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.description, "Replaced");
        assert_eq!(stored.cost, 12.0);
    }
}
