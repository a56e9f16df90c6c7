//! Billable procedures

use crate::domain::ids::BillableCode;
use serde::{Deserialize, Serialize};

/// Description written on billables created by auto-repair
pub const AUTO_CREATED_DESCRIPTION: &str = "Auto created";

/// A billable procedure, keyed by its business code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Billable {
    pub billable_code: BillableCode,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: f64,
}

impl Billable {
    /// Creates a billable
    pub fn new(code: BillableCode, description: impl Into<String>, cost: f64) -> Self {
        Self {
            billable_code: code,
            description: description.into(),
            cost,
        }
    }

    /// The row auto-repair writes for a code that does not exist yet
    pub fn placeholder(code: BillableCode) -> Self {
        Self::new(code, AUTO_CREATED_DESCRIPTION, 0.0)
    }
}

/// Mutable fields of a billable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillableUpdate {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_billable() {
        let code = BillableCode::new("P100").unwrap();
        let billable = Billable::placeholder(code.clone());
        assert_eq!(billable.billable_code, code);
        assert_eq!(billable.description, "Auto created");
        assert_eq!(billable.cost, 0.0);
    }

    #[test]
    fn test_billable_json_shape() {
        let json = r#"{"BillableCode":"D1110","Description":"Prophylaxis","Cost":95.5}"#;
        let billable: Billable = serde_json::from_str(json).unwrap();
        assert_eq!(billable.billable_code.as_str(), "D1110");
        assert_eq!(billable.cost, 95.5);
    }
}
