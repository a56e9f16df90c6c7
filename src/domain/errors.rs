//! Domain error types
//!
//! This module defines the error hierarchy for the practice store.
//! All errors are domain-specific and don't expose third-party types:
//! store adapters translate driver errors into [`DatabaseError`] at the boundary.

use std::fmt;
use thiserror::Error;

/// Main practice-store error type
///
/// This is the primary error type used throughout the crate.
/// "Not found" is deliberately absent: lookups return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum PracticeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Store-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// A referenced parent row is absent and the active policy refuses to create it
    #[error("Missing reference: {kind} '{key}' does not exist")]
    MissingReference { kind: ReferenceKind, key: String },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl PracticeError {
    /// Returns true when the store rejected a write on a constraint
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            PracticeError::Database(DatabaseError::ConstraintViolation(_))
        )
    }

    /// Returns true when the store could not be reached
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PracticeError::Database(DatabaseError::Unavailable(_)))
    }
}

/// Store-specific errors
///
/// Errors raised while executing statements against the relational store.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The store rejected a write (uniqueness, foreign key, NOT NULL)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Connection or I/O failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other statement failure
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    Migration(String),

    /// BEGIN/COMMIT/ROLLBACK failed
    #[error("Transaction failed: {0}")]
    Transaction(String),
}

/// Kind of parent row a visit can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Client,
    Provider,
    Billable,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::Client => "client",
            ReferenceKind::Provider => "provider",
            ReferenceKind::Billable => "billable",
        };
        f.write_str(name)
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for PracticeError {
    fn from(err: std::io::Error) -> Self {
        PracticeError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PracticeError {
    fn from(err: serde_json::Error) -> Self {
        PracticeError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PracticeError {
    fn from(err: toml::de::Error) -> Self {
        PracticeError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_practice_error_display() {
        let err = PracticeError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_database_error_conversion() {
        let db_err = DatabaseError::ConstraintViolation("UNIQUE failed".to_string());
        let err: PracticeError = db_err.into();
        assert!(err.is_constraint_violation());
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_unavailable_classification() {
        let err: PracticeError = DatabaseError::Unavailable("connection refused".to_string()).into();
        assert!(err.is_unavailable());
        assert_eq!(err.to_string(), "Database error: Store unavailable: connection refused");
    }

    #[test]
    fn test_missing_reference_display() {
        let err = PracticeError::MissingReference {
            kind: ReferenceKind::Billable,
            key: "P100".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing reference: billable 'P100' does not exist"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: PracticeError = io_err.into();
        assert!(matches!(err, PracticeError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: PracticeError = json_err.into();
        assert!(matches!(err, PracticeError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: PracticeError = toml_err.into();
        assert!(matches!(err, PracticeError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
