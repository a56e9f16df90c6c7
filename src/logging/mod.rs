//! Logging and observability
//!
//! Structured logging with:
//! - JSON-formatted file logs
//! - Configurable log levels
//! - Local file logging with rotation
//!
//! The macros below give the events emitted by the visit path a fixed shape,
//! so an operator can filter for every auto-created row with one query.
//!
//! # Example
//!
//! ```no_run
//! use practice_store::logging::init_logging;
//! use practice_store::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{build_filter, init_logging, parse_rotation, LoggingGuard, LOG_FILE_NAME};

/// Log that a missing parent row was created by auto-repair
///
/// # Example
///
/// ```no_run
/// use practice_store::log_reference_repaired;
/// use practice_store::domain::ReferenceKind;
///
/// log_reference_repaired!(ReferenceKind::Client, "absent", 17);
/// ```
#[macro_export]
macro_rules! log_reference_repaired {
    ($kind:expr, $requested:expr, $created:expr) => {
        tracing::info!(
            kind = %$kind,
            requested = %$requested,
            created = %$created,
            "Reference repaired"
        );
    };
}

/// Log a committed visit aggregate
///
/// # Example
///
/// ```no_run
/// use practice_store::log_aggregate_written;
///
/// log_aggregate_written!(12, 3, 1);
/// ```
#[macro_export]
macro_rules! log_aggregate_written {
    ($visit_id:expr, $details:expr, $images:expr) => {
        tracing::info!(
            visit_id = %$visit_id,
            details = $details,
            images = $images,
            "Visit aggregate written"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use practice_store::log_error_with_context;
/// use practice_store::domain::PracticeError;
///
/// let error = PracticeError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::{PracticeError, ReferenceKind, VisitId};

    #[test]
    fn test_macros_expand_without_subscriber() {
        log_reference_repaired!(ReferenceKind::Provider, "absent", 4);
        log_aggregate_written!(VisitId::new(9), 2usize, 0usize);
        let error = PracticeError::Validation("bad".to_string());
        log_error_with_context!(&error, "unit test");
    }
}
