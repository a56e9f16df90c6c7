//! CLI command implementations
//!
//! This module contains all CLI command implementations, plus the helpers
//! they share for opening the configured store and mapping errors to exit
//! codes.

pub mod image;
pub mod import;
pub mod init;
pub mod migrate;
pub mod status;
pub mod validate;
pub mod visit;

use crate::adapters::database::{create_store, VisitStore};
use crate::config::{load_config, PracticeConfig};
use crate::domain::PracticeError;
use std::sync::Arc;

/// Exit code: success
pub const EXIT_OK: i32 = 0;
/// Exit code: configuration could not be loaded or is invalid
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: the requested row does not exist
pub const EXIT_NOT_FOUND: i32 = 3;
/// Exit code: the store could not be reached
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code: anything else
pub const EXIT_FATAL: i32 = 5;

/// Exit code for a failed operation
pub fn exit_code_for(error: &PracticeError) -> i32 {
    match error {
        PracticeError::Configuration(_) => EXIT_CONFIG,
        e if e.is_unavailable() => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}

/// Load the configuration and open its store
///
/// Failures are reported on stdout; the `Err` carries the exit code.
pub(crate) async fn open_store(
    config_path: &str,
) -> Result<(PracticeConfig, Arc<dyn VisitStore>), i32> {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            println!("❌ Failed to load configuration file");
            println!("   Error: {}", e);
            return Err(EXIT_CONFIG);
        }
    };

    match create_store(&config).await {
        Ok(store) => Ok((config, store)),
        Err(e) => {
            println!("❌ Failed to open the {:?} store", config.database_target);
            println!("   Error: {}", e);
            Err(exit_code_for(&e))
        }
    }
}

/// Print an operation failure and return its exit code
pub(crate) fn report_failure(action: &str, error: &PracticeError) -> i32 {
    tracing::error!(error = %error, action, "Command failed");
    println!("❌ {}", action);
    println!("   Error: {}", error);
    exit_code_for(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatabaseError, ReferenceKind};

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for(&PracticeError::Configuration("bad".to_string())),
            EXIT_CONFIG
        );
        assert_eq!(
            exit_code_for(&DatabaseError::Unavailable("down".to_string()).into()),
            EXIT_CONNECTION
        );
        assert_eq!(
            exit_code_for(&PracticeError::MissingReference {
                kind: ReferenceKind::Client,
                key: "1".to_string(),
            }),
            EXIT_FATAL
        );
    }

    #[tokio::test]
    async fn test_open_store_missing_config() {
        let result = open_store("/nonexistent/practice.toml").await;
        assert!(matches!(result, Err(EXIT_CONFIG)));
    }
}
