//! Store factory
//!
//! Builds the configured backend and hands it back as a trait object.

use crate::adapters::database::traits::VisitStore;
use crate::adapters::postgresql::PostgreSQLStore;
use crate::adapters::sqlite::SqliteStore;
use crate::config::schema::{DatabaseTarget, PracticeConfig};
use crate::domain::{PracticeError, Result};
use std::sync::Arc;

/// Create a store based on the configuration
///
/// This function examines `database_target` and opens the matching backend.
/// The schema is not touched; call [`VisitStore::ensure_schema`] for that.
///
/// # Errors
///
/// Returns an error if the backend section is missing or the store cannot be opened
pub async fn create_store(config: &PracticeConfig) -> Result<Arc<dyn VisitStore>> {
    match config.database_target {
        DatabaseTarget::Sqlite => {
            let sqlite_config = config.sqlite.as_ref().ok_or_else(|| {
                PracticeError::Configuration(
                    "sqlite configuration is required when database_target = 'sqlite'".to_string(),
                )
            })?;

            tracing::info!(path = %sqlite_config.path, "Opening SQLite store");
            let store = SqliteStore::open(sqlite_config)?;

            Ok(Arc::new(store) as Arc<dyn VisitStore>)
        }
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                PracticeError::Configuration(
                    "postgresql configuration is required when database_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL store");
            let store = PostgreSQLStore::new(pg_config.clone()).await?;

            Ok(Arc::new(store) as Arc<dyn VisitStore>)
        }
    }
}
