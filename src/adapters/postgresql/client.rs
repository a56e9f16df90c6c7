//! PostgreSQL store implementation
//!
//! Connection pooling through deadpool-postgres. Each session checks out one
//! pooled connection and runs a single transaction on it.

use crate::adapters::database::traits::{SessionMode, StoreSession, TableCounts, VisitStore};
use crate::adapters::postgresql::session::PostgreSQLSession;
use crate::config::redact_connection_string;
use crate::config::schema::PostgreSQLConfig;
use crate::domain::{DatabaseError, PracticeError, Result};
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolError, RecyclingMethod, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::error::SqlState;
use tokio_postgres::NoTls;

/// Schema applied by [`VisitStore::ensure_schema`]
const MIGRATION_SQL: &str = include_str!("../../../migrations/postgresql/001_initial_schema.sql");

/// PostgreSQL-backed [`VisitStore`]
pub struct PostgreSQLStore {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: PostgreSQLConfig,
}

impl PostgreSQLStore {
    /// Create a new PostgreSQL store
    ///
    /// No connection is opened until the first session; use
    /// [`VisitStore::test_connection`] to fail fast.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string cannot be parsed, the TLS
    /// connector cannot be built, or the pool cannot be created.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                PracticeError::Configuration(format!(
                    "Invalid PostgreSQL connection string: {}",
                    e
                ))
            })?;
        pg_config.ssl_mode(parse_ssl_mode(&config.ssl_mode)?);

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = if config.ssl_mode == "disable" {
            Manager::from_config(pg_config, NoTls, manager_config)
        } else {
            let connector = TlsConnector::builder().build().map_err(|e| {
                PracticeError::Configuration(format!("Failed to build TLS connector: {}", e))
            })?;
            Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
        };

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .build()
            .map_err(|e| {
                DatabaseError::Unavailable(format!("Failed to create connection pool: {}", e))
            })?;

        tracing::debug!(
            target_db = %redact_connection_string(&config.connection_string),
            max_connections = config.max_connections,
            "PostgreSQL pool created"
        );

        Ok(Self { pool, config })
    }

    /// Get a connection from the pool
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Unavailable` if no connection can be obtained.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| map_pool_error(e).into())
    }

    /// Get the connection string (without credentials)
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(&self.config.connection_string)
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

#[async_trait]
impl VisitStore for PostgreSQLStore {
    async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(map_pg_error)?;

        tracing::info!(
            target_db = %self.connection_string_safe(),
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .batch_execute(MIGRATION_SQL)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        tracing::info!("PostgreSQL schema initialized successfully");
        Ok(())
    }

    async fn begin(&self, mode: SessionMode) -> Result<Box<dyn StoreSession>> {
        let conn = self.get_connection().await?;
        let session =
            PostgreSQLSession::begin(conn, mode, self.config.statement_timeout_seconds).await?;
        Ok(Box::new(session))
    }

    async fn table_counts(&self) -> Result<TableCounts> {
        let client = self.get_connection().await?;
        let row = client
            .query_one(
                "SELECT
                    (SELECT COUNT(*) FROM Clients),
                    (SELECT COUNT(*) FROM Providers),
                    (SELECT COUNT(*) FROM Billables),
                    (SELECT COUNT(*) FROM Visits),
                    (SELECT COUNT(*) FROM VisitDetails),
                    (SELECT COUNT(*) FROM VisitImages)",
                &[],
            )
            .await
            .map_err(map_pg_error)?;

        let count = |idx: usize| -> Result<u64> {
            let value: i64 = row.try_get(idx).map_err(map_pg_error)?;
            Ok(value.max(0) as u64)
        };

        Ok(TableCounts {
            clients: count(0)?,
            providers: count(1)?,
            billables: count(2)?,
            visits: count(3)?,
            visit_details: count(4)?,
            visit_images: count(5)?,
        })
    }

    fn backend_name(&self) -> &'static str {
        "postgresql"
    }
}

fn parse_ssl_mode(mode: &str) -> Result<SslMode> {
    match mode {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        other => Err(PracticeError::Configuration(format!(
            "Invalid postgresql.ssl_mode '{}'",
            other
        ))),
    }
}

/// Translate a driver error into the domain error
pub(crate) fn map_pg_error(err: tokio_postgres::Error) -> DatabaseError {
    if let Some(db_error) = err.as_db_error() {
        let code = db_error.code();
        if code.code().starts_with("23") {
            return DatabaseError::ConstraintViolation(db_error.to_string());
        }
        if code.code().starts_with("08")
            || *code == SqlState::ADMIN_SHUTDOWN
            || *code == SqlState::CANNOT_CONNECT_NOW
        {
            return DatabaseError::Unavailable(db_error.to_string());
        }
        return DatabaseError::QueryFailed(db_error.to_string());
    }

    if err.is_closed() {
        return DatabaseError::Unavailable(err.to_string());
    }

    DatabaseError::QueryFailed(err.to_string())
}

fn map_pool_error(err: PoolError) -> DatabaseError {
    match err {
        PoolError::Backend(e) => DatabaseError::Unavailable(format!("Failed to connect: {}", e)),
        other => DatabaseError::Unavailable(format!(
            "Failed to get connection from pool: {}",
            other
        )),
    }
}
