//! Configuration management for the practice store.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PRACTICE_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of the active backend only
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use practice_store::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("practice.toml")?;
//! println!("Backend: {:?}", config.database_target);
//! println!("Policy: {:?}", config.visits.reference_policy);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`SqliteConfig`] - Embedded store file
//! - [`PostgreSQLConfig`] - Server store connection and pool settings
//! - [`VisitConfig`] - Reference policy for visit writes
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! database_target = "postgresql"
//! environment = "production"
//!
//! [application]
//! log_level = "info"
//!
//! [postgresql]
//! connection_string = "postgresql://clinic:${PRACTICE_DB_PASSWORD}@db:5432/practice"
//! max_connections = 10
//! ssl_mode = "require"
//!
//! [visits]
//! reference_policy = "auto_repair"
//!
//! [logging]
//! local_enabled = true
//! local_path = "/var/log/practice-store"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, DatabaseTarget, Environment, LoggingConfig, PostgreSQLConfig,
    PracticeConfig, ReferencePolicyKind, SqliteConfig, VisitConfig,
};
pub use secret::{redact_connection_string, secret_string, SecretString, SecretValue};
