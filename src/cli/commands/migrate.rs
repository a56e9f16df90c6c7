//! Migrate command implementation
//!
//! Applies the bundled schema to the configured store. Safe to run repeatedly.

use super::{open_store, report_failure, EXIT_OK};
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        println!("🗄️  Applying schema");
        println!();

        let (config, store) = match open_store(config_path).await {
            Ok(opened) => opened,
            Err(code) => return Ok(code),
        };

        if let Err(e) = store.ensure_schema().await {
            return Ok(report_failure("Schema migration failed", &e));
        }

        tracing::info!(backend = store.backend_name(), "Schema applied");
        println!(
            "✅ Schema is up to date ({:?} store)",
            config.database_target
        );
        Ok(EXIT_OK)
    }
}
