//! Import-billables command implementation

use super::{open_store, report_failure, EXIT_OK};
use crate::core::import::import_billables_from_file;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the import-billables command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON file holding an array of billable rows
    pub file: PathBuf,
}

impl ImportArgs {
    /// Execute the import-billables command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        println!("📥 Importing billables from {}", self.file.display());
        println!();

        let (_config, store) = match open_store(config_path).await {
            Ok(opened) => opened,
            Err(code) => return Ok(code),
        };

        let summary = match import_billables_from_file(store.as_ref(), &self.file).await {
            Ok(summary) => summary,
            Err(e) => return Ok(report_failure("Billable import failed", &e)),
        };

        println!("✅ Imported {} of {} rows", summary.imported, summary.total_rows);
        if !summary.skipped.is_empty() {
            println!("⚠️  Skipped {} rows:", summary.skipped_count());
            for row in &summary.skipped {
                println!("   row {}: {}", row.index, row.reason);
            }
        }
        println!("   Duration: {:.2}s", summary.duration.as_secs_f64());
        Ok(EXIT_OK)
    }
}
