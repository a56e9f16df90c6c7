//! Status command implementation
//!
//! This module implements the `status` command: a connection check followed
//! by row counts for every table.

use super::{open_store, report_failure, EXIT_OK};
use crate::adapters::database::TableCounts;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the counts as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking store status");

        let (_config, store) = match open_store(config_path).await {
            Ok(opened) => opened,
            Err(code) => return Ok(code),
        };

        if let Err(e) = store.test_connection().await {
            return Ok(report_failure("Failed to connect to store", &e));
        }

        let counts = match store.table_counts().await {
            Ok(counts) => counts,
            Err(e) => return Ok(report_failure("Failed to count rows", &e)),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&counts)?);
            return Ok(EXIT_OK);
        }

        println!("📊 Store Status ({})", store.backend_name());
        println!();
        print_counts(&counts);
        println!();
        Ok(EXIT_OK)
    }
}

fn print_counts(counts: &TableCounts) {
    println!("{:<15} {:>10}", "Table", "Rows");
    println!("{}", "-".repeat(26));
    for (table, rows) in [
        ("Clients", counts.clients),
        ("Providers", counts.providers),
        ("Billables", counts.billables),
        ("Visits", counts.visits),
        ("VisitDetails", counts.visit_details),
        ("VisitImages", counts.visit_images),
    ] {
        println!("{:<15} {:>10}", table, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_args_defaults() {
        let args = StatusArgs { json: false };
        assert!(!args.json);
    }
}
