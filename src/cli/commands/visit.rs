//! Visit commands: show, list, create, delete

use super::{open_store, report_failure, EXIT_FATAL, EXIT_NOT_FOUND, EXIT_OK};
use crate::core::visits::VisitService;
use crate::domain::{NewVisit, VisitId};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

/// Arguments for the visit command
#[derive(Args, Debug)]
pub struct VisitArgs {
    #[command(subcommand)]
    pub command: VisitCommand,
}

/// Visit operations
#[derive(Subcommand, Debug)]
pub enum VisitCommand {
    /// Print a visit with its details and image metadata as JSON
    Show {
        /// Visit id
        id: VisitId,
    },

    /// Print all visit rows as JSON
    List,

    /// Create a visit from a JSON file
    Create {
        /// JSON object with ClientId, ProviderId, VisitDate, Paid, Notes, details, images
        file: PathBuf,
    },

    /// Delete a visit and its children
    Delete {
        /// Visit id
        id: VisitId,
    },
}

impl VisitArgs {
    /// Execute the visit command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let (config, store) = match open_store(config_path).await {
            Ok(opened) => opened,
            Err(code) => return Ok(code),
        };
        let service = VisitService::from_config(store, &config.visits);

        match &self.command {
            VisitCommand::Show { id } => match service.get_visit(*id).await {
                Ok(Some(aggregate)) => {
                    println!("{}", serde_json::to_string_pretty(&aggregate)?);
                    Ok(EXIT_OK)
                }
                Ok(None) => {
                    println!("❌ Visit {} not found", id);
                    Ok(EXIT_NOT_FOUND)
                }
                Err(e) => Ok(report_failure("Failed to read visit", &e)),
            },
            VisitCommand::List => match service.list_visits().await {
                Ok(visits) => {
                    println!("{}", serde_json::to_string_pretty(&visits)?);
                    Ok(EXIT_OK)
                }
                Err(e) => Ok(report_failure("Failed to list visits", &e)),
            },
            VisitCommand::Create { file } => {
                let visit: NewVisit = match read_visit(file) {
                    Ok(visit) => visit,
                    Err(message) => {
                        println!("❌ {}", message);
                        return Ok(EXIT_FATAL);
                    }
                };
                match service.create_visit(&visit).await {
                    Ok(aggregate) => {
                        println!("{}", serde_json::to_string_pretty(&aggregate)?);
                        Ok(EXIT_OK)
                    }
                    Err(e) => Ok(report_failure("Failed to create visit", &e)),
                }
            }
            VisitCommand::Delete { id } => match service.delete_visit(*id).await {
                Ok(outcome) if outcome.is_noop() => {
                    println!("ℹ️  Visit {} does not exist, nothing deleted", id);
                    Ok(EXIT_OK)
                }
                Ok(outcome) => {
                    println!(
                        "✅ Deleted visit {} ({} details, {} images)",
                        id, outcome.details, outcome.images
                    );
                    Ok(EXIT_OK)
                }
                Err(e) => Ok(report_failure("Failed to delete visit", &e)),
            },
        }
    }
}

fn read_visit(file: &Path) -> Result<NewVisit, String> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Invalid visit JSON in {}: {}", file.display(), e))
}
