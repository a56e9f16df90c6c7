//! Image commands

use super::{open_store, report_failure, EXIT_FATAL, EXIT_NOT_FOUND, EXIT_OK};
use crate::core::visits::VisitService;
use crate::domain::ImageId;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments for the image command
#[derive(Args, Debug)]
pub struct ImageArgs {
    #[command(subcommand)]
    pub command: ImageCommand,
}

/// Image operations
#[derive(Subcommand, Debug)]
pub enum ImageCommand {
    /// Write an image payload to a file
    Export {
        /// Image id
        id: ImageId,

        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl ImageArgs {
    /// Execute the image command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let ImageCommand::Export { id, output } = &self.command;

        let (config, store) = match open_store(config_path).await {
            Ok(opened) => opened,
            Err(code) => return Ok(code),
        };
        let service = VisitService::from_config(store, &config.visits);

        let image = match service.get_image(*id).await {
            Ok(Some(image)) => image,
            Ok(None) => {
                println!("❌ Image {} not found", id);
                return Ok(EXIT_NOT_FOUND);
            }
            Err(e) => return Ok(report_failure("Failed to read image", &e)),
        };

        if let Err(e) = tokio::fs::write(output, &image.image_data).await {
            println!("❌ Failed to write {}", output.display());
            println!("   Error: {}", e);
            return Ok(EXIT_FATAL);
        }

        println!(
            "✅ Wrote {} ({}, {} bytes) to {}",
            image.image_name,
            image.image_type,
            image.image_data.len(),
            output.display()
        );
        Ok(EXIT_OK)
    }
}
