//! Core business logic for the practice store.
//!
//! # Modules
//!
//! - [`repair`] - Reference policies: auto-repair of missing parents, or strict rejection
//! - [`visits`] - Visit aggregate writer, reader and deleter behind [`visits::VisitService`]
//! - [`entities`] - CRUD for clients, providers and billables
//! - [`import`] - Bulk billable import from JSON price lists
//! - [`transaction`] - Commit-or-rollback for a finished session
//!
//! # Visit Write Workflow
//!
//! 1. **Begin**: Open a write session (serialized against other writers)
//! 2. **Resolve**: Run the client, provider and every billable code through the policy
//! 3. **Insert**: Write the visit row, then its detail lines, then its images
//! 4. **Read back**: Assemble the aggregate inside the same session
//! 5. **Complete**: Commit on success; roll back everything on any failure
//!
//! # Example
//!
//! ```rust,no_run
//! use practice_store::adapters::database::create_store;
//! use practice_store::config::load_config;
//! use practice_store::core::visits::VisitService;
//! use practice_store::domain::NewVisit;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("practice.toml")?;
//! let store = create_store(&config).await?;
//! store.ensure_schema().await?;
//!
//! let service = VisitService::from_config(store, &config.visits);
//! let created = service.create_visit(&NewVisit::default()).await?;
//!
//! println!("Visit {} for client {}", created.id(), created.visit.client_id);
//! # Ok(())
//! # }
//! ```

pub mod entities;
pub mod import;
pub mod repair;
pub mod transaction;
pub mod visits;
