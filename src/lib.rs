// practice-store - Visit persistence with referential auto-repair
// Copyright (c) 2025 practice-store Contributors
// Licensed under the MIT License

//! # practice-store - Visit persistence for small clinical practices
//!
//! practice-store writes clinical visits (a client, a provider, billed
//! procedures and attached images) to SQLite or PostgreSQL as one consistent
//! unit, creating missing parent rows on the way instead of rejecting the write.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Writing** a visit aggregate atomically, with every reference resolved first
//! - **Repairing** references to clients, providers and billables that do not exist
//! - **Reading** a visit back as one composite value, image payloads on demand
//! - **Deleting** a visit's children before the visit itself
//!
//! ## Architecture
//!
//! practice-store follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (reference policies, visit aggregate, CRUD, import)
//! - [`adapters`] - Store backends (SQLite, PostgreSQL)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use practice_store::adapters::database::create_store;
//! use practice_store::config::load_config;
//! use practice_store::core::visits::VisitService;
//! use practice_store::domain::{BillableCode, ClientId, NewVisit, ProviderId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("practice.toml")?;
//!     let store = create_store(&config).await?;
//!     store.ensure_schema().await?;
//!
//!     let service = VisitService::from_config(store, &config.visits);
//!     let visit = NewVisit::new(Some(ClientId::new(1)), Some(ProviderId::new(2)))
//!         .with_date("2024-03-01")
//!         .with_detail(BillableCode::new("D0120")?, None);
//!
//!     let created = service.create_visit(&visit).await?;
//!     println!("Created visit {}", created.id());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! ### Referential Auto-Repair
//!
//! A visit that names a client or provider id that does not exist is written
//! against a new placeholder row ("Unknown Unknown") instead. A detail line
//! naming an unknown billable code creates that code with description
//! "Auto created" and cost 0. Switch to [`core::repair::StrictPolicy`] with
//! `reference_policy = "strict"` to reject such writes.
//!
//! ### Atomic Aggregates
//!
//! Placeholders, the visit row, its details and its images are written in one
//! transaction. A failure at any point leaves nothing behind.
//!
//! ## Error Handling
//!
//! practice-store uses the [`domain::PracticeError`] type for all errors. Rows
//! that do not exist are `Ok(None)`, not errors:
//!
//! ```rust,no_run
//! use practice_store::domain::{PracticeError, VisitId};
//! use practice_store::core::visits::VisitService;
//!
//! # async fn example(service: VisitService) -> Result<(), PracticeError> {
//! match service.get_visit(VisitId::new(42)).await? {
//!     Some(visit) => println!("{} detail lines", visit.details.len()),
//!     None => println!("no such visit"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! practice-store uses structured logging with the `tracing` crate. Every
//! auto-created row is logged as `Reference repaired` with its kind, the
//! requested key and the key actually used.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
