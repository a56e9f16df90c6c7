//! Store integrations for the practice store.
//!
//! - [`database`] - Backend-neutral traits and the store factory
//! - [`sqlite`] - Embedded SQLite backend
//! - [`postgresql`] - PostgreSQL backend
//!
//! # Design Pattern
//!
//! Adapters isolate the database drivers behind the [`database::VisitStore`]
//! and [`database::StoreSession`] traits. Driver errors are translated into
//! [`crate::domain::DatabaseError`] inside each adapter.
//!
//! ```rust
//! use practice_store::adapters::database::{ClientRepository, SessionMode, VisitStore};
//! use practice_store::adapters::sqlite::SqliteStore;
//!
//! # async fn example() -> practice_store::domain::Result<()> {
//! let store = SqliteStore::open_in_memory().await?;
//! let mut session = store.begin(SessionMode::Read).await?;
//! let clients = session.list_clients().await?;
//! assert!(clients.is_empty());
//! session.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod postgresql;
pub mod sqlite;
