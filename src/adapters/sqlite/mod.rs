//! SQLite store integration
//!
//! Embedded backend built on `rusqlite`. Used for single-practice installs
//! and by the test suite through [`SqliteStore::open_in_memory`].

pub mod client;
pub mod session;

pub use client::{SqliteStore, IN_MEMORY_PATH};
pub use session::SqliteSession;
