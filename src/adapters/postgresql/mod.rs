//! PostgreSQL store integration
//!
//! Server backend for multi-seat practices, built on tokio-postgres with a
//! deadpool connection pool.

pub mod client;
pub mod session;

pub use client::PostgreSQLStore;
pub use session::{PostgreSQLSession, WRITE_LOCK_KEY};
