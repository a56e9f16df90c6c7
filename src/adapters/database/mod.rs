//! Store abstraction layer
//!
//! Trait-based access to the relational store, so the visit core runs
//! unchanged against SQLite or PostgreSQL.

pub mod factory;
pub mod traits;

pub use factory::create_store;
pub use traits::{
    BillableRepository, ClientRepository, ProviderRepository, SessionMode, StoreSession,
    TableCounts, VisitRepository, VisitStore,
};
