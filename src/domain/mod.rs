//! Domain models and types for the practice store.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ClientId`], [`ProviderId`], [`VisitId`], [`BillableCode`])
//! - **Entity records** ([`Client`], [`Provider`], [`Billable`])
//! - **The visit aggregate** ([`NewVisit`], [`VisitAggregate`], [`VisitImage`])
//! - **Error types** ([`PracticeError`], [`DatabaseError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Row ids use the newtype pattern so different ids cannot be mixed:
//!
//! ```rust
//! use practice_store::domain::{ClientId, ProviderId};
//!
//! let client = ClientId::new(1);
//! let provider = ProviderId::new(1);
//! // let wrong: ClientId = provider;  // Compile error!
//! assert_eq!(client.get(), provider.get());
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, PracticeError>`]. Absent rows are
//! not errors: lookups return `Ok(None)`.

pub mod billable;
pub mod client;
pub mod errors;
pub mod ids;
pub mod provider;
pub mod result;
pub mod visit;

// Re-export commonly used types for convenience
pub use billable::{Billable, BillableUpdate, AUTO_CREATED_DESCRIPTION};
pub use client::{Client, NewClient, PLACEHOLDER_NAME};
pub use errors::{DatabaseError, PracticeError, ReferenceKind};
pub use ids::{BillableCode, ClientId, ImageId, ProviderId, VisitDetailId, VisitId};
pub use provider::{NewProvider, Provider};
pub use result::Result;
pub use visit::{
    NewVisit, NewVisitDetail, NewVisitImage, Visit, VisitAggregate, VisitDetail, VisitImage,
    VisitFields, VisitImageMeta, DEFAULT_QUANTITY,
};
