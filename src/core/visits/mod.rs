//! Visit aggregate operations
//!
//! [`VisitService`] is the entry point: each operation opens one store session,
//! runs the matching function from [`writer`], [`reader`] or [`deleter`] in it,
//! and commits or rolls back through [`complete`].
//!
//! # Example
//!
//! ```rust,no_run
//! use practice_store::adapters::sqlite::SqliteStore;
//! use practice_store::core::repair::AutoRepairPolicy;
//! use practice_store::core::visits::VisitService;
//! use practice_store::domain::{BillableCode, ClientId, NewVisit};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SqliteStore::open_in_memory().await?);
//! let service = VisitService::new(store, Arc::new(AutoRepairPolicy));
//!
//! let visit = NewVisit::new(Some(ClientId::new(1)), None)
//!     .with_detail(BillableCode::new("X1")?, Some(2));
//! let created = service.create_visit(&visit).await?;
//! assert!(service.get_visit(created.id()).await?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod deleter;
pub mod reader;
pub mod writer;

pub use deleter::{delete_aggregate, DeleteOutcome};
pub use reader::{read_aggregate, read_image};
pub use writer::write_aggregate;

use crate::adapters::database::{SessionMode, VisitStore};
use crate::config::VisitConfig;
use crate::core::repair::{policy_for, resolve_reference, ReferenceKey, ReferencePolicy};
use crate::core::transaction::complete;
use crate::domain::{
    ImageId, NewVisit, Result, Visit, VisitAggregate, VisitFields, VisitId, VisitImage,
};
use crate::log_aggregate_written;
use std::sync::Arc;

/// Visit aggregate operations over a store
#[derive(Clone)]
pub struct VisitService {
    store: Arc<dyn VisitStore>,
    policy: Arc<dyn ReferencePolicy>,
}

impl VisitService {
    /// Create a service with an explicit reference policy
    pub fn new(store: Arc<dyn VisitStore>, policy: Arc<dyn ReferencePolicy>) -> Self {
        Self { store, policy }
    }

    /// Create a service with the policy named in `[visits]`
    pub fn from_config(store: Arc<dyn VisitStore>, config: &VisitConfig) -> Self {
        Self::new(store, policy_for(config.reference_policy))
    }

    /// Name of the active reference policy
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Resolve a single reference in its own transaction
    ///
    /// Under auto-repair this creates the placeholder row if needed.
    pub async fn resolve_reference(&self, key: ReferenceKey) -> Result<ReferenceKey> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = resolve_reference(self.policy.as_ref(), session.as_mut(), key).await;
        complete(session, outcome).await
    }

    /// Create a visit with its details and images as one transaction
    ///
    /// # Errors
    ///
    /// Any failure rolls back every row written by this call, placeholders
    /// included. Under the strict policy an unknown reference fails with
    /// `PracticeError::MissingReference`.
    pub async fn create_visit(&self, visit: &NewVisit) -> Result<VisitAggregate> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = write_aggregate(self.policy.as_ref(), session.as_mut(), visit).await;
        let aggregate = complete(session, outcome).await?;

        log_aggregate_written!(aggregate.id(), aggregate.details.len(), aggregate.images.len());
        Ok(aggregate)
    }

    /// Read a visit with its details and image metadata
    pub async fn get_visit(&self, id: VisitId) -> Result<Option<VisitAggregate>> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = read_aggregate(session.as_mut(), id).await;
        let aggregate = complete(session, outcome).await?;

        tracing::debug!(visit_id = %id, found = aggregate.is_some(), "Visit read");
        Ok(aggregate)
    }

    /// Read one image including its payload
    pub async fn get_image(&self, id: ImageId) -> Result<Option<VisitImage>> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = read_image(session.as_mut(), id).await;
        complete(session, outcome).await
    }

    /// Delete a visit and its children; unknown ids are a no-op
    pub async fn delete_visit(&self, id: VisitId) -> Result<DeleteOutcome> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = delete_aggregate(session.as_mut(), id).await;
        let deleted = complete(session, outcome).await?;

        tracing::info!(
            visit_id = %id,
            details = deleted.details,
            images = deleted.images,
            visits = deleted.visits,
            "Visit aggregate deleted"
        );
        Ok(deleted)
    }

    /// All visit rows in id order, without children
    pub async fn list_visits(&self) -> Result<Vec<Visit>> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = session.list_visits().await;
        complete(session, outcome).await
    }

    /// Rewrite the scalar columns of a visit
    ///
    /// References are not repaired here: an unknown client or provider id
    /// fails with a constraint violation. Details and images are untouched.
    /// Returns `Ok(None)` when the visit does not exist.
    pub async fn update_visit(&self, id: VisitId, fields: &VisitFields) -> Result<Option<Visit>> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = async {
            if !session.update_visit(id, fields).await? {
                return Ok(None);
            }
            session.get_visit(id).await
        }
        .await;
        let updated = complete(session, outcome).await?;

        if updated.is_some() {
            tracing::info!(visit_id = %id, "Visit updated");
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStore;
    use crate::config::ReferencePolicyKind;
    use crate::domain::{BillableCode, ClientId, PracticeError, ProviderId};

    async fn service(kind: ReferencePolicyKind) -> (Arc<SqliteStore>, VisitService) {
        let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
        let service = VisitService::from_config(
            store.clone(),
            &VisitConfig {
                reference_policy: kind,
            },
        );
        (store, service)
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (_store, service) = service(ReferencePolicyKind::AutoRepair).await;
        let visit = NewVisit::new(None, None)
            .with_detail(BillableCode::new("X1").unwrap(), Some(3))
            .with_image("a.jpg", "image/jpeg", vec![9; 16]);

        let created = service.create_visit(&visit).await.unwrap();
        let read = service.get_visit(created.id()).await.unwrap().unwrap();
        assert_eq!(read, created);

        let image = service
            .get_image(read.images[0].image_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(image.image_data, vec![9; 16]);
        assert_eq!(image.visit_id, created.id());
    }

    #[tokio::test]
    async fn test_strict_create_writes_nothing() {
        let (store, service) = service(ReferencePolicyKind::Strict).await;
        assert_eq!(service.policy_name(), "strict");

        let err = service
            .create_visit(&NewVisit::new(Some(ClientId::new(1)), Some(ProviderId::new(1))))
            .await
            .unwrap_err();
        assert!(matches!(err, PracticeError::MissingReference { .. }));
        assert_eq!(
            store.table_counts().await.unwrap(),
            crate::adapters::database::TableCounts::default()
        );
    }

    #[tokio::test]
    async fn test_update_unknown_visit_is_none() {
        let (_store, service) = service(ReferencePolicyKind::AutoRepair).await;
        let created = service.create_visit(&NewVisit::default()).await.unwrap();

        let fields = VisitFields {
            client_id: created.visit.client_id,
            provider_id: created.visit.provider_id,
            visit_date: Some("2024-05-05".to_string()),
            paid: true,
            notes: None,
        };
        assert!(service
            .update_visit(VisitId::new(created.id().get() + 100), &fields)
            .await
            .unwrap()
            .is_none());

        let updated = service.update_visit(created.id(), &fields).await.unwrap().unwrap();
        assert!(updated.paid);
        assert_eq!(updated.visit_date.as_deref(), Some("2024-05-05"));
    }

    #[tokio::test]
    async fn test_update_does_not_repair() {
        let (_store, service) = service(ReferencePolicyKind::AutoRepair).await;
        let created = service.create_visit(&NewVisit::default()).await.unwrap();

        let fields = VisitFields {
            client_id: ClientId::new(9_999),
            provider_id: created.visit.provider_id,
            visit_date: None,
            paid: false,
            notes: None,
        };
        let err = service.update_visit(created.id(), &fields).await.unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
