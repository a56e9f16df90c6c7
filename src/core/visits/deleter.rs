//! Aggregate deleter

use crate::adapters::database::StoreSession;
use crate::domain::{Result, VisitId};
use serde::Serialize;

/// Rows removed by a visit delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub details: u64,
    pub images: u64,
    pub visits: u64,
}

impl DeleteOutcome {
    /// Total rows removed
    pub fn total(&self) -> u64 {
        self.details + self.images + self.visits
    }

    /// True when the visit did not exist
    pub fn is_noop(&self) -> bool {
        self.total() == 0
    }
}

/// Remove a visit's details, then its images, then the visit row
///
/// The store has no cascading deletes, so children must go first. Deleting an
/// id that does not exist removes nothing and is not an error.
pub async fn delete_aggregate(session: &mut dyn StoreSession, id: VisitId) -> Result<DeleteOutcome> {
    let details = session.delete_visit_details(id).await?;
    let images = session.delete_visit_images(id).await?;
    let visits = session.delete_visit(id).await?;

    Ok(DeleteOutcome {
        details,
        images,
        visits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::{SessionMode, VisitStore};
    use crate::adapters::sqlite::SqliteStore;

    #[test]
    fn test_outcome_totals() {
        let outcome = DeleteOutcome {
            details: 2,
            images: 1,
            visits: 1,
        };
        assert_eq!(outcome.total(), 4);
        assert!(!outcome.is_noop());
        assert!(DeleteOutcome::default().is_noop());
    }

    #[tokio::test]
    async fn test_delete_unknown_visit_is_noop() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut session = store.begin(SessionMode::Write).await.unwrap();
        let outcome = delete_aggregate(session.as_mut(), VisitId::new(99)).await.unwrap();
        assert!(outcome.is_noop());
    }
}
