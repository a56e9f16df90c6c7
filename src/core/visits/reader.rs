//! Aggregate reader

use crate::adapters::database::StoreSession;
use crate::domain::{ImageId, Result, VisitAggregate, VisitId, VisitImage};

/// Assemble a visit with its detail lines and image metadata
///
/// Returns `Ok(None)` when no visit row has this id.
pub async fn read_aggregate(
    session: &mut dyn StoreSession,
    id: VisitId,
) -> Result<Option<VisitAggregate>> {
    let Some(visit) = session.get_visit(id).await? else {
        return Ok(None);
    };

    let details = session.list_visit_details(id).await?;
    let images = session.list_visit_images(id).await?;

    Ok(Some(VisitAggregate {
        visit,
        details,
        images,
    }))
}

/// Fetch one image with its payload
pub async fn read_image(session: &mut dyn StoreSession, id: ImageId) -> Result<Option<VisitImage>> {
    session.get_visit_image(id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::{SessionMode, VisitStore};
    use crate::adapters::sqlite::SqliteStore;

    #[tokio::test]
    async fn test_missing_visit_is_none() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut session = store.begin(SessionMode::Read).await.unwrap();
        assert!(read_aggregate(session.as_mut(), VisitId::new(1))
            .await
            .unwrap()
            .is_none());
        assert!(read_image(session.as_mut(), ImageId::new(1))
            .await
            .unwrap()
            .is_none());
    }
}
