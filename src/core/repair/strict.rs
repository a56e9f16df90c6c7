//! Strict policy: a missing parent row rejects the visit

use super::{describe, ReferencePolicy};
use crate::adapters::database::StoreSession;
use crate::domain::{BillableCode, ClientId, PracticeError, ProviderId, ReferenceKind, Result};
use async_trait::async_trait;

/// Accepts only references that already resolve
///
/// Never writes. A miss fails with [`PracticeError::MissingReference`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPolicy;

fn missing(kind: ReferenceKind, key: String) -> PracticeError {
    PracticeError::MissingReference { kind, key }
}

#[async_trait]
impl ReferencePolicy for StrictPolicy {
    async fn resolve_client(
        &self,
        session: &mut dyn StoreSession,
        requested: Option<ClientId>,
    ) -> Result<ClientId> {
        match requested {
            Some(id) if session.client_exists(id).await? => Ok(id),
            _ => Err(missing(ReferenceKind::Client, describe(requested))),
        }
    }

    async fn resolve_provider(
        &self,
        session: &mut dyn StoreSession,
        requested: Option<ProviderId>,
    ) -> Result<ProviderId> {
        match requested {
            Some(id) if session.provider_exists(id).await? => Ok(id),
            _ => Err(missing(ReferenceKind::Provider, describe(requested))),
        }
    }

    async fn resolve_billable(
        &self,
        session: &mut dyn StoreSession,
        code: &BillableCode,
    ) -> Result<BillableCode> {
        if session.billable_exists(code).await? {
            Ok(code.clone())
        } else {
            Err(missing(ReferenceKind::Billable, code.to_string()))
        }
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::{SessionMode, VisitStore};
    use crate::adapters::sqlite::SqliteStore;
    use crate::domain::NewProvider;

    #[tokio::test]
    async fn test_strict_accepts_existing() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut session = store.begin(SessionMode::Write).await.unwrap();
        let id = session.insert_provider(&NewProvider::named("Grace", "Hopper")).await.unwrap();

        let resolved = StrictPolicy
            .resolve_provider(session.as_mut(), Some(id))
            .await
            .unwrap();
        assert_eq!(resolved, id);
    }

    #[tokio::test]
    async fn test_strict_rejects_missing_without_writing() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut session = store.begin(SessionMode::Write).await.unwrap();

        let err = StrictPolicy
            .resolve_client(session.as_mut(), Some(ClientId::new(7)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PracticeError::MissingReference { kind: ReferenceKind::Client, ref key } if key == "7"
        ));

        let err = StrictPolicy
            .resolve_billable(session.as_mut(), &BillableCode::new("P100").unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("billable 'P100'"));
        assert!(session.list_clients().await.unwrap().is_empty());
        assert!(session.list_billables().await.unwrap().is_empty());
    }
}
