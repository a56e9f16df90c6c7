//! Auto-repair: a missing parent row is created instead of rejecting the visit

use super::{describe, ReferencePolicy};
use crate::adapters::database::StoreSession;
use crate::domain::{
    Billable, BillableCode, ClientId, NewClient, NewProvider, ProviderId, ReferenceKind, Result,
};
use crate::log_reference_repaired;
use async_trait::async_trait;

/// Creates placeholder rows for references that do not resolve
///
/// - A missing or absent client/provider id is replaced by the id of a new
///   row named "Unknown Unknown". The requested id is discarded, and every miss
///   creates its own placeholder.
/// - A missing billable code is inserted with description "Auto created" and
///   cost 0, keeping the requested code.
///
/// A reference that resolves costs one read and no write.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoRepairPolicy;

#[async_trait]
impl ReferencePolicy for AutoRepairPolicy {
    async fn resolve_client(
        &self,
        session: &mut dyn StoreSession,
        requested: Option<ClientId>,
    ) -> Result<ClientId> {
        if let Some(id) = requested {
            if session.client_exists(id).await? {
                return Ok(id);
            }
        }

        let created = session.insert_client(&NewClient::placeholder()).await?;
        log_reference_repaired!(ReferenceKind::Client, describe(requested), created);
        Ok(created)
    }

    async fn resolve_provider(
        &self,
        session: &mut dyn StoreSession,
        requested: Option<ProviderId>,
    ) -> Result<ProviderId> {
        if let Some(id) = requested {
            if session.provider_exists(id).await? {
                return Ok(id);
            }
        }

        let created = session.insert_provider(&NewProvider::placeholder()).await?;
        log_reference_repaired!(ReferenceKind::Provider, describe(requested), created);
        Ok(created)
    }

    async fn resolve_billable(
        &self,
        session: &mut dyn StoreSession,
        code: &BillableCode,
    ) -> Result<BillableCode> {
        if session.billable_exists(code).await? {
            return Ok(code.clone());
        }

        if session
            .insert_billable_if_absent(&Billable::placeholder(code.clone()))
            .await?
        {
            log_reference_repaired!(ReferenceKind::Billable, code, code);
        }
        Ok(code.clone())
    }

    fn name(&self) -> &'static str {
        "auto_repair"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::{SessionMode, VisitStore};
    use crate::adapters::sqlite::SqliteStore;

    #[tokio::test]
    async fn test_existing_client_is_returned_unchanged() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut session = store.begin(SessionMode::Write).await.unwrap();
        let id = session.insert_client(&NewClient::named("Ada", "Lovelace")).await.unwrap();

        let resolved = AutoRepairPolicy
            .resolve_client(session.as_mut(), Some(id))
            .await
            .unwrap();
        assert_eq!(resolved, id);
        assert_eq!(session.list_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_client_gets_placeholder() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut session = store.begin(SessionMode::Write).await.unwrap();

        let resolved = AutoRepairPolicy
            .resolve_client(session.as_mut(), Some(ClientId::new(999)))
            .await
            .unwrap();
        assert_ne!(resolved, ClientId::new(999));

        let client = session.get_client(resolved).await.unwrap().unwrap();
        assert_eq!(client.first_name.as_deref(), Some("Unknown"));
        assert_eq!(client.last_name.as_deref(), Some("Unknown"));
        assert!(client.email.is_none());
    }

    #[tokio::test]
    async fn test_absent_provider_gets_placeholder() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut session = store.begin(SessionMode::Write).await.unwrap();

        let resolved = AutoRepairPolicy
            .resolve_provider(session.as_mut(), None)
            .await
            .unwrap();
        let provider = session.get_provider(resolved).await.unwrap().unwrap();
        assert_eq!(provider.first_name.as_deref(), Some("Unknown"));
        assert!(provider.specialty.is_none());
    }

    #[tokio::test]
    async fn test_repeated_misses_create_separate_placeholders() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut session = store.begin(SessionMode::Write).await.unwrap();

        let first = AutoRepairPolicy
            .resolve_client(session.as_mut(), Some(ClientId::new(500)))
            .await
            .unwrap();
        let second = AutoRepairPolicy
            .resolve_client(session.as_mut(), Some(ClientId::new(500)))
            .await
            .unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_missing_billable_keeps_code() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut session = store.begin(SessionMode::Write).await.unwrap();
        let code = BillableCode::new("P100").unwrap();

        let resolved = AutoRepairPolicy
            .resolve_billable(session.as_mut(), &code)
            .await
            .unwrap();
        assert_eq!(resolved, code);

        let billable = session.get_billable(&code).await.unwrap().unwrap();
        assert_eq!(billable.description, "Auto created");
        assert_eq!(billable.cost, 0.0);
    }

    #[tokio::test]
    async fn test_existing_billable_is_not_overwritten() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let mut session = store.begin(SessionMode::Write).await.unwrap();
        let code = BillableCode::new("D1110").unwrap();
        session
            .insert_billable(&Billable::new(code.clone(), "Prophylaxis", 95.0))
            .await
            .unwrap();

        AutoRepairPolicy
            .resolve_billable(session.as_mut(), &code)
            .await
            .unwrap();

        let billable = session.get_billable(&code).await.unwrap().unwrap();
        assert_eq!(billable.description, "Prophylaxis");
        assert_eq!(billable.cost, 95.0);
    }
}
