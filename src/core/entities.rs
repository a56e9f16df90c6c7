//! Client, provider and billable CRUD
//!
//! Thin wrappers that run one repository call per session. None of these
//! operations repair references; deleting a row still referenced by a visit
//! fails with a constraint violation.

use crate::adapters::database::{SessionMode, VisitStore};
use crate::core::transaction::complete;
use crate::domain::{
    Billable, BillableCode, BillableUpdate, Client, ClientId, NewClient, NewProvider, Provider,
    ProviderId, Result,
};
use std::sync::Arc;

/// CRUD over the parent entities of a visit
#[derive(Clone)]
pub struct EntityService {
    store: Arc<dyn VisitStore>,
}

impl EntityService {
    pub fn new(store: Arc<dyn VisitStore>) -> Self {
        Self { store }
    }

    pub async fn create_client(&self, client: &NewClient) -> Result<ClientId> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = session.insert_client(client).await;
        let id = complete(session, outcome).await?;
        tracing::info!(client_id = %id, "Client created");
        Ok(id)
    }

    pub async fn client_exists(&self, id: ClientId) -> Result<bool> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = session.client_exists(id).await;
        complete(session, outcome).await
    }

    pub async fn get_client(&self, id: ClientId) -> Result<Option<Client>> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = session.get_client(id).await;
        complete(session, outcome).await
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = session.list_clients().await;
        complete(session, outcome).await
    }

    /// Replace every field of a client; `None` when the id does not exist
    pub async fn update_client(&self, id: ClientId, client: &NewClient) -> Result<Option<Client>> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = async {
            if !session.update_client(id, client).await? {
                return Ok(None);
            }
            session.get_client(id).await
        }
        .await;
        complete(session, outcome).await
    }

    /// Delete a client; returns the number of rows removed (0 or 1)
    pub async fn delete_client(&self, id: ClientId) -> Result<u64> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = session.delete_client(id).await;
        let deleted = complete(session, outcome).await?;
        tracing::info!(client_id = %id, deleted, "Client deleted");
        Ok(deleted)
    }

    pub async fn create_provider(&self, provider: &NewProvider) -> Result<ProviderId> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = session.insert_provider(provider).await;
        let id = complete(session, outcome).await?;
        tracing::info!(provider_id = %id, "Provider created");
        Ok(id)
    }

    pub async fn provider_exists(&self, id: ProviderId) -> Result<bool> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = session.provider_exists(id).await;
        complete(session, outcome).await
    }

    pub async fn get_provider(&self, id: ProviderId) -> Result<Option<Provider>> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = session.get_provider(id).await;
        complete(session, outcome).await
    }

    pub async fn list_providers(&self) -> Result<Vec<Provider>> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = session.list_providers().await;
        complete(session, outcome).await
    }

    /// Replace every field of a provider; `None` when the id does not exist
    pub async fn update_provider(
        &self,
        id: ProviderId,
        provider: &NewProvider,
    ) -> Result<Option<Provider>> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = async {
            if !session.update_provider(id, provider).await? {
                return Ok(None);
            }
            session.get_provider(id).await
        }
        .await;
        complete(session, outcome).await
    }

    pub async fn delete_provider(&self, id: ProviderId) -> Result<u64> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = session.delete_provider(id).await;
        let deleted = complete(session, outcome).await?;
        tracing::info!(provider_id = %id, deleted, "Provider deleted");
        Ok(deleted)
    }

    /// Insert a billable; an existing code is a constraint violation
    pub async fn create_billable(&self, billable: &Billable) -> Result<BillableCode> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = session.insert_billable(billable).await;
        complete(session, outcome).await?;
        tracing::info!(code = %billable.billable_code, "Billable created");
        Ok(billable.billable_code.clone())
    }

    pub async fn billable_exists(&self, code: &BillableCode) -> Result<bool> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = session.billable_exists(code).await;
        complete(session, outcome).await
    }

    pub async fn get_billable(&self, code: &BillableCode) -> Result<Option<Billable>> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = session.get_billable(code).await;
        complete(session, outcome).await
    }

    pub async fn list_billables(&self) -> Result<Vec<Billable>> {
        let mut session = self.store.begin(SessionMode::Read).await?;
        let outcome = session.list_billables().await;
        complete(session, outcome).await
    }

    pub async fn update_billable(
        &self,
        code: &BillableCode,
        update: &BillableUpdate,
    ) -> Result<Option<Billable>> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = async {
            if !session.update_billable(code, update).await? {
                return Ok(None);
            }
            session.get_billable(code).await
        }
        .await;
        complete(session, outcome).await
    }

    pub async fn delete_billable(&self, code: &BillableCode) -> Result<u64> {
        let mut session = self.store.begin(SessionMode::Write).await?;
        let outcome = session.delete_billable(code).await;
        let deleted = complete(session, outcome).await?;
        tracing::info!(code = %code, deleted, "Billable deleted");
        Ok(deleted)
    }
}
