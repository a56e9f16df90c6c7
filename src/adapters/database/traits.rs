//! Store abstraction traits
//!
//! A [`VisitStore`] hands out [`StoreSession`]s. A session is one transaction
//! on one connection: every repository call made through it sees the writes
//! made earlier through it, and nothing is visible to other sessions until
//! [`StoreSession::commit`]. Dropping a session without committing rolls it
//! back.

use crate::domain::{
    Billable, BillableCode, BillableUpdate, Client, ClientId, ImageId, NewClient, NewProvider,
    NewVisitImage, Provider, ProviderId, Result, Visit, VisitDetail, VisitDetailId, VisitFields,
    VisitId, VisitImage, VisitImageMeta,
};
use async_trait::async_trait;
use serde::Serialize;

/// What a session is going to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Reads only
    Read,
    /// Reads and writes; write sessions are serialized store-wide
    Write,
}

/// Row counts per table, reported by `status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub clients: u64,
    pub providers: u64,
    pub billables: u64,
    pub visits: u64,
    pub visit_details: u64,
    pub visit_images: u64,
}

/// Client rows
#[async_trait]
pub trait ClientRepository: Send {
    /// True when a row with this id exists
    async fn client_exists(&mut self, id: ClientId) -> Result<bool>;

    /// Fetch one client
    async fn get_client(&mut self, id: ClientId) -> Result<Option<Client>>;

    /// All clients in id order
    async fn list_clients(&mut self) -> Result<Vec<Client>>;

    /// Insert and return the generated id
    async fn insert_client(&mut self, client: &NewClient) -> Result<ClientId>;

    /// Rewrite every column; false when the id does not exist
    async fn update_client(&mut self, id: ClientId, client: &NewClient) -> Result<bool>;

    /// Returns the number of rows removed
    async fn delete_client(&mut self, id: ClientId) -> Result<u64>;
}

/// Provider rows
#[async_trait]
pub trait ProviderRepository: Send {
    async fn provider_exists(&mut self, id: ProviderId) -> Result<bool>;

    async fn get_provider(&mut self, id: ProviderId) -> Result<Option<Provider>>;

    async fn list_providers(&mut self) -> Result<Vec<Provider>>;

    async fn insert_provider(&mut self, provider: &NewProvider) -> Result<ProviderId>;

    async fn update_provider(&mut self, id: ProviderId, provider: &NewProvider) -> Result<bool>;

    async fn delete_provider(&mut self, id: ProviderId) -> Result<u64>;
}

/// Billable rows, keyed by code
#[async_trait]
pub trait BillableRepository: Send {
    async fn billable_exists(&mut self, code: &BillableCode) -> Result<bool>;

    async fn get_billable(&mut self, code: &BillableCode) -> Result<Option<Billable>>;

    /// All billables in code order
    async fn list_billables(&mut self) -> Result<Vec<Billable>>;

    /// Plain insert; a duplicate code is a constraint violation
    async fn insert_billable(&mut self, billable: &Billable) -> Result<()>;

    /// Insert unless the code is taken
    ///
    /// Returns true when a row was written. Implemented as a single
    /// conditional statement so it never fails on a concurrent insert.
    async fn insert_billable_if_absent(&mut self, billable: &Billable) -> Result<bool>;

    /// Insert, or replace description and cost of an existing code
    async fn upsert_billable(&mut self, billable: &Billable) -> Result<()>;

    async fn update_billable(
        &mut self,
        code: &BillableCode,
        update: &BillableUpdate,
    ) -> Result<bool>;

    async fn delete_billable(&mut self, code: &BillableCode) -> Result<u64>;
}

/// Visit rows and their children
#[async_trait]
pub trait VisitRepository: Send {
    async fn insert_visit(&mut self, fields: &VisitFields) -> Result<VisitId>;

    async fn get_visit(&mut self, id: VisitId) -> Result<Option<Visit>>;

    /// All visits in id order, without children
    async fn list_visits(&mut self) -> Result<Vec<Visit>>;

    async fn update_visit(&mut self, id: VisitId, fields: &VisitFields) -> Result<bool>;

    async fn insert_visit_detail(
        &mut self,
        visit_id: VisitId,
        code: &BillableCode,
        quantity: i64,
    ) -> Result<VisitDetailId>;

    /// Detail lines of a visit in primary-key order
    async fn list_visit_details(&mut self, visit_id: VisitId) -> Result<Vec<VisitDetail>>;

    async fn insert_visit_image(
        &mut self,
        visit_id: VisitId,
        image: &NewVisitImage,
    ) -> Result<ImageId>;

    /// Image metadata of a visit in primary-key order; payloads are not read
    async fn list_visit_images(&mut self, visit_id: VisitId) -> Result<Vec<VisitImageMeta>>;

    /// One image including its payload
    async fn get_visit_image(&mut self, id: ImageId) -> Result<Option<VisitImage>>;

    async fn delete_visit_details(&mut self, visit_id: VisitId) -> Result<u64>;

    async fn delete_visit_images(&mut self, visit_id: VisitId) -> Result<u64>;

    async fn delete_visit(&mut self, id: VisitId) -> Result<u64>;
}

/// One transaction against the store
#[async_trait]
pub trait StoreSession:
    ClientRepository + ProviderRepository + BillableRepository + VisitRepository
{
    /// Mode the session was opened with
    fn mode(&self) -> SessionMode;

    /// Make every write of this session durable
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every write of this session
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Store backend
///
/// Implementations are shared behind an `Arc` and hand out one session per
/// logical operation.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Run a trivial statement to prove the store is reachable
    async fn test_connection(&self) -> Result<()>;

    /// Create the tables if they do not exist
    async fn ensure_schema(&self) -> Result<()>;

    /// Open a transaction
    async fn begin(&self, mode: SessionMode) -> Result<Box<dyn StoreSession>>;

    /// Row counts of every table
    async fn table_counts(&self) -> Result<TableCounts>;

    /// Short backend name for logs and status output
    fn backend_name(&self) -> &'static str;
}
