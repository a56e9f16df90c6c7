//! Reference resolution for visit writes
//!
//! A visit names a client, a provider and one billable per detail line. Before
//! any visit row is written each reference goes through a [`ReferencePolicy`],
//! which either confirms it, substitutes a freshly created placeholder
//! ([`AutoRepairPolicy`]) or refuses the write ([`StrictPolicy`]).
//!
//! Policies run inside the caller's write session, so a placeholder created
//! for a visit that later fails is rolled back with it.

pub mod auto_repair;
pub mod strict;

pub use auto_repair::AutoRepairPolicy;
pub use strict::StrictPolicy;

use crate::adapters::database::StoreSession;
use crate::config::ReferencePolicyKind;
use crate::domain::{BillableCode, ClientId, ProviderId, ReferenceKind, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Strategy applied to every parent reference of a visit
#[async_trait]
pub trait ReferencePolicy: Send + Sync {
    /// Returns the client id the visit row must reference
    async fn resolve_client(
        &self,
        session: &mut dyn StoreSession,
        requested: Option<ClientId>,
    ) -> Result<ClientId>;

    /// Returns the provider id the visit row must reference
    async fn resolve_provider(
        &self,
        session: &mut dyn StoreSession,
        requested: Option<ProviderId>,
    ) -> Result<ProviderId>;

    /// Returns the billable code a detail line must reference
    async fn resolve_billable(
        &self,
        session: &mut dyn StoreSession,
        code: &BillableCode,
    ) -> Result<BillableCode>;

    /// Policy name for logs
    fn name(&self) -> &'static str;
}

/// A reference of any kind, before or after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKey {
    Client(Option<ClientId>),
    Provider(Option<ProviderId>),
    Billable(BillableCode),
}

impl ReferenceKey {
    /// Kind of parent row the key points at
    pub fn kind(&self) -> ReferenceKind {
        match self {
            ReferenceKey::Client(_) => ReferenceKind::Client,
            ReferenceKey::Provider(_) => ReferenceKind::Provider,
            ReferenceKey::Billable(_) => ReferenceKind::Billable,
        }
    }
}

/// Resolve one reference of any kind through a policy
///
/// The returned key always carries a value: client and provider keys come
/// back as `Some(id)` of an existing row.
pub async fn resolve_reference(
    policy: &dyn ReferencePolicy,
    session: &mut dyn StoreSession,
    key: ReferenceKey,
) -> Result<ReferenceKey> {
    Ok(match key {
        ReferenceKey::Client(id) => {
            ReferenceKey::Client(Some(policy.resolve_client(session, id).await?))
        }
        ReferenceKey::Provider(id) => {
            ReferenceKey::Provider(Some(policy.resolve_provider(session, id).await?))
        }
        ReferenceKey::Billable(code) => {
            ReferenceKey::Billable(policy.resolve_billable(session, &code).await?)
        }
    })
}

/// Build the policy selected in `[visits] reference_policy`
pub fn policy_for(kind: ReferencePolicyKind) -> Arc<dyn ReferencePolicy> {
    match kind {
        ReferencePolicyKind::AutoRepair => Arc::new(AutoRepairPolicy),
        ReferencePolicyKind::Strict => Arc::new(StrictPolicy),
    }
}

/// Text used for a requested key in logs and errors
pub(crate) fn describe<T: std::fmt::Display>(requested: Option<T>) -> String {
    requested
        .map(|key| key.to_string())
        .unwrap_or_else(|| "<none>".to_string())
}
