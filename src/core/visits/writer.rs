//! Aggregate writer

use super::reader::read_aggregate;
use crate::adapters::database::StoreSession;
use crate::core::repair::ReferencePolicy;
use crate::domain::{BillableCode, DatabaseError, NewVisit, Result, VisitAggregate};

/// Write a visit with its details and images inside `session`
///
/// Every reference is resolved before the visit row goes in, and the visit row
/// goes in before any child. The aggregate is read back through the same
/// session, so it reflects exactly what this call wrote. Committing is left to
/// the caller.
pub async fn write_aggregate(
    policy: &dyn ReferencePolicy,
    session: &mut dyn StoreSession,
    visit: &NewVisit,
) -> Result<VisitAggregate> {
    let client_id = policy.resolve_client(session, visit.client_id).await?;
    let provider_id = policy.resolve_provider(session, visit.provider_id).await?;

    let mut codes: Vec<BillableCode> = Vec::with_capacity(visit.details.len());
    for detail in &visit.details {
        codes.push(policy.resolve_billable(session, &detail.billable_code).await?);
    }

    let visit_id = session
        .insert_visit(&visit.fields(client_id, provider_id))
        .await?;

    for (detail, code) in visit.details.iter().zip(&codes) {
        session
            .insert_visit_detail(visit_id, code, detail.effective_quantity())
            .await?;
    }

    for image in &visit.images {
        session.insert_visit_image(visit_id, image).await?;
    }

    tracing::debug!(
        visit_id = %visit_id,
        client_id = %client_id,
        provider_id = %provider_id,
        policy = policy.name(),
        "Visit rows inserted"
    );

    read_aggregate(session, visit_id).await?.ok_or_else(|| {
        DatabaseError::QueryFailed(format!("Visit {} not readable after insert", visit_id)).into()
    })
}
