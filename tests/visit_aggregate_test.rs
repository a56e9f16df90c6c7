//! Integration tests for the visit aggregate: create, read, delete and
//! transactional rollback

use async_trait::async_trait;
use practice_store::adapters::database::{SessionMode, StoreSession, TableCounts, VisitStore};
use practice_store::adapters::sqlite::SqliteStore;
use practice_store::config::SqliteConfig;
use practice_store::core::entities::EntityService;
use practice_store::core::repair::{AutoRepairPolicy, ReferencePolicy, StrictPolicy};
use practice_store::core::visits::VisitService;
use practice_store::domain::{
    BillableCode, ClientId, NewClient, NewProvider, NewVisit, PracticeError, ProviderId,
    ReferenceKind, Result, VisitId,
};
use std::sync::Arc;
use tempfile::TempDir;

fn code(s: &str) -> BillableCode {
    BillableCode::new(s).unwrap()
}

async fn setup() -> (Arc<SqliteStore>, VisitService, EntityService) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let visits = VisitService::new(store.clone(), Arc::new(AutoRepairPolicy));
    let entities = EntityService::new(store.clone());
    (store, visits, entities)
}

/// Resolves people normally but hands back a billable code that was never written
struct DanglingBillablePolicy;

#[async_trait]
impl ReferencePolicy for DanglingBillablePolicy {
    async fn resolve_client(
        &self,
        session: &mut dyn StoreSession,
        requested: Option<ClientId>,
    ) -> Result<ClientId> {
        AutoRepairPolicy.resolve_client(session, requested).await
    }

    async fn resolve_provider(
        &self,
        session: &mut dyn StoreSession,
        requested: Option<ProviderId>,
    ) -> Result<ProviderId> {
        AutoRepairPolicy.resolve_provider(session, requested).await
    }

    async fn resolve_billable(
        &self,
        _session: &mut dyn StoreSession,
        _code: &BillableCode,
    ) -> Result<BillableCode> {
        Ok(code("NEVER-WRITTEN"))
    }

    fn name(&self) -> &'static str {
        "dangling_billable"
    }
}

#[tokio::test]
async fn test_create_visit_with_existing_references() {
    let (store, visits, entities) = setup().await;
    let client = entities
        .create_client(&NewClient::named("Ada", "Lovelace"))
        .await
        .unwrap();
    let provider = entities
        .create_provider(&NewProvider::named("Grace", "Hopper"))
        .await
        .unwrap();

    let created = visits
        .create_visit(
            &NewVisit::new(Some(client), Some(provider))
                .with_date("03/01/2024")
                .paid(true)
                .with_notes("follow-up in 6 months"),
        )
        .await
        .unwrap();

    assert_eq!(created.visit.client_id, client);
    assert_eq!(created.visit.provider_id, provider);
    assert_eq!(created.visit.visit_date.as_deref(), Some("03/01/2024"));
    assert_eq!(created.visit.notes.as_deref(), Some("follow-up in 6 months"));

    let counts = store.table_counts().await.unwrap();
    assert_eq!(counts.clients, 1);
    assert_eq!(counts.providers, 1);
    assert_eq!(counts.visits, 1);
}

#[tokio::test]
async fn test_duplicate_codes_become_separate_lines() {
    let (_store, visits, _entities) = setup().await;

    let created = visits
        .create_visit(
            &NewVisit::default()
                .with_detail(code("X1"), Some(2))
                .with_detail(code("X1"), None),
        )
        .await
        .unwrap();

    assert_eq!(created.details.len(), 2);
    assert_eq!(created.details[0].quantity, 2);
    assert_eq!(created.details[1].quantity, 1);
    assert_ne!(
        created.details[0].visit_detail_id,
        created.details[1].visit_detail_id
    );
    assert!(created
        .details
        .iter()
        .all(|d| d.billable_code == code("X1") && d.visit_id == created.id()));
}

#[tokio::test]
async fn test_get_visit_matches_created_aggregate() {
    let (_store, visits, _entities) = setup().await;
    let payload = vec![0x89, 0x50, 0x4e, 0x47, 0x00, 0xff];

    let created = visits
        .create_visit(
            &NewVisit::new(Some(ClientId::new(12)), Some(ProviderId::new(34)))
                .with_detail(code("D0120"), Some(1))
                .with_detail(code("D1110"), Some(3))
                .with_image("bitewing.png", "image/png", payload.clone())
                .with_image("notes.pdf", "application/pdf", b"%PDF".to_vec()),
        )
        .await
        .unwrap();

    let read = visits.get_visit(created.id()).await.unwrap().unwrap();
    assert_eq!(read, created);
    assert_eq!(read.images.len(), 2);
    assert_eq!(read.images[0].image_name, "bitewing.png");
    assert_eq!(read.images[1].image_type, "application/pdf");

    let json = serde_json::to_value(&read).unwrap();
    assert!(json["images"][0].get("ImageData").is_none());

    let image = visits.get_image(read.images[0].image_id).await.unwrap().unwrap();
    assert_eq!(image.image_data, payload);
}

#[tokio::test]
async fn test_get_unknown_visit_is_none() {
    let (_store, visits, _entities) = setup().await;
    assert!(visits.get_visit(VisitId::new(404)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_removes_children_then_visit() {
    let (store, visits, _entities) = setup().await;
    let created = visits
        .create_visit(
            &NewVisit::default()
                .with_detail(code("X1"), None)
                .with_detail(code("X2"), Some(4))
                .with_image("a.jpg", "image/jpeg", vec![1, 2, 3]),
        )
        .await
        .unwrap();

    let outcome = visits.delete_visit(created.id()).await.unwrap();
    assert_eq!(outcome.details, 2);
    assert_eq!(outcome.images, 1);
    assert_eq!(outcome.visits, 1);

    assert!(visits.get_visit(created.id()).await.unwrap().is_none());
    let mut session = store.begin(SessionMode::Read).await.unwrap();
    assert!(session.list_visit_details(created.id()).await.unwrap().is_empty());
    assert!(session.list_visit_images(created.id()).await.unwrap().is_empty());
    assert!(session
        .get_visit_image(created.images[0].image_id)
        .await
        .unwrap()
        .is_none());
    session.commit().await.unwrap();

    // Parents and billables stay behind
    let counts = store.table_counts().await.unwrap();
    assert_eq!(counts.clients, 1);
    assert_eq!(counts.billables, 2);
}

#[tokio::test]
async fn test_delete_unknown_visit_affects_nothing() {
    let (store, visits, _entities) = setup().await;
    visits.create_visit(&NewVisit::default()).await.unwrap();
    let before = store.table_counts().await.unwrap();

    let outcome = visits.delete_visit(VisitId::new(9_999)).await.unwrap();
    assert!(outcome.is_noop());
    assert_eq!(store.table_counts().await.unwrap(), before);
}

#[tokio::test]
async fn test_failed_create_leaves_no_trace() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let visits = VisitService::new(store.clone(), Arc::new(DanglingBillablePolicy));

    let err = visits
        .create_visit(
            &NewVisit::new(Some(ClientId::new(5)), None)
                .with_detail(code("X1"), Some(1))
                .with_image("a.jpg", "image/jpeg", vec![1]),
        )
        .await
        .unwrap_err();

    assert!(err.is_constraint_violation(), "unexpected error: {err}");
    assert_eq!(store.table_counts().await.unwrap(), TableCounts::default());
}

#[tokio::test]
async fn test_strict_policy_rejects_missing_client() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let entities = EntityService::new(store.clone());
    let provider = entities
        .create_provider(&NewProvider::named("Grace", "Hopper"))
        .await
        .unwrap();
    let visits = VisitService::new(store.clone(), Arc::new(StrictPolicy));

    let err = visits
        .create_visit(
            &NewVisit::new(Some(ClientId::new(77)), Some(provider))
                .with_detail(code("X1"), None),
        )
        .await
        .unwrap_err();

    match err {
        PracticeError::MissingReference { kind, key } => {
            assert_eq!(kind, ReferenceKind::Client);
            assert_eq!(key, "77");
        }
        other => panic!("unexpected error: {other}"),
    }

    let counts = store.table_counts().await.unwrap();
    assert_eq!(counts.providers, 1);
    assert_eq!(counts.clients, 0);
    assert_eq!(counts.billables, 0);
    assert_eq!(counts.visits, 0);
}

#[tokio::test]
async fn test_visits_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let config = SqliteConfig {
        path: dir.path().join("practice.sqlite").to_string_lossy().to_string(),
        busy_timeout_ms: 1_000,
    };

    let id = {
        let store = Arc::new(SqliteStore::open(&config).unwrap());
        store.ensure_schema().await.unwrap();
        let visits = VisitService::new(store, Arc::new(AutoRepairPolicy));
        visits
            .create_visit(&NewVisit::default().with_detail(code("X1"), None))
            .await
            .unwrap()
            .id()
    };

    let store = Arc::new(SqliteStore::open(&config).unwrap());
    let visits = VisitService::new(store, Arc::new(AutoRepairPolicy));
    let read = visits.get_visit(id).await.unwrap().unwrap();
    assert_eq!(read.details.len(), 1);
}

#[tokio::test]
async fn test_concurrent_creates_are_serialized() {
    let (store, visits, _entities) = setup().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let visits = visits.clone();
        handles.push(tokio::spawn(async move {
            visits
                .create_visit(&NewVisit::default().with_detail(code("SHARED"), None))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let counts = store.table_counts().await.unwrap();
    assert_eq!(counts.visits, 8);
    assert_eq!(counts.visit_details, 8);
    assert_eq!(counts.billables, 1);
}

#[tokio::test]
async fn test_list_visits_in_id_order() {
    let (_store, visits, _entities) = setup().await;
    let first = visits.create_visit(&NewVisit::default()).await.unwrap();
    let second = visits.create_visit(&NewVisit::default()).await.unwrap();

    let listed = visits.list_visits().await.unwrap();
    let ids: Vec<VisitId> = listed.iter().map(|v| v.visit_id).collect();
    assert_eq!(ids, vec![first.id(), second.id()]);
}
