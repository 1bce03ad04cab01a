//! Full passes through the engine with a SQLite record store.

mod common;

use std::sync::Arc;

use common::{ec2, vpc};
use quotakeeper::adapters::memory::InMemoryQuotaClient;
use quotakeeper::adapters::sqlite::{create_migrated_test_pool, SqliteRecordRepository};
use quotakeeper::domain::errors::DomainError;
use quotakeeper::domain::models::{Config, Manifest, RequestStatus};
use quotakeeper::domain::ports::RecordRepository;
use quotakeeper::infrastructure::Engine;
use tokio_util::sync::CancellationToken;

const MANIFEST: &str = r"
resources:
  - service_code: vpc
    quota_code: L-F678F1CE
    value: 75
  - service_code: ec2
    quota_code: L-1216C47A
    value: 10
";

async fn setup(
    allow_increase_requests: bool,
) -> (Arc<InMemoryQuotaClient>, Arc<SqliteRecordRepository>, Engine) {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create test database");
    let client = Arc::new(InMemoryQuotaClient::new());
    let records = Arc::new(SqliteRecordRepository::new(pool));

    let mut config = Config::default();
    config.reconcile.allow_increase_requests = allow_increase_requests;
    // A zero budget checks status once per pass.
    config.poller.poll_interval_secs = 1;
    config.poller.max_wait_secs = 0;

    let engine = Engine::new(client.clone(), records.clone(), &config);
    (client, records, engine)
}

#[tokio::test]
async fn test_pending_increase_survives_in_record_store() {
    let (client, records, engine) = setup(true).await;
    client.insert_service("vpc", "Amazon VPC").await;
    client.insert_quota(vpc(), 70.0).await;
    client.insert_quota(ec2(), 32.0).await;
    client
        .set_status_script(vec![RequestStatus::CaseOpened])
        .await;
    let desired = Manifest::from_yaml(MANIFEST).unwrap().desired().unwrap();

    let first = engine
        .runner()
        .run(desired.clone(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.converged(), 1);
    assert_eq!(first.pending(), 1);
    let request_id = records
        .get(&vpc())
        .await
        .unwrap()
        .and_then(|r| r.pending)
        .map(|p| p.request_id)
        .expect("pending request recorded");

    client
        .set_request_script(&request_id, vec![RequestStatus::Approved])
        .await;
    let second = engine
        .runner()
        .run(desired, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(second.converged(), 2);
    assert_eq!(client.submit_count(), 1);
    let stored = records.get(&vpc()).await.unwrap().unwrap();
    assert_eq!(stored.last_applied_value, 75.0);
    assert!(stored.pending.is_none());
}

#[tokio::test]
async fn test_default_config_never_submits() {
    let (client, records, engine) = setup(false).await;
    client.insert_service("vpc", "Amazon VPC").await;
    client.insert_quota(vpc(), 70.0).await;
    client.insert_quota(ec2(), 32.0).await;
    let desired = Manifest::from_yaml(MANIFEST).unwrap().desired().unwrap();

    let report = engine
        .runner()
        .run(desired, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    let failure = report
        .results
        .iter()
        .find(|r| r.identity == vpc())
        .unwrap();
    assert!(matches!(
        failure.outcome,
        Err(DomainError::IncreaseNotPermitted { .. })
    ));
    assert_eq!(client.submit_count(), 0);
    assert_eq!(records.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_import_then_forget() {
    let (client, records, engine) = setup(false).await;
    client.insert_quota(vpc(), 70.0).await;

    let imported = engine
        .controller()
        .import("vpc/L-F678F1CE")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(imported.last_applied_value, 70.0);
    assert_eq!(records.list().await.unwrap().len(), 1);

    assert!(engine.controller().delete(&vpc()).await.unwrap());
    assert!(records.list().await.unwrap().is_empty());
    assert_eq!(client.current_value(&vpc()).await, Some(70.0));
}

#[tokio::test]
async fn test_probe_lists_services() {
    let (client, _records, engine) = setup(false).await;
    client.insert_service("vpc", "Amazon VPC").await;

    let services = engine.probe().check().await.unwrap();

    assert_eq!(services.len(), 1);
    assert_eq!(client.probe_count(), 1);
}
