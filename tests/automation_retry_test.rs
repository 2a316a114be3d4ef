//! Tests for the bounded-retry automation trigger: the retry budget, the
//! silent-exhaustion contract and the attempt ledger.

use async_trait::async_trait;
use chrono::Utc;
use packhouse_api::{
    entities::automation_attempt,
    errors::ServiceError,
    events::EventSender,
    services::automation::AutomationService,
    unleashed::AutomationGateway,
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::mpsc;

/// Gateway stub returning a scripted sequence of outcomes; repeats the
/// last entry once the script is exhausted.
struct ScriptedGateway {
    calls: AtomicUsize,
    script: Vec<Result<u16, ()>>,
}

impl ScriptedGateway {
    fn new(script: Vec<Result<u16, ()>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AutomationGateway for ScriptedGateway {
    async fn trigger(&self, _target: i64) -> Result<u16, ServiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .get(call)
            .or_else(|| self.script.last())
            .copied()
            .unwrap_or(Err(()));
        outcome.map_err(|_| ServiceError::ExternalServiceError("connection refused".into()))
    }
}

fn service_with(gateway: Arc<ScriptedGateway>) -> AutomationService {
    let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
    let (tx, _rx) = mpsc::channel(16);
    AutomationService::new(
        Arc::new(db),
        Arc::new(EventSender::new(tx)),
        gateway,
        3,
    )
}

#[tokio::test]
async fn always_failing_trigger_is_called_exactly_three_times() {
    let gateway = ScriptedGateway::new(vec![Ok(500)]);
    let service = service_with(gateway.clone());

    let outcome = service.trigger(124).await;

    assert_eq!(outcome, None);
    assert_eq!(gateway.calls(), 3);
}

#[tokio::test]
async fn trigger_stops_on_first_success() {
    let gateway = ScriptedGateway::new(vec![Ok(502), Ok(200)]);
    let service = service_with(gateway.clone());

    let outcome = service.trigger(124).await;

    assert_eq!(outcome, Some(200));
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn transport_errors_consume_the_same_budget() {
    let gateway = ScriptedGateway::new(vec![Err(())]);
    let service = service_with(gateway.clone());

    let outcome = service.trigger(99).await;

    assert_eq!(outcome, None);
    assert_eq!(gateway.calls(), 3);
}

#[tokio::test]
async fn manual_trigger_creates_a_ledger_row() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Sqlite)
        // No existing ledger row for this target
        .append_query_results::<automation_attempt::Model, _, _>(vec![vec![]])
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        // Inserted row read back
        .append_query_results(vec![vec![automation_attempt::Model {
            number: "124".to_string(),
            attempts: 1,
            created_at: now,
            updated_at: now,
        }]])
        .into_connection();

    let (tx, _rx) = mpsc::channel(16);
    let gateway = ScriptedGateway::new(vec![Ok(200)]);
    let service = AutomationService::new(
        Arc::new(db),
        Arc::new(EventSender::new(tx)),
        gateway,
        3,
    );

    let result = service.manual_trigger(124).await;
    assert!(result.is_ok());
}
