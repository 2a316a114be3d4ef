//! Tests for status polling: uppercased status storage, at-most-once
//! writes and per-record failure isolation during a sweep.

use async_trait::async_trait;
use chrono::Utc;
use packhouse_api::{
    entities::{bin, dispatch},
    errors::ServiceError,
    events::EventSender,
    models::PostingState,
    services::status_poll::StatusPollService,
    unleashed::{
        AdjustmentInfo, AdjustmentReason, PostedAdjustment, StockAdjustmentGateway,
        StockAdjustmentLine,
    },
};
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Gateway stub serving canned statuses per adjustment id; unknown ids
/// fail like a network error would.
struct StatusStub {
    statuses: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StatusStub {
    fn new(statuses: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            statuses: statuses
                .iter()
                .map(|(id, status)| (id.to_string(), status.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockAdjustmentGateway for StatusStub {
    async fn post_adjustment(
        &self,
        _lines: Vec<StockAdjustmentLine>,
        _location: &str,
        _reason: AdjustmentReason,
        _idempotency_key: &str,
    ) -> Result<PostedAdjustment, ServiceError> {
        unreachable!("polling never posts")
    }

    async fn adjustment_status(&self, id: &str) -> Result<AdjustmentInfo, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.statuses.get(id) {
            Some(status) => Ok(AdjustmentInfo {
                adjustment_number: "SA-0000123".to_string(),
                status: status.clone(),
                guid: id.to_string(),
                created_on: None,
                created_by: None,
                last_modified_by: Some("workflow".to_string()),
                last_modified_on: None,
            }),
            None => Err(ServiceError::ExternalServiceError(format!(
                "status fetch failed for {}",
                id
            ))),
        }
    }
}

fn posted_bin(adjustment_id: &str, external_status: Option<&str>) -> bin::Model {
    let now = Utc::now();
    bin::Model {
        id: Uuid::new_v4(),
        bin_number: 10001,
        bom_id: Uuid::new_v4(),
        total_bins_used: dec!(5),
        batch_id: "batch".into(),
        batch_name: "PO1".into(),
        batch_location: "W1".into(),
        custom_batch: "C1".into(),
        staff_count: 2,
        time_start: now,
        time_finish: now,
        posting_state: PostingState::Posted,
        posting_attempts: 1,
        adjustment_number: Some("SA-0000123".into()),
        adjustment_id: Some(adjustment_id.into()),
        external_status: external_status.map(str::to_string),
        external_modified_by: None,
        external_modified_on: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn lowercase_status_is_stored_uppercased() {
    let record = posted_bin("guid-1", None);
    let mut updated = record.clone();
    updated.external_status = Some("COMPLETED".to_string());
    updated.posting_state = PostingState::Approved;

    let db = MockDatabase::new(DatabaseBackend::Sqlite)
        // Bin candidates
        .append_query_results(vec![vec![record]])
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        // Updated bin read back
        .append_query_results(vec![vec![updated]])
        // Dispatch candidates: none
        .append_query_results::<dispatch::Model, _, _>(vec![vec![]])
        .into_connection();

    let (tx, _rx) = mpsc::channel(16);
    let gateway = StatusStub::new(&[("guid-1", "completed")]);
    let service = StatusPollService::new(
        Arc::new(db),
        Arc::new(EventSender::new(tx)),
        gateway.clone(),
    );

    let report = service.sweep().await.unwrap();

    assert_eq!(report.checked, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn unchanged_status_is_not_rewritten() {
    let record = posted_bin("guid-1", Some("PARKED"));

    let db = MockDatabase::new(DatabaseBackend::Sqlite)
        .append_query_results(vec![vec![record]])
        .append_query_results::<dispatch::Model, _, _>(vec![vec![]])
        .into_connection();

    let (tx, _rx) = mpsc::channel(16);
    let gateway = StatusStub::new(&[("guid-1", "Parked")]);
    let service = StatusPollService::new(
        Arc::new(db),
        Arc::new(EventSender::new(tx)),
        gateway,
    );

    let report = service.sweep().await.unwrap();

    assert_eq!(report.checked, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn one_failing_record_does_not_abort_the_sweep() {
    let failing = posted_bin("guid-unknown", None);
    let succeeding = posted_bin("guid-2", None);
    let mut updated = succeeding.clone();
    updated.external_status = Some("PARKED".to_string());

    let db = MockDatabase::new(DatabaseBackend::Sqlite)
        .append_query_results(vec![vec![failing, succeeding]])
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results(vec![vec![updated]])
        .append_query_results::<dispatch::Model, _, _>(vec![vec![]])
        .into_connection();

    let (tx, _rx) = mpsc::channel(16);
    let gateway = StatusStub::new(&[("guid-2", "Parked")]);
    let service = StatusPollService::new(
        Arc::new(db),
        Arc::new(EventSender::new(tx)),
        gateway.clone(),
    );

    let report = service.sweep().await.unwrap();

    assert_eq!(report.checked, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(gateway.calls(), 2);
}
