//! Submission-time validation tests for packout bins: failures must occur
//! before any database or gateway traffic.

use async_trait::async_trait;
use chrono::Utc;
use packhouse_api::{
    errors::ServiceError,
    events::EventSender,
    services::{
        automation::AutomationService,
        bins::{BinService, UpsertBinBatchInput, UpsertBinInput},
        boms::BomService,
    },
    unleashed::{
        AdjustmentInfo, AdjustmentReason, AutomationGateway, PostedAdjustment, Product,
        ProductCatalog, StockAdjustmentGateway, StockAdjustmentLine,
    },
};
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

struct NoTrafficCatalog;

#[async_trait]
impl ProductCatalog for NoTrafficCatalog {
    async fn all_products(&self) -> Result<Vec<Product>, ServiceError> {
        panic!("validation failures must not reach the product catalog")
    }
}

struct NoTrafficGateway;

#[async_trait]
impl StockAdjustmentGateway for NoTrafficGateway {
    async fn post_adjustment(
        &self,
        _lines: Vec<StockAdjustmentLine>,
        _location: &str,
        _reason: AdjustmentReason,
        _idempotency_key: &str,
    ) -> Result<PostedAdjustment, ServiceError> {
        panic!("validation failures must not reach the posting gateway")
    }

    async fn adjustment_status(&self, _id: &str) -> Result<AdjustmentInfo, ServiceError> {
        panic!("validation failures must not reach the status gateway")
    }
}

struct NoTrafficAutomation;

#[async_trait]
impl AutomationGateway for NoTrafficAutomation {
    async fn trigger(&self, _target: i64) -> Result<u16, ServiceError> {
        panic!("validation failures must not reach the automation gateway")
    }
}

fn bin_service(db: DatabaseConnection) -> BinService {
    let db = Arc::new(db);
    let (tx, _rx) = mpsc::channel(16);
    let events = Arc::new(EventSender::new(tx));
    let boms = Arc::new(BomService::new(db.clone(), events.clone()));
    let automation = Arc::new(AutomationService::new(
        db.clone(),
        events.clone(),
        Arc::new(NoTrafficAutomation),
        3,
    ));
    BinService::new(
        db,
        events,
        boms,
        Arc::new(NoTrafficCatalog),
        Arc::new(NoTrafficGateway),
        automation,
    )
}

fn base_input() -> UpsertBinInput {
    UpsertBinInput {
        id: None,
        bom_id: Uuid::new_v4(),
        total_bins_used: dec!(5),
        batch_id: "batch-guid".into(),
        batch_name: "PO1".into(),
        batch_location: "W1".into(),
        custom_batch: "RUN-42".into(),
        staff_count: 3,
        time_start: Utc::now(),
        time_finish: Utc::now(),
        created_at: None,
        finished_goods: vec![],
        batches: vec![
            UpsertBinBatchInput {
                batch_id: "b1".into(),
                batch_name: "B1".into(),
                batch_location: "W1".into(),
                quantity: dec!(3),
            },
            UpsertBinBatchInput {
                batch_id: "b2".into(),
                batch_name: "B2".into(),
                batch_location: "W1".into(),
                quantity: dec!(2),
            },
        ],
    }
}

fn empty_db() -> DatabaseConnection {
    // No results appended: any query would fail the test, proving
    // validation happened before persistence.
    MockDatabase::new(DatabaseBackend::Sqlite).into_connection()
}

#[tokio::test]
async fn mismatched_batch_quantities_are_rejected() {
    let service = bin_service(empty_db());
    let mut input = base_input();
    input.batches[1].quantity = dec!(1);

    let err = service.upsert_bin(input).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn missing_custom_batch_is_rejected() {
    let service = bin_service(empty_db());
    let mut input = base_input();
    input.custom_batch = "  ".into();

    let err = service.upsert_bin(input).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn custom_batch_with_comma_is_rejected() {
    let service = bin_service(empty_db());
    let mut input = base_input();
    input.custom_batch = "RUN,42".into();

    let err = service.upsert_bin(input).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn at_least_one_batch_is_required() {
    let service = bin_service(empty_db());
    let mut input = base_input();
    input.batches.clear();

    let err = service.upsert_bin(input).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
