use crate::{
    db::DbPool,
    entities::{
        bin, bin::Entity as BinEntity, bin_batch, bin_batch::Entity as BinBatchEntity,
        bin_finished_good, bin_finished_good::Entity as BinFinishedGoodEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::PostingState,
    services::{
        automation::{adjustment_target, AutomationService},
        boms::BomService,
        posting_idempotency_key,
        reconciliation::{batch_breakdown, expand_bin, resolve_movement_lines},
    },
    unleashed::{AdjustmentReason, ProductCatalog, StockAdjustmentGateway},
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// A bin with both association sets loaded.
#[derive(Debug, Clone, Serialize)]
pub struct BinDetail {
    pub bin: bin::Model,
    pub batches: Vec<bin_batch::Model>,
    pub finished_goods: Vec<bin_finished_good::Model>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertBinBatchInput {
    pub batch_id: String,
    pub batch_name: String,
    pub batch_location: String,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertBinFinishedGoodInput {
    pub finished_good_id: Uuid,
    pub finished_good_product_id: String,
    pub quantity: Decimal,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertBinInput {
    pub id: Option<Uuid>,
    pub bom_id: Uuid,
    pub total_bins_used: Decimal,
    pub batch_id: String,
    pub batch_name: String,
    pub batch_location: String,
    pub custom_batch: String,
    pub staff_count: i32,
    pub time_start: DateTime<Utc>,
    pub time_finish: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub finished_goods: Vec<UpsertBinFinishedGoodInput>,
    pub batches: Vec<UpsertBinBatchInput>,
}

/// Result of a successful posting.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub adjustment_number: String,
    pub adjustment_id: String,
    pub lines_posted: usize,
    /// External product ids that could not be resolved and were dropped
    pub dropped: Vec<String>,
}

/// Service managing packout runs and their posting lifecycle.
#[derive(Clone)]
pub struct BinService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    boms: Arc<BomService>,
    catalog: Arc<dyn ProductCatalog>,
    gateway: Arc<dyn StockAdjustmentGateway>,
    automation: Arc<AutomationService>,
}

impl BinService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        boms: Arc<BomService>,
        catalog: Arc<dyn ProductCatalog>,
        gateway: Arc<dyn StockAdjustmentGateway>,
        automation: Arc<AutomationService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            boms,
            catalog,
            gateway,
            automation,
        }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    /// Bins created on the given day, most recently updated first.
    #[instrument(skip(self))]
    pub async fn list_bins(&self, day: DateTime<Utc>) -> Result<Vec<BinDetail>, ServiceError> {
        let db = self.connection();
        let start = day
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or(day);
        let end = start + Duration::days(1);

        let bins = BinEntity::find()
            .filter(bin::Column::CreatedAt.gte(start))
            .filter(bin::Column::CreatedAt.lte(end))
            .order_by_desc(bin::Column::UpdatedAt)
            .all(db)
            .await?;

        let mut details = Vec::with_capacity(bins.len());
        for model in bins {
            let finished_goods = BinFinishedGoodEntity::find()
                .filter(bin_finished_good::Column::BinId.eq(model.id))
                .all(db)
                .await?;
            details.push(BinDetail {
                bin: model,
                batches: Vec::new(),
                finished_goods,
            });
        }

        Ok(details)
    }

    #[instrument(skip(self))]
    pub async fn get_bin(&self, bin_id: &Uuid) -> Result<Option<BinDetail>, ServiceError> {
        let db = self.connection();
        let Some(model) = BinEntity::find_by_id(*bin_id).one(db).await? else {
            return Ok(None);
        };

        let batches = BinBatchEntity::find()
            .filter(bin_batch::Column::BinId.eq(model.id))
            .all(db)
            .await?;
        let finished_goods = BinFinishedGoodEntity::find()
            .filter(bin_finished_good::Column::BinId.eq(model.id))
            .all(db)
            .await?;

        Ok(Some(BinDetail {
            bin: model,
            batches,
            finished_goods,
        }))
    }

    /// Submission-time validation. Nothing external is called and nothing
    /// is persisted when this fails.
    fn validate_upsert(input: &UpsertBinInput) -> Result<(), ServiceError> {
        if input.custom_batch.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "a batch name is required".to_string(),
            ));
        }
        if input.custom_batch.contains(',') {
            return Err(ServiceError::ValidationError(
                "batch name cannot include character ','".to_string(),
            ));
        }
        if input.batches.is_empty() {
            return Err(ServiceError::ValidationError(
                "at least one source batch must be selected".to_string(),
            ));
        }

        let drawn: Decimal = input.batches.iter().map(|b| b.quantity).sum();
        if drawn != input.total_bins_used {
            return Err(ServiceError::ValidationError(format!(
                "batch quantities ({}) must equal total bins used ({})",
                drawn, input.total_bins_used
            )));
        }

        Ok(())
    }

    /// Creates or updates a bin with both association sets in one
    /// transaction. New bins get the next sequential bin number.
    #[instrument(skip(self, input))]
    pub async fn upsert_bin(&self, input: UpsertBinInput) -> Result<Uuid, ServiceError> {
        Self::validate_upsert(&input)?;

        let db = self.connection();
        let txn = db.begin().await?;
        let now = Utc::now();

        let bin_id = match input.id {
            Some(bin_id) => {
                let mut model = BinEntity::find_by_id(bin_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("bin {} not found", bin_id)))?;
                model.bom_id = input.bom_id;
                model.total_bins_used = input.total_bins_used;
                model.batch_id = input.batch_id.clone();
                model.batch_name = input.batch_name.clone();
                model.batch_location = input.batch_location.clone();
                model.custom_batch = input.custom_batch.clone();
                model.staff_count = input.staff_count;
                model.time_start = input.time_start;
                model.time_finish = input.time_finish;
                model.updated_at = now;
                let active = model.into_active_model().reset_all();
                active.update(&txn).await?;
                bin_id
            }
            None => {
                let max_number: Option<i32> = BinEntity::find()
                    .select_only()
                    .column_as(bin::Column::BinNumber.max(), "max_number")
                    .into_tuple()
                    .one(&txn)
                    .await?
                    .flatten();
                let bin_number = max_number.unwrap_or(9999) + 1;

                let bin_id = Uuid::new_v4();
                let active = bin::ActiveModel {
                    id: Set(bin_id),
                    bin_number: Set(bin_number),
                    bom_id: Set(input.bom_id),
                    total_bins_used: Set(input.total_bins_used),
                    batch_id: Set(input.batch_id.clone()),
                    batch_name: Set(input.batch_name.clone()),
                    batch_location: Set(input.batch_location.clone()),
                    custom_batch: Set(input.custom_batch.clone()),
                    staff_count: Set(input.staff_count),
                    time_start: Set(input.time_start),
                    time_finish: Set(input.time_finish),
                    posting_state: Set(PostingState::Draft),
                    posting_attempts: Set(0),
                    adjustment_number: Set(None),
                    adjustment_id: Set(None),
                    external_status: Set(None),
                    external_modified_by: Set(None),
                    external_modified_on: Set(None),
                    created_at: Set(input.created_at.unwrap_or(now)),
                    updated_at: Set(now),
                };
                active.insert(&txn).await?;
                bin_id
            }
        };

        self.reconcile_finished_goods(&txn, bin_id, &input.finished_goods)
            .await?;
        self.reconcile_batches(&txn, bin_id, &input.batches).await?;

        txn.commit().await?;

        self.event_sender.send_or_log(Event::BinSaved(bin_id)).await;

        Ok(bin_id)
    }

    async fn reconcile_finished_goods(
        &self,
        txn: &DatabaseTransaction,
        bin_id: Uuid,
        inputs: &[UpsertBinFinishedGoodInput],
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        let existing = BinFinishedGoodEntity::find()
            .filter(bin_finished_good::Column::BinId.eq(bin_id))
            .all(txn)
            .await?;

        let kept: Vec<Uuid> = inputs.iter().map(|fg| fg.finished_good_id).collect();
        for stale in existing.iter().filter(|e| !kept.contains(&e.finished_good_id)) {
            BinFinishedGoodEntity::delete_by_id(stale.id).exec(txn).await?;
        }

        for fg_input in inputs {
            match existing
                .iter()
                .find(|e| e.finished_good_id == fg_input.finished_good_id)
            {
                Some(current) => {
                    let mut active = current.clone().into_active_model();
                    active.quantity = Set(fg_input.quantity);
                    active.comment = Set(fg_input.comment.clone());
                    active.updated_at = Set(now);
                    active.update(txn).await?;
                }
                None => {
                    let active = bin_finished_good::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        bin_id: Set(bin_id),
                        finished_good_id: Set(fg_input.finished_good_id),
                        finished_good_product_id: Set(fg_input.finished_good_product_id.clone()),
                        quantity: Set(fg_input.quantity),
                        comment: Set(fg_input.comment.clone()),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    active.insert(txn).await?;
                }
            }
        }

        Ok(())
    }

    async fn reconcile_batches(
        &self,
        txn: &DatabaseTransaction,
        bin_id: Uuid,
        inputs: &[UpsertBinBatchInput],
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        let existing = BinBatchEntity::find()
            .filter(bin_batch::Column::BinId.eq(bin_id))
            .all(txn)
            .await?;

        let kept: Vec<&str> = inputs.iter().map(|b| b.batch_id.as_str()).collect();
        for stale in existing.iter().filter(|e| !kept.contains(&e.batch_id.as_str())) {
            BinBatchEntity::delete_by_id(stale.id).exec(txn).await?;
        }

        for batch_input in inputs {
            match existing.iter().find(|e| e.batch_id == batch_input.batch_id) {
                Some(current) => {
                    let mut active = current.clone().into_active_model();
                    active.batch_name = Set(batch_input.batch_name.clone());
                    active.batch_location = Set(batch_input.batch_location.clone());
                    active.quantity = Set(batch_input.quantity);
                    active.updated_at = Set(now);
                    active.update(txn).await?;
                }
                None => {
                    let active = bin_batch::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        bin_id: Set(bin_id),
                        batch_id: Set(batch_input.batch_id.clone()),
                        batch_name: Set(batch_input.batch_name.clone()),
                        batch_location: Set(batch_input.batch_location.clone()),
                        quantity: Set(batch_input.quantity),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    active.insert(txn).await?;
                }
            }
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_bin(&self, bin_id: &Uuid) -> Result<(), ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        BinFinishedGoodEntity::delete_many()
            .filter(bin_finished_good::Column::BinId.eq(*bin_id))
            .exec(&txn)
            .await?;
        BinBatchEntity::delete_many()
            .filter(bin_batch::Column::BinId.eq(*bin_id))
            .exec(&txn)
            .await?;
        let deleted = BinEntity::delete_by_id(*bin_id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("bin {} not found", bin_id)));
        }

        txn.commit().await?;

        self.event_sender.send_or_log(Event::BinDeleted(*bin_id)).await;

        Ok(())
    }

    /// Writes a polled external status. The status is uppercased before
    /// storage and comparison; `COMPLETED` advances the posting state to
    /// `Approved`.
    #[instrument(skip(self))]
    pub async fn set_external_status(
        &self,
        bin_id: &Uuid,
        status: &str,
        modified_by: Option<String>,
        modified_on: Option<String>,
    ) -> Result<bin::Model, ServiceError> {
        let db = self.connection();
        let model = BinEntity::find_by_id(*bin_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("bin {} not found", bin_id)))?;

        let status = status.to_uppercase();
        let mut active = model.into_active_model();
        if status == crate::models::external_status::COMPLETED {
            active.posting_state = Set(PostingState::Approved);
        }
        active.external_status = Set(Some(status));
        active.external_modified_by = Set(modified_by);
        active.external_modified_on = Set(modified_on);
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    /// Clears the stored external status so the record is editable again.
    #[instrument(skip(self))]
    pub async fn clear_external_status(&self, bin_id: &Uuid) -> Result<(), ServiceError> {
        let db = self.connection();
        let model = BinEntity::find_by_id(*bin_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("bin {} not found", bin_id)))?;

        let mut active = model.into_active_model();
        active.external_status = Set(None);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        Ok(())
    }

    /// Expands the bin through its BOM, posts the merged batch as one
    /// external stock adjustment and records the returned identifiers.
    ///
    /// The posting call is never retried automatically: on failure the bin
    /// moves to `Failed` and the caller re-triggers manually, which
    /// recomputes the batch from scratch.
    #[instrument(skip(self))]
    pub async fn process_bin(&self, bin_id: &Uuid) -> Result<ProcessOutcome, ServiceError> {
        let db = self.connection();
        let detail = self
            .get_bin(bin_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("bin {} not found", bin_id)))?;

        if !detail.bin.posting_state.allows_processing() {
            return Err(ServiceError::InvalidOperation(format!(
                "bin {} has already been posted",
                detail.bin.bin_number
            )));
        }

        let bom = self
            .boms
            .get_bom(&detail.bin.bom_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("BOM {} not found", detail.bin.bom_id))
            })?;
        if bom.finished_goods.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "BOM {} has no finished goods",
                bom.id
            )));
        }

        let drawn: Decimal = detail.batches.iter().map(|b| b.quantity).sum();
        if drawn != detail.bin.total_bins_used {
            return Err(ServiceError::ValidationError(format!(
                "batch quantities ({}) must equal total bins used ({})",
                drawn, detail.bin.total_bins_used
            )));
        }

        let batch = expand_bin(&detail.bin, &detail.finished_goods, &bom);
        let products = self.catalog.all_products().await?;
        let (lines, dropped) =
            resolve_movement_lines(&batch, &products, &batch_breakdown(&detail.batches));

        for product_id in &dropped {
            warn!(
                "bin {}: dropping adjustment line, product {} unresolved",
                detail.bin.bin_number, product_id
            );
            self.event_sender
                .send_or_log(Event::AdjustmentLineDropped {
                    source: format!("bin {}", detail.bin.bin_number),
                    product_id: product_id.clone(),
                })
                .await;
        }

        let location = if detail.bin.batch_location.is_empty() {
            detail
                .batches
                .first()
                .map(|b| b.batch_location.clone())
                .unwrap_or_default()
        } else {
            detail.bin.batch_location.clone()
        };

        // Persist the in-progress marker before the external call.
        let attempt = detail.bin.posting_attempts + 1;
        let mut active = detail.bin.clone().into_active_model();
        active.posting_state = Set(PostingState::Posting);
        active.posting_attempts = Set(attempt);
        active.updated_at = Set(Utc::now());
        let pending = active.update(db).await?;

        let key = posting_idempotency_key("bin", &detail.bin.id.to_string(), attempt);
        let lines_posted = lines.len();
        let posted = match self
            .gateway
            .post_adjustment(lines, &location, AdjustmentReason::PackApp, &key)
            .await
        {
            Ok(posted) => posted,
            Err(e) => {
                let mut active = pending.into_active_model();
                active.posting_state = Set(PostingState::Failed);
                active.updated_at = Set(Utc::now());
                active.update(db).await?;

                self.event_sender
                    .send_or_log(Event::BinPostingFailed {
                        bin_id: *bin_id,
                        reason: e.to_string(),
                    })
                    .await;
                return Err(e);
            }
        };

        let mut active = pending.into_active_model();
        active.posting_state = Set(PostingState::Posted);
        active.adjustment_number = Set(Some(posted.adjustment_number.clone()));
        active.adjustment_id = Set(Some(posted.guid.clone()));
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        self.event_sender
            .send_or_log(Event::BinPosted {
                bin_id: *bin_id,
                adjustment_number: posted.adjustment_number.clone(),
                line_count: lines_posted,
            })
            .await;

        if let Some(target) = adjustment_target(&posted.adjustment_number) {
            self.automation.trigger_detached(target);
        }

        Ok(ProcessOutcome {
            adjustment_number: posted.adjustment_number,
            adjustment_id: posted.guid,
            lines_posted,
            dropped,
        })
    }
}
