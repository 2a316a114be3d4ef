use crate::{
    db::DbPool,
    entities::{
        crate_line, crate_line::Entity as CrateLineEntity, dispatch,
        dispatch::Entity as DispatchEntity, dispatch_line,
        dispatch_line::Entity as DispatchLineEntity,
        sales_order::Entity as SalesOrderEntity,
        sales_order_line::Entity as SalesOrderLineEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{CrateSku, DispatchCustomerType, PostingState, SalesOrderStatus},
    services::{
        automation::{adjustment_target, AutomationService},
        bins::ProcessOutcome,
        posting_idempotency_key,
        reconciliation::{aggregate_dispatch, shipment_wire_lines},
    },
    unleashed::{AdjustmentReason, StockAdjustmentGateway},
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
use tracing::instrument;
use uuid::Uuid;

/// A dispatch with its line items and crate movements loaded.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchDetail {
    pub dispatch: dispatch::Model,
    pub lines: Vec<dispatch_line::Model>,
    pub crate_lines: Vec<crate_line::Model>,
}

/// Distinct customer reference extracted from past dispatches.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchCustomer {
    pub customer_id: String,
    pub customer_code: String,
    pub customer_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertDispatchLineInput {
    pub id: Option<Uuid>,
    pub line: i32,
    pub product_code: String,
    pub product_description: String,
    pub ship: Decimal,
    pub weight: Option<Decimal>,
    pub sales_order_line_id: Uuid,
    pub batch_number: String,
    pub batch_location: String,
    pub seal_number: Option<String>,
    pub container_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertCrateLineInput {
    pub id: Option<Uuid>,
    pub line: Option<i32>,
    pub customer_id: String,
    pub customer_code: String,
    pub customer_name: String,
    pub sku: CrateSku,
    pub reference: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertDispatchInput {
    pub id: Option<i32>,
    pub shipping_company: String,
    pub shipping_company_id: String,
    pub customer_id: String,
    pub customer_code: String,
    pub customer_name: String,
    pub customer_type: DispatchCustomerType,
    pub status: SalesOrderStatus,
    pub marked_done: bool,
    pub shipment_weight: Decimal,
    pub tracking_number: String,
    pub dispatch_date: DateTime<Utc>,
    pub address: String,
    pub number_of_packages: i32,
    pub dispatch_lines: Vec<UpsertDispatchLineInput>,
    pub crate_lines: Vec<UpsertCrateLineInput>,
}

/// Service managing dispatches, their sales-order counters and their
/// posting lifecycle.
#[derive(Clone)]
pub struct DispatchService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    gateway: Arc<dyn StockAdjustmentGateway>,
    automation: Arc<AutomationService>,
}

impl DispatchService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        gateway: Arc<dyn StockAdjustmentGateway>,
        automation: Arc<AutomationService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            gateway,
            automation,
        }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    /// All dispatches, or only those created in the last two days.
    #[instrument(skip(self))]
    pub async fn list_dispatches(
        &self,
        recent_only: bool,
    ) -> Result<Vec<DispatchDetail>, ServiceError> {
        let db = self.connection();
        let mut query = DispatchEntity::find().order_by_desc(dispatch::Column::Id);
        if recent_only {
            let cutoff = Utc::now() - Duration::days(2);
            query = query.filter(dispatch::Column::CreatedAt.gte(cutoff));
        }

        let dispatches = query.all(db).await?;
        let mut details = Vec::with_capacity(dispatches.len());
        for model in dispatches {
            let lines = DispatchLineEntity::find()
                .filter(dispatch_line::Column::DispatchId.eq(model.id))
                .order_by_asc(dispatch_line::Column::Line)
                .all(db)
                .await?;
            details.push(DispatchDetail {
                dispatch: model,
                lines,
                crate_lines: Vec::new(),
            });
        }

        Ok(details)
    }

    #[instrument(skip(self))]
    pub async fn list_by_customer(
        &self,
        customer_code: &str,
    ) -> Result<Vec<dispatch::Model>, ServiceError> {
        let db = self.connection();
        Ok(DispatchEntity::find()
            .filter(dispatch::Column::CustomerCode.eq(customer_code))
            .order_by_desc(dispatch::Column::Id)
            .all(db)
            .await?)
    }

    /// Distinct customers that have ever been dispatched to.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<DispatchCustomer>, ServiceError> {
        let db = self.connection();
        let rows: Vec<(String, String, String)> = DispatchEntity::find()
            .select_only()
            .column(dispatch::Column::CustomerId)
            .column(dispatch::Column::CustomerCode)
            .column(dispatch::Column::CustomerName)
            .distinct()
            .into_tuple()
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(customer_id, customer_code, customer_name)| DispatchCustomer {
                customer_id,
                customer_code,
                customer_name,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_dispatch(&self, id: i32) -> Result<Option<DispatchDetail>, ServiceError> {
        let db = self.connection();
        let Some(model) = DispatchEntity::find_by_id(id).one(db).await? else {
            return Ok(None);
        };

        let lines = DispatchLineEntity::find()
            .filter(dispatch_line::Column::DispatchId.eq(model.id))
            .order_by_asc(dispatch_line::Column::Line)
            .all(db)
            .await?;
        let crate_lines = CrateLineEntity::find()
            .filter(crate_line::Column::DispatchId.eq(model.id))
            .all(db)
            .await?;

        Ok(Some(DispatchDetail {
            dispatch: model,
            lines,
            crate_lines,
        }))
    }

    /// Creates or updates a dispatch with its lines. Sales-order line
    /// `shipped` counters are incremented by the shipped delta of each
    /// line; `invoiced` follows `marked_done`.
    #[instrument(skip(self, input))]
    pub async fn upsert_dispatch(&self, input: UpsertDispatchInput) -> Result<i32, ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;
        let now = Utc::now();

        let dispatch_id = match input.id {
            None => {
                let active = dispatch::ActiveModel {
                    customer_id: Set(input.customer_id.clone()),
                    customer_code: Set(input.customer_code.clone()),
                    customer_name: Set(input.customer_name.clone()),
                    customer_type: Set(input.customer_type),
                    shipping_company: Set(input.shipping_company.clone()),
                    shipping_company_id: Set(input.shipping_company_id.clone()),
                    address: Set(input.address.clone()),
                    tracking_number: Set(input.tracking_number.clone()),
                    dispatch_date: Set(input.dispatch_date),
                    number_of_packages: Set(input.number_of_packages),
                    shipment_weight: Set(input.shipment_weight),
                    status: Set(input.status),
                    marked_done: Set(input.marked_done),
                    posting_state: Set(PostingState::Draft),
                    posting_attempts: Set(0),
                    adjustment_number: Set(None),
                    adjustment_id: Set(None),
                    external_status: Set(None),
                    external_created_by: Set(None),
                    external_created_on: Set(None),
                    external_modified_by: Set(None),
                    external_modified_on: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                let created = active.insert(&txn).await?;

                for line in &input.dispatch_lines {
                    self.insert_line(&txn, created.id, line).await?;
                    self.apply_ship_delta(&txn, line, line.ship, input.marked_done)
                        .await?;
                }

                created.id
            }
            Some(dispatch_id) => {
                let mut model = DispatchEntity::find_by_id(dispatch_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("dispatch {} not found", dispatch_id))
                    })?;
                model.customer_id = input.customer_id.clone();
                model.customer_code = input.customer_code.clone();
                model.customer_name = input.customer_name.clone();
                model.customer_type = input.customer_type;
                model.shipping_company = input.shipping_company.clone();
                model.shipping_company_id = input.shipping_company_id.clone();
                model.address = input.address.clone();
                model.tracking_number = input.tracking_number.clone();
                model.dispatch_date = input.dispatch_date;
                model.number_of_packages = input.number_of_packages;
                model.shipment_weight = input.shipment_weight;
                model.status = input.status;
                model.marked_done = input.marked_done;
                model.updated_at = now;
                let active = model.into_active_model().reset_all();
                active.update(&txn).await?;

                let existing = DispatchLineEntity::find()
                    .filter(dispatch_line::Column::DispatchId.eq(dispatch_id))
                    .all(&txn)
                    .await?;

                let kept: Vec<Uuid> = input.dispatch_lines.iter().filter_map(|l| l.id).collect();
                for stale in existing.iter().filter(|e| !kept.contains(&e.id)) {
                    DispatchLineEntity::delete_by_id(stale.id).exec(&txn).await?;
                }

                for line in &input.dispatch_lines {
                    let previous = line
                        .id
                        .and_then(|id| existing.iter().find(|e| e.id == id));
                    let delta = match previous {
                        Some(existing_line) => line.ship - existing_line.ship,
                        None => line.ship,
                    };

                    match previous {
                        Some(existing_line) => {
                            let mut active = existing_line.clone().into_active_model();
                            active.line = Set(line.line);
                            active.product_code = Set(line.product_code.clone());
                            active.product_description = Set(line.product_description.clone());
                            active.ship = Set(line.ship);
                            active.weight = Set(line.weight);
                            active.sales_order_line_id = Set(line.sales_order_line_id);
                            active.batch_number = Set(line.batch_number.clone());
                            active.batch_location = Set(line.batch_location.clone());
                            active.seal_number = Set(line.seal_number.clone());
                            active.container_number = Set(line.container_number.clone());
                            active.updated_at = Set(now);
                            active.update(&txn).await?;
                        }
                        None => {
                            self.insert_line(&txn, dispatch_id, line).await?;
                        }
                    }

                    self.apply_ship_delta(&txn, line, delta, input.marked_done)
                        .await?;
                }

                dispatch_id
            }
        };

        self.reconcile_crate_lines(&txn, dispatch_id, &input.crate_lines)
            .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::DispatchSaved(dispatch_id))
            .await;

        Ok(dispatch_id)
    }

    async fn insert_line(
        &self,
        txn: &DatabaseTransaction,
        dispatch_id: i32,
        line: &UpsertDispatchLineInput,
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        let active = dispatch_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            dispatch_id: Set(dispatch_id),
            line: Set(line.line),
            product_code: Set(line.product_code.clone()),
            product_description: Set(line.product_description.clone()),
            ship: Set(line.ship),
            weight: Set(line.weight),
            sales_order_line_id: Set(line.sales_order_line_id),
            batch_number: Set(line.batch_number.clone()),
            batch_location: Set(line.batch_location.clone()),
            seal_number: Set(line.seal_number.clone()),
            container_number: Set(line.container_number.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active.insert(txn).await?;
        Ok(())
    }

    /// Increments the referenced sales-order line's `shipped` counter by
    /// the delta; `invoiced` is set to the shipped quantity when the
    /// dispatch is marked done, zero otherwise.
    async fn apply_ship_delta(
        &self,
        txn: &DatabaseTransaction,
        line: &UpsertDispatchLineInput,
        delta: Decimal,
        marked_done: bool,
    ) -> Result<(), ServiceError> {
        let order_line = SalesOrderLineEntity::find_by_id(line.sales_order_line_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "sales order line {} not found",
                    line.sales_order_line_id
                ))
            })?;

        let shipped = order_line.shipped + delta;
        let mut active = order_line.into_active_model();
        active.shipped = Set(shipped);
        active.invoiced = Set(if marked_done { line.ship } else { Decimal::ZERO });
        active.updated_at = Set(Utc::now());
        active.update(txn).await?;

        Ok(())
    }

    async fn reconcile_crate_lines(
        &self,
        txn: &DatabaseTransaction,
        dispatch_id: i32,
        inputs: &[UpsertCrateLineInput],
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        let existing = CrateLineEntity::find()
            .filter(crate_line::Column::DispatchId.eq(dispatch_id))
            .all(txn)
            .await?;

        for input in inputs {
            match input.id.and_then(|id| existing.iter().find(|e| e.id == id)) {
                Some(current) => {
                    let mut active = current.clone().into_active_model();
                    active.line = Set(input.line);
                    active.customer_id = Set(input.customer_id.clone());
                    active.customer_code = Set(input.customer_code.clone());
                    active.customer_name = Set(input.customer_name.clone());
                    active.sku = Set(input.sku);
                    active.reference = Set(input.reference.clone());
                    active.quantity = Set(input.quantity);
                    active.updated_at = Set(now);
                    active.update(txn).await?;
                }
                None => {
                    let active = crate_line::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        dispatch_id: Set(Some(dispatch_id)),
                        line: Set(input.line),
                        customer_id: Set(input.customer_id.clone()),
                        customer_code: Set(input.customer_code.clone()),
                        customer_name: Set(input.customer_name.clone()),
                        sku: Set(input.sku),
                        reference: Set(input.reference.clone()),
                        quantity: Set(input.quantity),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    active.insert(txn).await?;
                }
            }
        }

        Ok(())
    }

    /// Records a standalone crate movement not attached to a dispatch.
    #[instrument(skip(self, input))]
    pub async fn create_crate_line(
        &self,
        input: UpsertCrateLineInput,
    ) -> Result<Uuid, ServiceError> {
        let db = self.connection();
        let now = Utc::now();
        let id = Uuid::new_v4();
        let active = crate_line::ActiveModel {
            id: Set(id),
            dispatch_id: Set(None),
            line: Set(input.line),
            customer_id: Set(input.customer_id),
            customer_code: Set(input.customer_code),
            customer_name: Set(input.customer_name),
            sku: Set(input.sku),
            reference: Set(input.reference),
            quantity: Set(input.quantity),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active.insert(db).await?;
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn delete_crate_line(&self, id: &Uuid) -> Result<(), ServiceError> {
        let deleted = CrateLineEntity::delete_by_id(*id)
            .exec(self.connection())
            .await?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "crate line {} not found",
                id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_crate_lines(&self) -> Result<Vec<crate_line::Model>, ServiceError> {
        Ok(CrateLineEntity::find()
            .order_by_desc(crate_line::Column::CreatedAt)
            .all(self.connection())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_dispatch(&self, id: i32) -> Result<(), ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        DispatchLineEntity::delete_many()
            .filter(dispatch_line::Column::DispatchId.eq(id))
            .exec(&txn)
            .await?;
        let deleted = DispatchEntity::delete_by_id(id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "dispatch {} not found",
                id
            )));
        }

        txn.commit().await?;

        self.event_sender.send_or_log(Event::DispatchDeleted(id)).await;

        Ok(())
    }

    /// Writes a polled external status, uppercased; `COMPLETED` advances
    /// the posting state to `Approved`.
    #[instrument(skip(self))]
    pub async fn set_external_status(
        &self,
        id: i32,
        status: &str,
        modified_by: Option<String>,
        modified_on: Option<String>,
    ) -> Result<dispatch::Model, ServiceError> {
        let db = self.connection();
        let model = DispatchEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("dispatch {} not found", id)))?;

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

    /// Aggregates the dispatch lines per product and posts the batch as
    /// one external stock adjustment. Location is the warehouse of the
    /// first line's sales order.
    #[instrument(skip(self))]
    pub async fn process_dispatch(&self, id: i32) -> Result<ProcessOutcome, ServiceError> {
        let db = self.connection();
        let detail = self
            .get_dispatch(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("dispatch {} not found", id)))?;

        if !detail.dispatch.posting_state.allows_processing() {
            return Err(ServiceError::InvalidOperation(format!(
                "dispatch {} has already been posted",
                id
            )));
        }
        if detail.lines.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "dispatch {} has no lines to post",
                id
            )));
        }

        let aggregates = aggregate_dispatch(&detail.lines);
        let lines = shipment_wire_lines(&aggregates);
        let location = self.dispatch_location(&detail.lines).await?;

        let attempt = detail.dispatch.posting_attempts + 1;
        let mut active = detail.dispatch.clone().into_active_model();
        active.posting_state = Set(PostingState::Posting);
        active.posting_attempts = Set(attempt);
        active.updated_at = Set(Utc::now());
        let pending = active.update(db).await?;

        let key = posting_idempotency_key("dispatch", &id.to_string(), attempt);
        let lines_posted = lines.len();
        let posted = match self
            .gateway
            .post_adjustment(lines, &location, AdjustmentReason::Dispatch, &key)
            .await
        {
            Ok(posted) => posted,
            Err(e) => {
                let mut active = pending.into_active_model();
                active.posting_state = Set(PostingState::Failed);
                active.updated_at = Set(Utc::now());
                active.update(db).await?;

                self.event_sender
                    .send_or_log(Event::DispatchPostingFailed {
                        dispatch_id: id,
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
        active.external_created_by = Set(posted.created_by.clone());
        active.external_created_on = Set(posted.created_on.clone());
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        self.event_sender
            .send_or_log(Event::DispatchPosted {
                dispatch_id: id,
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
            dropped: Vec::new(),
        })
    }

    async fn dispatch_location(
        &self,
        lines: &[dispatch_line::Model],
    ) -> Result<String, ServiceError> {
        let db = self.connection();
        let Some(first) = lines.first() else {
            return Ok(String::new());
        };

        let Some(order_line) = SalesOrderLineEntity::find_by_id(first.sales_order_line_id)
            .one(db)
            .await?
        else {
            return Ok(String::new());
        };

        let order = SalesOrderEntity::find_by_id(order_line.sales_order_id)
            .one(db)
            .await?;

        Ok(order.map(|o| o.warehouse).unwrap_or_default())
    }
}
