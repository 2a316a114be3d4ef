use crate::{
    db::DbPool,
    entities::{
        bin_finished_good, bom, bom::Entity as BomEntity, consumed_product,
        consumed_product::Entity as ConsumedProductEntity, finished_good,
        finished_good::Entity as FinishedGoodEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Summary view returned when listing BOMs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomSummary {
    pub id: Uuid,
    pub raw_id: String,
    pub product_code: String,
    pub name: Option<String>,
    pub quantity: Decimal,
    pub finished_good_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumedProductView {
    pub id: Uuid,
    pub product_id: String,
    pub product_code: String,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishedGoodView {
    pub id: Uuid,
    pub product_id: String,
    pub product_code: String,
    pub quantity: Decimal,
    pub sort_order: i32,
    pub consumed_products: Vec<ConsumedProductView>,
}

/// Full BOM graph, finished goods ordered by their persisted position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomDetail {
    pub id: Uuid,
    pub raw_id: String,
    pub product_code: String,
    pub name: Option<String>,
    pub quantity: Decimal,
    pub finished_goods: Vec<FinishedGoodView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertConsumedProductInput {
    pub id: Option<Uuid>,
    pub product_id: String,
    pub product_code: String,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertFinishedGoodInput {
    pub id: Option<Uuid>,
    pub product_id: String,
    pub product_code: String,
    pub quantity: Decimal,
    pub consumed_products: Vec<UpsertConsumedProductInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertBomInput {
    pub id: Option<Uuid>,
    pub raw_id: String,
    pub product_code: String,
    pub name: Option<String>,
    pub quantity: Decimal,
    pub finished_goods: Vec<UpsertFinishedGoodInput>,
}

/// Service managing bill-of-materials graphs. Read-only to the
/// reconciliation engine; mutated only through the editing endpoints.
#[derive(Clone)]
pub struct BomService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl BomService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    /// Returns paginated BOM summaries.
    #[instrument(skip(self))]
    pub async fn list_boms(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<BomSummary>, u64), ServiceError> {
        let db = self.connection();
        let limit = limit.max(1);
        let page = page.max(1) - 1;
        let paginator = BomEntity::find()
            .order_by_desc(bom::Column::CreatedAt)
            .paginate(db, limit);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;

        let mut summaries = Vec::with_capacity(models.len());
        for model in models {
            let finished_good_count = FinishedGoodEntity::find()
                .filter(finished_good::Column::BomId.eq(model.id))
                .count(db)
                .await?;
            summaries.push(BomSummary {
                id: model.id,
                raw_id: model.raw_id,
                product_code: model.product_code,
                name: model.name,
                quantity: model.quantity,
                finished_good_count,
            });
        }

        Ok((summaries, total))
    }

    /// Fetches a BOM with its finished goods (persisted order) and their
    /// consumed products.
    #[instrument(skip(self))]
    pub async fn get_bom(&self, bom_id: &Uuid) -> Result<Option<BomDetail>, ServiceError> {
        let db = self.connection();
        let Some(model) = BomEntity::find_by_id(*bom_id).one(db).await? else {
            return Ok(None);
        };

        let goods = model
            .find_related(FinishedGoodEntity)
            .order_by_asc(finished_good::Column::SortOrder)
            .all(db)
            .await?;

        let mut views = Vec::with_capacity(goods.len());
        for good in goods {
            let consumed = good
                .find_related(ConsumedProductEntity)
                .order_by_asc(consumed_product::Column::CreatedAt)
                .all(db)
                .await?;

            views.push(FinishedGoodView {
                id: good.id,
                product_id: good.product_id,
                product_code: good.product_code,
                quantity: good.quantity,
                sort_order: good.sort_order,
                consumed_products: consumed
                    .into_iter()
                    .map(|cp| ConsumedProductView {
                        id: cp.id,
                        product_id: cp.product_id,
                        product_code: cp.product_code,
                        quantity: cp.quantity,
                    })
                    .collect(),
            });
        }

        Ok(Some(BomDetail {
            id: model.id,
            raw_id: model.raw_id,
            product_code: model.product_code,
            name: model.name,
            quantity: model.quantity,
            finished_goods: views,
        }))
    }

    /// Creates or updates a BOM with its full finished-goods graph.
    /// Finished-good order follows the input order (1-based `sort_order`).
    /// On update, finished goods and consumed products absent from the
    /// input are deleted.
    #[instrument(skip(self, input))]
    pub async fn upsert_bom(&self, input: UpsertBomInput) -> Result<Uuid, ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;
        let now = Utc::now();

        let (bom_id, created) = match input.id {
            None => {
                let bom_id = Uuid::new_v4();
                let bom_model = bom::ActiveModel {
                    id: Set(bom_id),
                    raw_id: Set(input.raw_id.clone()),
                    product_code: Set(input.product_code.clone()),
                    name: Set(input.name.clone()),
                    quantity: Set(input.quantity),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                bom_model.insert(&txn).await?;
                (bom_id, true)
            }
            Some(bom_id) => {
                let mut model = BomEntity::find_by_id(bom_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("BOM {} not found", bom_id)))?;
                model.raw_id = input.raw_id.clone();
                model.product_code = input.product_code.clone();
                model.name = input.name.clone();
                model.quantity = input.quantity;
                model.updated_at = now;
                let active = model.into_active_model().reset_all();
                active.update(&txn).await?;
                (bom_id, false)
            }
        };

        self.reconcile_finished_goods(&txn, bom_id, &input.finished_goods)
            .await?;

        txn.commit().await?;

        let event = if created {
            Event::BomCreated(bom_id)
        } else {
            Event::BomUpdated(bom_id)
        };
        self.event_sender.send_or_log(event).await;

        Ok(bom_id)
    }

    async fn reconcile_finished_goods(
        &self,
        txn: &DatabaseTransaction,
        bom_id: Uuid,
        inputs: &[UpsertFinishedGoodInput],
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        let current = FinishedGoodEntity::find()
            .filter(finished_good::Column::BomId.eq(bom_id))
            .all(txn)
            .await?;

        let kept_ids: Vec<Uuid> = inputs.iter().filter_map(|fg| fg.id).collect();
        for stale in current.iter().filter(|fg| !kept_ids.contains(&fg.id)) {
            ConsumedProductEntity::delete_many()
                .filter(consumed_product::Column::FinishedGoodId.eq(stale.id))
                .exec(txn)
                .await?;
            FinishedGoodEntity::delete_by_id(stale.id).exec(txn).await?;
        }

        for (idx, fg_input) in inputs.iter().enumerate() {
            let sort_order = (idx + 1) as i32;
            let fg_id = match fg_input.id.filter(|id| current.iter().any(|fg| fg.id == *id)) {
                Some(existing_id) => {
                    let active = finished_good::ActiveModel {
                        id: Set(existing_id),
                        bom_id: Set(bom_id),
                        product_id: Set(fg_input.product_id.clone()),
                        product_code: Set(fg_input.product_code.clone()),
                        quantity: Set(fg_input.quantity),
                        sort_order: Set(sort_order),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    active.update(txn).await?;
                    existing_id
                }
                None => {
                    let fg_id = Uuid::new_v4();
                    let active = finished_good::ActiveModel {
                        id: Set(fg_id),
                        bom_id: Set(bom_id),
                        product_id: Set(fg_input.product_id.clone()),
                        product_code: Set(fg_input.product_code.clone()),
                        quantity: Set(fg_input.quantity),
                        sort_order: Set(sort_order),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    active.insert(txn).await?;
                    fg_id
                }
            };

            self.reconcile_consumed_products(txn, fg_id, &fg_input.consumed_products)
                .await?;
        }

        Ok(())
    }

    async fn reconcile_consumed_products(
        &self,
        txn: &DatabaseTransaction,
        finished_good_id: Uuid,
        inputs: &[UpsertConsumedProductInput],
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        let current = ConsumedProductEntity::find()
            .filter(consumed_product::Column::FinishedGoodId.eq(finished_good_id))
            .all(txn)
            .await?;

        let kept_ids: Vec<Uuid> = inputs.iter().filter_map(|cp| cp.id).collect();
        for stale in current.iter().filter(|cp| !kept_ids.contains(&cp.id)) {
            ConsumedProductEntity::delete_by_id(stale.id).exec(txn).await?;
        }

        for cp_input in inputs {
            match cp_input.id.filter(|id| current.iter().any(|cp| cp.id == *id)) {
                Some(existing_id) => {
                    let active = consumed_product::ActiveModel {
                        id: Set(existing_id),
                        finished_good_id: Set(finished_good_id),
                        product_id: Set(cp_input.product_id.clone()),
                        product_code: Set(cp_input.product_code.clone()),
                        quantity: Set(cp_input.quantity),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    active.update(txn).await?;
                }
                None => {
                    let active = consumed_product::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        finished_good_id: Set(finished_good_id),
                        product_id: Set(cp_input.product_id.clone()),
                        product_code: Set(cp_input.product_code.clone()),
                        quantity: Set(cp_input.quantity),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    active.insert(txn).await?;
                }
            }
        }

        Ok(())
    }

    /// Deletes a BOM, its finished goods, their consumed products and any
    /// bin associations referencing those finished goods.
    #[instrument(skip(self))]
    pub async fn delete_bom(&self, bom_id: &Uuid) -> Result<(), ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        let goods = FinishedGoodEntity::find()
            .filter(finished_good::Column::BomId.eq(*bom_id))
            .all(&txn)
            .await?;
        let good_ids: Vec<Uuid> = goods.iter().map(|fg| fg.id).collect();

        if !good_ids.is_empty() {
            ConsumedProductEntity::delete_many()
                .filter(consumed_product::Column::FinishedGoodId.is_in(good_ids.clone()))
                .exec(&txn)
                .await?;
            bin_finished_good::Entity::delete_many()
                .filter(bin_finished_good::Column::FinishedGoodId.is_in(good_ids.clone()))
                .exec(&txn)
                .await?;
            FinishedGoodEntity::delete_many()
                .filter(finished_good::Column::BomId.eq(*bom_id))
                .exec(&txn)
                .await?;
        }

        let deleted = BomEntity::delete_by_id(*bom_id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("BOM {} not found", bom_id)));
        }

        txn.commit().await?;

        self.event_sender.send_or_log(Event::BomDeleted(*bom_id)).await;

        Ok(())
    }
}
