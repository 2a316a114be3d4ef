use crate::{
    db::DbPool,
    entities::{
        dispatch_line, dispatch_line::Entity as DispatchLineEntity, sales_order,
        sales_order::Entity as SalesOrderEntity, sales_order_line,
        sales_order_line::Entity as SalesOrderLineEntity,
    },
    errors::ServiceError,
    models::SalesOrderStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct SalesOrderDetail {
    pub order: sales_order::Model,
    pub lines: Vec<sales_order_line::Model>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSalesOrderLineInput {
    pub line: i32,
    pub product_code: String,
    pub product_description: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSalesOrderInput {
    pub order_number: String,
    pub customer_code: String,
    pub customer_name: String,
    pub warehouse: String,
    pub status: SalesOrderStatus,
    pub order_date: DateTime<Utc>,
    pub lines: Vec<CreateSalesOrderLineInput>,
}

/// Service for sales orders. Line `shipped`/`invoiced` counters are
/// maintained incrementally by the dispatch service; the by-id read path
/// additionally reconciles `shipped` against the dispatch lines on record.
#[derive(Clone)]
pub struct SalesOrderService {
    db_pool: Arc<DbPool>,
}

impl SalesOrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<sales_order::Model>, u64), ServiceError> {
        let db = self.connection();
        let limit = limit.max(1);
        let page = page.max(1) - 1;
        let paginator = SalesOrderEntity::find()
            .order_by_desc(sales_order::Column::OrderDate)
            .paginate(db, limit);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;

        Ok((models, total))
    }

    /// Fetches an order with its lines, recomputing each line's `shipped`
    /// counter from its dispatch lines and repairing any divergence. This
    /// is the one read path that recomputes instead of incrementing.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i32) -> Result<Option<SalesOrderDetail>, ServiceError> {
        let db = self.connection();
        let Some(order) = SalesOrderEntity::find_by_id(id).one(db).await? else {
            return Ok(None);
        };

        let lines = SalesOrderLineEntity::find()
            .filter(sales_order_line::Column::SalesOrderId.eq(order.id))
            .order_by_asc(sales_order_line::Column::Line)
            .all(db)
            .await?;

        let mut reconciled = Vec::with_capacity(lines.len());
        for line in lines {
            let dispatched: Decimal = DispatchLineEntity::find()
                .filter(dispatch_line::Column::SalesOrderLineId.eq(line.id))
                .all(db)
                .await?
                .iter()
                .map(|dl| dl.ship)
                .sum();

            if dispatched != line.shipped {
                info!(
                    "sales order line {}: shipped counter {} diverged from dispatch total {}, repairing",
                    line.id, line.shipped, dispatched
                );
                let mut active = line.clone().into_active_model();
                active.shipped = Set(dispatched);
                active.updated_at = Set(Utc::now());
                reconciled.push(active.update(db).await?);
            } else {
                reconciled.push(line);
            }
        }

        Ok(Some(SalesOrderDetail {
            order,
            lines: reconciled,
        }))
    }

    #[instrument(skip(self, input))]
    pub async fn create_order(&self, input: CreateSalesOrderInput) -> Result<i32, ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;
        let now = Utc::now();

        let active = sales_order::ActiveModel {
            order_number: Set(input.order_number.clone()),
            customer_code: Set(input.customer_code.clone()),
            customer_name: Set(input.customer_name.clone()),
            warehouse: Set(input.warehouse.clone()),
            status: Set(input.status),
            order_date: Set(input.order_date),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let order = active.insert(&txn).await?;

        for line in &input.lines {
            let active = sales_order_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                sales_order_id: Set(order.id),
                line: Set(line.line),
                product_code: Set(line.product_code.clone()),
                product_description: Set(line.product_description.clone()),
                quantity: Set(line.quantity),
                price: Set(line.price),
                shipped: Set(Decimal::ZERO),
                invoiced: Set(Decimal::ZERO),
                created_at: Set(now),
                updated_at: Set(now),
            };
            active.insert(&txn).await?;
        }

        txn.commit().await?;

        Ok(order.id)
    }
}
