use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sales-order line with running `shipped`/`invoiced` counters that are
/// incremented as dispatches reference it. Intended invariant:
/// `shipped <= quantity` and `invoiced <= shipped`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_order_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sales_order_id: i32,
    pub line: i32,
    pub product_code: String,
    pub product_description: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub shipped: Decimal,
    pub invoiced: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales_order::Entity",
        from = "Column::SalesOrderId",
        to = "super::sales_order::Column::Id"
    )]
    SalesOrder,
    #[sea_orm(has_many = "super::dispatch_line::Entity")]
    DispatchLines,
}

impl Related<super::sales_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrder.def()
    }
}

impl Related<super::dispatch_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DispatchLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
