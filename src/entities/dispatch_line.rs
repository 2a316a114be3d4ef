use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shipped portion of one sales-order line, drawn from one batch.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dispatch_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dispatch_id: i32,
    pub line: i32,
    pub product_code: String,
    pub product_description: String,
    /// Quantity shipped on this line
    pub ship: Decimal,
    pub weight: Option<Decimal>,
    pub sales_order_line_id: Uuid,
    pub batch_number: String,
    pub batch_location: String,
    pub seal_number: Option<String>,
    pub container_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dispatch::Entity",
        from = "Column::DispatchId",
        to = "super::dispatch::Column::Id"
    )]
    Dispatch,
    #[sea_orm(
        belongs_to = "super::sales_order_line::Entity",
        from = "Column::SalesOrderLineId",
        to = "super::sales_order_line::Column::Id"
    )]
    SalesOrderLine,
}

impl Related<super::dispatch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dispatch.def()
    }
}

impl Related<super::sales_order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrderLine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
