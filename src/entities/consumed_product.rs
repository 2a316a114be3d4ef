use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An input consumed per unit of a finished good.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consumed_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub finished_good_id: Uuid,
    /// External product identifier of the input
    pub product_id: String,
    pub product_code: String,
    /// Quantity consumed per unit of output
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::finished_good::Entity",
        from = "Column::FinishedGoodId",
        to = "super::finished_good::Column::Id"
    )]
    FinishedGood,
}

impl Related<super::finished_good::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinishedGood.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
