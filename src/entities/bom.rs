use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bill of materials: one raw/bulk input product and the finished goods
/// packed out of it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "boms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// External product identifier of the raw/bulk input
    pub raw_id: String,
    /// Product code of the raw/bulk input
    pub product_code: String,
    pub name: Option<String>,
    /// Raw quantity consumed per packout run
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::finished_good::Entity")]
    FinishedGoods,
}

impl Related<super::finished_good::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinishedGoods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
