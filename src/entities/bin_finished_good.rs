use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A finished good produced by a packout run, with the quantity actually
/// produced in that run.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bin_finished_goods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bin_id: Uuid,
    pub finished_good_id: Uuid,
    /// External product identifier of the finished good
    pub finished_good_product_id: String,
    pub quantity: Decimal,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bin::Entity",
        from = "Column::BinId",
        to = "super::bin::Column::Id"
    )]
    Bin,
    #[sea_orm(
        belongs_to = "super::finished_good::Entity",
        from = "Column::FinishedGoodId",
        to = "super::finished_good::Column::Id"
    )]
    FinishedGood,
}

impl Related<super::bin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bin.def()
    }
}

impl Related<super::finished_good::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinishedGood.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
