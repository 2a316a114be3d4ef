use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A finished-goods output of a BOM. `sort_order` is user-significant and
/// drives line emission order during reconciliation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "finished_goods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bom_id: Uuid,
    /// External product identifier of the output
    pub product_id: String,
    pub product_code: String,
    /// Per-unit yield, not the run quantity
    pub quantity: Decimal,
    /// 1-based position within the BOM
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bom::Entity",
        from = "Column::BomId",
        to = "super::bom::Column::Id"
    )]
    Bom,
    #[sea_orm(has_many = "super::consumed_product::Entity")]
    ConsumedProducts,
}

impl Related<super::bom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bom.def()
    }
}

impl Related<super::consumed_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsumedProducts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
