use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PostingState;

/// One physical packout run: a fixed quantity of one raw/bulk product
/// consumed over a time window, producing one or more finished goods.
///
/// A bin starts in `Draft`, becomes `Posted` once the external stock
/// adjustment identifier is recorded, and `Approved` once the external
/// workflow completes the adjustment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bins")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Human-readable sequential run number
    pub bin_number: i32,
    pub bom_id: Uuid,
    pub total_bins_used: Decimal,
    pub batch_id: String,
    pub batch_name: String,
    pub batch_location: String,
    pub custom_batch: String,
    pub staff_count: i32,
    pub time_start: DateTime<Utc>,
    pub time_finish: DateTime<Utc>,
    pub posting_state: PostingState,
    /// Times a posting has been attempted; feeds the idempotency key
    pub posting_attempts: i32,
    /// Human-readable external adjustment number, e.g. `SA-0000123`
    pub adjustment_number: Option<String>,
    /// Opaque external adjustment identifier
    pub adjustment_id: Option<String>,
    /// Last polled external status, stored uppercased verbatim
    pub external_status: Option<String>,
    pub external_modified_by: Option<String>,
    pub external_modified_on: Option<String>,
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
    #[sea_orm(has_many = "super::bin_batch::Entity")]
    BinBatches,
    #[sea_orm(has_many = "super::bin_finished_good::Entity")]
    BinFinishedGoods,
}

impl Related<super::bom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bom.def()
    }
}

impl Related<super::bin_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BinBatches.def()
    }
}

impl Related<super::bin_finished_good::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BinFinishedGoods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
