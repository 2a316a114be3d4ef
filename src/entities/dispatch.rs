use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{DispatchCustomerType, PostingState, SalesOrderStatus};

/// One shipment to a customer, covering sales-order lines and hired crates.
/// Shares the bin's posting lifecycle against the external inventory system.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dispatches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: String,
    pub customer_code: String,
    pub customer_name: String,
    pub customer_type: DispatchCustomerType,
    pub shipping_company: String,
    pub shipping_company_id: String,
    pub address: String,
    pub tracking_number: String,
    pub dispatch_date: DateTime<Utc>,
    pub number_of_packages: i32,
    pub shipment_weight: Decimal,
    pub status: SalesOrderStatus,
    /// When set, shipped lines are also counted as invoiced
    pub marked_done: bool,
    pub posting_state: PostingState,
    /// Times a posting has been attempted; feeds the idempotency key
    pub posting_attempts: i32,
    pub adjustment_number: Option<String>,
    pub adjustment_id: Option<String>,
    pub external_status: Option<String>,
    pub external_created_by: Option<String>,
    pub external_created_on: Option<String>,
    pub external_modified_by: Option<String>,
    pub external_modified_on: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dispatch_line::Entity")]
    DispatchLines,
    #[sea_orm(has_many = "super::crate_line::Entity")]
    CrateLines,
}

impl Related<super::dispatch_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DispatchLines.def()
    }
}

impl Related<super::crate_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CrateLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
