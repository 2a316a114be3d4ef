use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a bin or dispatch against the external inventory system.
///
/// `Posting` is written before the stock adjustment call so that a crash
/// between the external post and the local update leaves a visible marker
/// instead of a silently diverged record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PostingState {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "POSTING")]
    Posting,
    #[sea_orm(string_value = "POSTED")]
    Posted,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

impl PostingState {
    /// Whether a record in this state may be (re-)submitted to the gateway.
    pub fn allows_processing(self) -> bool {
        matches!(self, Self::Draft | Self::Failed)
    }

    /// Whether the asynchronous approval workflow still applies.
    pub fn awaiting_approval(self) -> bool {
        matches!(self, Self::Posted)
    }
}

impl Default for PostingState {
    fn default() -> Self {
        Self::Draft
    }
}

/// External adjustment status strings, always compared uppercased.
pub mod external_status {
    /// Posted, pending external approval.
    pub const PARKED: &str = "PARKED";
    /// Terminal: approved and applied.
    pub const COMPLETED: &str = "COMPLETED";
}

/// Crate/equipment SKUs tracked on dispatches for hire purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum CrateSku {
    #[sea_orm(string_value = "CRATE")]
    Crate,
    #[sea_orm(string_value = "BIN")]
    Bin,
    #[sea_orm(string_value = "PALLET")]
    Pallet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DispatchCustomerType {
    #[sea_orm(string_value = "DOMESTIC")]
    Domestic,
    #[sea_orm(string_value = "EXPORT")]
    Export,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SalesOrderStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
    #[sea_orm(string_value = "COMPLETE")]
    Complete,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_and_failed_allow_processing() {
        assert!(PostingState::Draft.allows_processing());
        assert!(PostingState::Failed.allows_processing());
        assert!(!PostingState::Posted.allows_processing());
        assert!(!PostingState::Posting.allows_processing());
        assert!(!PostingState::Approved.allows_processing());
    }

    #[test]
    fn only_posted_awaits_approval() {
        assert!(PostingState::Posted.awaiting_approval());
        assert!(!PostingState::Approved.awaiting_approval());
    }
}
