//! Clients for the external systems this service synchronizes with: the
//! Unleashed inventory API (products, batch stock, stock adjustments) and
//! the RPA automation workflow that approves parked adjustments.

pub mod automation;
pub mod client;
pub mod types;

pub use automation::{AutomationGateway, HttpAutomationGateway};
pub use client::{ProductCatalog, StockAdjustmentGateway, UnleashedClient};
pub use types::{
    AdjustmentInfo, AdjustmentReason, BatchStock, ItemsPage, Pagination, PostedAdjustment,
    Product, ProductRef, StockAdjustmentLine, StockAdjustmentRequest, StockOnHand, WarehouseRef,
};
