pub mod automation_attempt;
pub mod bin;
pub mod bin_batch;
pub mod bin_finished_good;
pub mod bom;
pub mod consumed_product;
pub mod crate_line;
pub mod dispatch;
pub mod dispatch_line;
pub mod finished_good;
pub mod sales_order;
pub mod sales_order_line;
