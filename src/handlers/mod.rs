pub mod bins;
pub mod boms;
pub mod common;
pub mod dispatches;
pub mod health;
pub mod sales_orders;
pub mod stock;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::unleashed::{
    AutomationGateway, ProductCatalog, StockAdjustmentGateway, UnleashedClient,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub boms: Arc<crate::services::boms::BomService>,
    pub bins: Arc<crate::services::bins::BinService>,
    pub dispatches: Arc<crate::services::dispatches::DispatchService>,
    pub sales_orders: Arc<crate::services::sales_orders::SalesOrderService>,
    pub status_poll: Arc<crate::services::status_poll::StatusPollService>,
    pub automation: Arc<crate::services::automation::AutomationService>,
    pub unleashed: Arc<UnleashedClient>,
}

impl AppServices {
    /// Wires the full service graph over one database pool, one event
    /// channel and the external gateway clients.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        unleashed: Arc<UnleashedClient>,
        automation_gateway: Arc<dyn AutomationGateway>,
        automation_max_attempts: u32,
    ) -> Self {
        let catalog: Arc<dyn ProductCatalog> = unleashed.clone();
        let gateway: Arc<dyn StockAdjustmentGateway> = unleashed.clone();

        let automation = Arc::new(crate::services::automation::AutomationService::new(
            db_pool.clone(),
            event_sender.clone(),
            automation_gateway,
            automation_max_attempts,
        ));
        let boms = Arc::new(crate::services::boms::BomService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let bins = Arc::new(crate::services::bins::BinService::new(
            db_pool.clone(),
            event_sender.clone(),
            boms.clone(),
            catalog,
            gateway.clone(),
            automation.clone(),
        ));
        let dispatches = Arc::new(crate::services::dispatches::DispatchService::new(
            db_pool.clone(),
            event_sender.clone(),
            gateway.clone(),
            automation.clone(),
        ));
        let sales_orders = Arc::new(crate::services::sales_orders::SalesOrderService::new(
            db_pool.clone(),
        ));
        let status_poll = Arc::new(crate::services::status_poll::StatusPollService::new(
            db_pool,
            event_sender,
            gateway,
        ));

        Self {
            boms,
            bins,
            dispatches,
            sales_orders,
            status_poll,
            automation,
            unleashed,
        }
    }
}
