//! Shared handler state.

use mercato_core::StockThresholds;
use mercato_db::InventoryService;

/// Cloned into every handler. The service is cheap to clone: it holds the
/// pool handle and an `Arc` to the lock table.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: InventoryService,
    /// Used when a metrics request omits `low` / `over`.
    pub thresholds: StockThresholds,
}

impl AppState {
    pub fn new(service: InventoryService, thresholds: StockThresholds) -> Self {
        AppState { service, thresholds }
    }
}
