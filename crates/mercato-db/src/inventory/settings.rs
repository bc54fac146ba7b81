//! Per-vendor real-time sync toggle.
//!
//! Callers read the [`SyncConfig`] once per request and pass it into every
//! stock-mutating operation.

use tracing::{info, instrument};

use super::{InventoryResult, InventoryService};
use mercato_core::{CoreError, SyncConfig};

impl InventoryService {
    #[instrument(skip(self))]
    pub async fn get_sync_config(&self, vendor_id: &str) -> InventoryResult<SyncConfig> {
        if self.db.vendors().get_by_id(vendor_id).await?.is_none() {
            return Err(CoreError::not_found("Vendor", vendor_id).into());
        }

        Ok(self.db.sync_settings().get(vendor_id).await?)
    }

    /// Sync settings of the vendor owning `product_id`.
    #[instrument(skip(self))]
    pub async fn get_sync_config_for_product(&self, product_id: &str) -> InventoryResult<SyncConfig> {
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        Ok(self.db.sync_settings().get(&product.vendor_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn set_real_time_sync(&self, vendor_id: &str, enabled: bool) -> InventoryResult<SyncConfig> {
        if self.db.vendors().get_by_id(vendor_id).await?.is_none() {
            return Err(CoreError::not_found("Vendor", vendor_id).into());
        }

        let config = self.db.sync_settings().set(vendor_id, enabled).await?;
        info!(vendor_id = %vendor_id, enabled, "Real-time sync updated");
        Ok(config)
    }
}
