//! # Stock Ledger
//!
//! Reads of per-location stock and the direct signed adjustment.
//!
//! ```text
//!   update_location_inventory(sync, p, l, -3, damage, "crushed")
//!
//!   stock (p,l)   on_hand 10 ──► 7      version 4 ──► 5
//!   movements     + { p, l, -3, damage, note: "crushed" }
//!   sync_outbox   + STOCK entry            (only if sync enabled)
//! ```

use tracing::{info, instrument};

use super::retry::{run_with_retry, Attempt};
use super::{
    current_stock, ensure_same_vendor, ensure_sync_vendor, publish_stock_change,
    require_active_location, require_product, stock_key_id, InventoryResult, InventoryService,
    LedgerUpdate,
};
use crate::repository::{movement, stock};
use mercato_core::validation::{validate_adjustment_reason, validate_delta, validate_note};
use mercato_core::{
    CoreError, InventoryMovement, MovementReason, StockRecord, SyncConfig, VendorStockTotals,
};

impl InventoryService {
    /// Stock for one pair. A pair that was never stocked reads as zero.
    #[instrument(skip(self))]
    pub async fn get_inventory(&self, product_id: &str, location_id: &str) -> InventoryResult<StockRecord> {
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;
        let location = self
            .db
            .locations()
            .get_by_id(location_id)
            .await?
            .ok_or_else(|| CoreError::not_found("InventoryLocation", location_id))?;
        ensure_same_vendor(&product, &location)?;

        Ok(self
            .db
            .stock()
            .get(product_id, location_id)
            .await?
            .unwrap_or_else(|| StockRecord::empty(product_id, location_id)))
    }

    /// One record per active location of the product's vendor.
    #[instrument(skip(self))]
    pub async fn get_across_locations(&self, product_id: &str) -> InventoryResult<Vec<StockRecord>> {
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        Ok(self
            .db
            .stock()
            .list_for_product(&product.id, &product.vendor_id)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_total_for_vendor(&self, vendor_id: &str) -> InventoryResult<VendorStockTotals> {
        if self.db.vendors().get_by_id(vendor_id).await?.is_none() {
            return Err(CoreError::not_found("Vendor", vendor_id).into());
        }

        Ok(self.db.stock().vendor_totals(vendor_id).await?)
    }

    /// Applies a signed on-hand adjustment and logs it.
    ///
    /// Repeating the call repeats the delta; there is no deduplication key.
    ///
    /// ## Errors
    /// - `Validation`: zero delta, system-only reason, note too long,
    ///   inactive location, vendor mismatch
    /// - `NotFound`: unknown product or location
    /// - `InsufficientStock`: on-hand would go negative or below reserved
    /// - `ConcurrentModification`: retries exhausted
    #[instrument(skip(self, sync), fields(vendor_id = %sync.vendor_id))]
    pub async fn update_location_inventory(
        &self,
        sync: &SyncConfig,
        product_id: &str,
        location_id: &str,
        delta: i64,
        reason: MovementReason,
        note: Option<&str>,
    ) -> InventoryResult<LedgerUpdate> {
        validate_delta(delta)?;
        validate_adjustment_reason(reason)?;
        let note = validate_note(note)?;
        let note = note.as_deref();

        let key = stock_key_id(product_id, location_id);
        let _guard = self.locks.lock(product_id, location_id).await;

        let update = run_with_retry(&self.retry, "update_location_inventory", "StockRecord", &key, move || {
            self.try_adjust(sync, product_id, location_id, delta, reason, note)
        })
        .await?;

        info!(
            product_id = %product_id,
            location_id = %location_id,
            delta,
            reason = %reason,
            on_hand = update.stock.on_hand_quantity,
            "Stock adjusted"
        );
        Ok(update)
    }

    async fn try_adjust(
        &self,
        sync: &SyncConfig,
        product_id: &str,
        location_id: &str,
        delta: i64,
        reason: MovementReason,
        note: Option<&str>,
    ) -> InventoryResult<Attempt<LedgerUpdate>> {
        let mut tx = self.db.pool().begin().await?;

        let product = require_product(&mut tx, product_id).await?;
        let location = require_active_location(&mut tx, location_id).await?;
        ensure_same_vendor(&product, &location)?;
        ensure_sync_vendor(sync, &product.vendor_id)?;

        let current = current_stock(&mut tx, product_id, location_id).await?;
        let next = current.adjusted(delta)?;

        let Some(stored) = stock::compare_and_swap(&mut tx, &next, current.version).await? else {
            return Ok(Attempt::Contended);
        };

        let movement = InventoryMovement::new(product_id, location_id, delta, reason)
            .with_note(note.map(str::to_string));
        movement::append(&mut tx, &movement).await?;

        publish_stock_change(&mut tx, sync, &product, "adjustment", std::slice::from_ref(&stored))
            .await?;

        tx.commit().await?;
        Ok(Attempt::Done(LedgerUpdate {
            stock: stored,
            movement,
        }))
    }
}
