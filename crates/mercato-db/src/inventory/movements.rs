//! # Movement Log & Metrics
//!
//! Read side of the audit log plus the vendor dashboard summary.

use futures_util::stream::{BoxStream, StreamExt};
use tracing::instrument;

use super::{InventoryError, InventoryResult, InventoryService};
use crate::repository::movement;
use mercato_core::{calculate_inventory_metrics, CoreError, InventoryMetrics, InventoryMovement, StockThresholds, ValidationError};

/// Largest page `list_product_inventory_movements` will return.
pub const MAX_MOVEMENT_PAGE: u32 = 500;

impl InventoryService {
    /// Lazily streams a product's movements, newest first.
    ///
    /// Rows are decoded as the stream is polled. The stream holds a pooled
    /// connection until it ends or is dropped.
    ///
    /// ```rust,ignore
    /// let mut movements = service.get_product_inventory_movements(&product_id).await?;
    /// while let Some(movement) = movements.try_next().await? {
    ///     println!("{} {}", movement.reason, movement.quantity_change);
    /// }
    /// ```
    #[instrument(skip(self))]
    pub async fn get_product_inventory_movements(
        &self,
        product_id: &str,
    ) -> InventoryResult<BoxStream<'_, InventoryResult<InventoryMovement>>> {
        if self.db.products().get_by_id(product_id).await?.is_none() {
            return Err(CoreError::not_found("Product", product_id).into());
        }

        Ok(movement::stream_for_product(self.db.pool(), product_id)
            .map(|row| row.map_err(InventoryError::from))
            .boxed())
    }

    /// The newest `limit` movements of a product, `1..=MAX_MOVEMENT_PAGE`.
    #[instrument(skip(self))]
    pub async fn list_product_inventory_movements(
        &self,
        product_id: &str,
        limit: u32,
    ) -> InventoryResult<Vec<InventoryMovement>> {
        if limit == 0 || limit > MAX_MOVEMENT_PAGE {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: MAX_MOVEMENT_PAGE as i64,
            }
            .into());
        }
        if self.db.products().get_by_id(product_id).await?.is_none() {
            return Err(CoreError::not_found("Product", product_id).into());
        }

        Ok(self.db.movements().list_for_product(product_id, limit).await?)
    }

    /// Stock-health summary over the vendor's active products.
    #[instrument(skip(self))]
    pub async fn get_vendor_inventory_metrics(
        &self,
        vendor_id: &str,
        thresholds: StockThresholds,
    ) -> InventoryResult<InventoryMetrics> {
        thresholds.validate()?;
        if self.db.vendors().get_by_id(vendor_id).await?.is_none() {
            return Err(CoreError::not_found("Vendor", vendor_id).into());
        }

        let levels = self.db.stock().product_levels(vendor_id).await?;
        Ok(calculate_inventory_metrics(&levels, thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::testing::Fixture;
    use futures_util::TryStreamExt;
    use mercato_core::{MovementReason, Product, SyncConfig};

    #[tokio::test]
    async fn test_stream_is_newest_first_and_sums_to_on_hand() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        let (p, a, b) = (fx.product.id.as_str(), fx.location_a.id.as_str(), fx.location_b.id.as_str());

        fx.stock(a, 12).await;
        fx.service
            .update_location_inventory(&sync, p, a, -2, MovementReason::Damage, None)
            .await
            .unwrap();
        fx.service.transfer_inventory(&sync, p, a, b, 4).await.unwrap();
        let reservation = fx.service.reserve_inventory(&sync, p, b, 1).await.unwrap();
        fx.service.fulfill_reserved_inventory(&sync, &reservation.id).await.unwrap();

        let streamed: Vec<_> = fx
            .service
            .get_product_inventory_movements(p)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(streamed.len(), 5);
        assert_eq!(streamed[0].reason, MovementReason::ReservationFulfilled);
        assert_eq!(streamed[4].reason, MovementReason::Restock);

        for location in [a, b] {
            let record = fx.service.get_inventory(p, location).await.unwrap();
            let logged: i64 = streamed
                .iter()
                .filter(|m| m.location_id == location)
                .map(|m| m.quantity_change)
                .sum();
            assert_eq!(logged, record.on_hand_quantity);
        }

        let page = fx.service.list_product_inventory_movements(p, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, streamed[0].id);
    }

    #[tokio::test]
    async fn test_movement_reads_validate_input() {
        let fx = Fixture::new().await;

        assert!(fx.service.get_product_inventory_movements("missing").await.is_err());
        for limit in [0, MAX_MOVEMENT_PAGE + 1] {
            let err = fx
                .service
                .list_product_inventory_movements(&fx.product.id, limit)
                .await
                .unwrap_err();
            assert!(matches!(err.as_core(), Some(CoreError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_vendor_metrics_classify_each_product() {
        let fx = Fixture::new().await;
        let db = fx.service.database();

        // Fixture product stays at zero: out of stock
        let mut products = Vec::new();
        for (sku, price) in [("LOW", 100), ("MID", 200), ("BULK", 10)] {
            products.push(
                db.products()
                    .insert(&Product::new(&fx.vendor.id, sku, sku, price))
                    .await
                    .unwrap(),
            );
        }
        let sync = SyncConfig::disabled(&fx.vendor.id);
        for (product, qty) in products.iter().zip([3, 50, 150]) {
            fx.service
                .update_location_inventory(&sync, &product.id, &fx.location_a.id, qty, MovementReason::Restock, None)
                .await
                .unwrap();
        }

        let metrics = fx
            .service
            .get_vendor_inventory_metrics(&fx.vendor.id, StockThresholds::default())
            .await
            .unwrap();
        assert_eq!(metrics.total_products, 4);
        assert_eq!(metrics.total_units, 203);
        assert_eq!(metrics.total_value_cents, 3 * 100 + 50 * 200 + 150 * 10);
        assert_eq!(metrics.out_of_stock_count, 1);
        assert_eq!(metrics.low_stock_count, 1);
        assert_eq!(metrics.adequate_stock_count, 1);
        assert_eq!(metrics.overstock_count, 1);

        let err = fx
            .service
            .get_vendor_inventory_metrics(&fx.vendor.id, StockThresholds { low: 10, overstock: 10 })
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::Validation(_))));
    }
}
