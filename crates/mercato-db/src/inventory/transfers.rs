//! # Transfer Coordinator
//!
//! Moves available units of one product between two locations of the same
//! vendor.
//!
//! ```text
//!   transfer_inventory(sync, p, A → B, 4)          transfer_id = T
//!
//!   lock (p,A) (p,B)  in sorted order
//!   BEGIN
//!     A: on_hand 10 ──► 6     CAS on A.version
//!     B: on_hand  1 ──► 5     CAS on B.version
//!     movements  + { p, A, -4, transfer_out, ref T }
//!                + { p, B, +4, transfer_in,  ref T }
//!     sync_outbox + STOCK { records: [A, B] }
//!   COMMIT                    both legs or neither
//! ```
//!
//! Reserved units never move: only `available_quantity` at the source can
//! be transferred.

use tracing::{info, instrument};
use uuid::Uuid;

use super::retry::{run_with_retry, Attempt};
use super::{
    current_stock, ensure_same_vendor, ensure_sync_vendor, publish_stock_change,
    require_active_location, require_product, stock_key_id, InventoryResult, InventoryService,
    TransferOutcome,
};
use crate::repository::{movement, stock};
use mercato_core::validation::validate_transfer;
use mercato_core::{CoreError, InventoryMovement, MovementReason, SyncConfig};

impl InventoryService {
    /// Transfers `quantity` units of a product from one location to another.
    ///
    /// ## Errors
    /// - `Validation`: same location, non-positive quantity, inactive or
    ///   foreign location
    /// - `NotFound`: unknown product or location
    /// - `InsufficientStock`: source has fewer than `quantity` available
    /// - `ConcurrentModification`: retries exhausted
    #[instrument(skip(self, sync), fields(vendor_id = %sync.vendor_id))]
    pub async fn transfer_inventory(
        &self,
        sync: &SyncConfig,
        product_id: &str,
        from_location_id: &str,
        to_location_id: &str,
        quantity: i64,
    ) -> InventoryResult<TransferOutcome> {
        validate_transfer(from_location_id, to_location_id, quantity)?;

        let transfer_id = Uuid::new_v4().to_string();
        let transfer_ref = transfer_id.as_str();
        let key = stock_key_id(product_id, from_location_id);

        let _guard = self
            .locks
            .lock_all(vec![
                (product_id.to_string(), from_location_id.to_string()),
                (product_id.to_string(), to_location_id.to_string()),
            ])
            .await;

        let outcome = run_with_retry(&self.retry, "transfer_inventory", "StockRecord", &key, move || {
            self.try_transfer(sync, transfer_ref, product_id, from_location_id, to_location_id, quantity)
        })
        .await?;

        info!(
            transfer_id = %outcome.transfer_id,
            product_id = %product_id,
            from = %from_location_id,
            to = %to_location_id,
            quantity,
            "Inventory transferred"
        );
        Ok(outcome)
    }

    /// Both legs of a completed transfer, `transfer_out` first.
    #[instrument(skip(self))]
    pub async fn get_transfer_movements(&self, transfer_id: &str) -> InventoryResult<Vec<InventoryMovement>> {
        let movements: Vec<_> = self
            .db
            .movements()
            .list_by_reference(transfer_id)
            .await?
            .into_iter()
            .filter(|m| matches!(m.reason, MovementReason::TransferOut | MovementReason::TransferIn))
            .collect();

        if movements.is_empty() {
            return Err(CoreError::not_found("Transfer", transfer_id).into());
        }
        Ok(movements)
    }

    async fn try_transfer(
        &self,
        sync: &SyncConfig,
        transfer_id: &str,
        product_id: &str,
        from_location_id: &str,
        to_location_id: &str,
        quantity: i64,
    ) -> InventoryResult<Attempt<TransferOutcome>> {
        let mut tx = self.db.pool().begin().await?;

        let product = require_product(&mut tx, product_id).await?;
        let from = require_active_location(&mut tx, from_location_id).await?;
        let to = require_active_location(&mut tx, to_location_id).await?;
        ensure_same_vendor(&product, &from)?;
        ensure_same_vendor(&product, &to)?;
        ensure_sync_vendor(sync, &product.vendor_id)?;

        let source = current_stock(&mut tx, product_id, from_location_id).await?;
        let destination = current_stock(&mut tx, product_id, to_location_id).await?;
        let source_next = source.debited(quantity)?;
        let destination_next = destination.credited(quantity)?;

        let Some(source) = stock::compare_and_swap(&mut tx, &source_next, source.version).await? else {
            return Ok(Attempt::Contended);
        };
        let Some(destination) =
            stock::compare_and_swap(&mut tx, &destination_next, destination.version).await?
        else {
            return Ok(Attempt::Contended);
        };

        let movements = vec![
            InventoryMovement::new(product_id, from_location_id, -quantity, MovementReason::TransferOut)
                .with_reference(transfer_id),
            InventoryMovement::new(product_id, to_location_id, quantity, MovementReason::TransferIn)
                .with_reference(transfer_id),
        ];
        for leg in &movements {
            movement::append(&mut tx, leg).await?;
        }

        let records = [source.clone(), destination.clone()];
        publish_stock_change(&mut tx, sync, &product, "transfer", &records).await?;

        tx.commit().await?;
        Ok(Attempt::Done(TransferOutcome {
            transfer_id: transfer_id.to_string(),
            source,
            destination,
            movements,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::testing::Fixture;
    use mercato_core::ValidationError;

    #[tokio::test]
    async fn test_transfer_moves_stock_and_logs_both_legs() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        fx.stock(&fx.location_a.id, 10).await;
        fx.stock(&fx.location_b.id, 1).await;

        let outcome = fx
            .service
            .transfer_inventory(&sync, &fx.product.id, &fx.location_a.id, &fx.location_b.id, 4)
            .await
            .unwrap();
        assert_eq!(outcome.source.on_hand_quantity, 6);
        assert_eq!(outcome.destination.on_hand_quantity, 5);
        assert_eq!(outcome.movements.len(), 2);
        assert_eq!(outcome.movements[0].quantity_change, -4);
        assert_eq!(outcome.movements[0].reason, MovementReason::TransferOut);
        assert_eq!(outcome.movements[1].quantity_change, 4);
        assert_eq!(outcome.movements[1].reason, MovementReason::TransferIn);

        let legs = fx
            .service
            .get_transfer_movements(&outcome.transfer_id)
            .await
            .unwrap();
        let leg_ids: Vec<_> = legs.iter().map(|m| m.id.as_str()).collect();
        let outcome_ids: Vec<_> = outcome.movements.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(leg_ids, outcome_ids);

        let err = fx
            .service
            .get_transfer_movements("00000000-0000-4000-8000-000000000000")
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_round_trip_restores_both_locations() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        let (p, a, b) = (fx.product.id.as_str(), fx.location_a.id.as_str(), fx.location_b.id.as_str());
        fx.stock(a, 7).await;
        fx.stock(b, 3).await;

        fx.service.transfer_inventory(&sync, p, a, b, 5).await.unwrap();
        fx.service.transfer_inventory(&sync, p, b, a, 5).await.unwrap();

        let at_a = fx.service.get_inventory(p, a).await.unwrap();
        let at_b = fx.service.get_inventory(p, b).await.unwrap();
        assert_eq!(at_a.on_hand_quantity, 7);
        assert_eq!(at_b.on_hand_quantity, 3);

        let movements = fx.service.database().movements();
        assert_eq!(movements.net_change(p, a).await.unwrap(), 7);
        assert_eq!(movements.net_change(p, b).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reserved_units_are_not_transferable() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        let (p, a, b) = (fx.product.id.as_str(), fx.location_a.id.as_str(), fx.location_b.id.as_str());
        fx.stock(a, 5).await;
        fx.service.reserve_inventory(&sync, p, a, 3).await.unwrap();

        let err = fx.service.transfer_inventory(&sync, p, a, b, 3).await.unwrap_err();
        assert!(matches!(
            err.as_core(),
            Some(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));

        // Neither leg applied
        assert_eq!(fx.service.get_inventory(p, a).await.unwrap().on_hand_quantity, 5);
        assert_eq!(fx.service.get_inventory(p, b).await.unwrap().version, 0);
        assert_eq!(fx.service.list_product_inventory_movements(p, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transfer_validation() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        let (p, a, b) = (fx.product.id.as_str(), fx.location_a.id.as_str(), fx.location_b.id.as_str());

        let err = fx.service.transfer_inventory(&sync, p, a, a, 1).await.unwrap_err();
        assert!(matches!(
            err.as_core(),
            Some(CoreError::Validation(ValidationError::MustDiffer { .. }))
        ));

        let err = fx.service.transfer_inventory(&sync, p, a, b, 0).await.unwrap_err();
        assert!(matches!(
            err.as_core(),
            Some(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));

        let err = fx.service.transfer_inventory(&sync, p, a, "nowhere", 1).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::NotFound { .. })));
        assert!(fx.service.locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_opposite_transfers_conserve_stock() {
        let fx = Fixture::new().await;
        fx.stock(&fx.location_a.id, 50).await;
        fx.stock(&fx.location_b.id, 50).await;

        let mut tasks = Vec::new();
        for i in 0..10 {
            let service = fx.service.clone();
            let sync = SyncConfig::disabled(&fx.vendor.id);
            let p = fx.product.id.clone();
            let (from, to) = if i % 2 == 0 {
                (fx.location_a.id.clone(), fx.location_b.id.clone())
            } else {
                (fx.location_b.id.clone(), fx.location_a.id.clone())
            };
            tasks.push(tokio::spawn(async move {
                service.transfer_inventory(&sync, &p, &from, &to, 3).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let across = fx.service.get_across_locations(&fx.product.id).await.unwrap();
        assert_eq!(across.iter().map(|r| r.on_hand_quantity).sum::<i64>(), 100);
        assert_eq!(across.iter().map(|r| r.on_hand_quantity).collect::<Vec<_>>(), vec![50, 50]);
    }
}
