//! # Reservation Manager
//!
//! ```text
//!                      reserve (reserved += q)
//!                              │
//!                              ▼
//!                        ┌──────────┐
//!          release       │ Reserved │       fulfill
//!   (reserved -= q,  ◄───┴──────────┴───►  (reserved -= q,
//!    movement 0)                            on_hand -= q,
//!          │                                movement -q)
//!          ▼                                    │
//!     ┌──────────┐                         ┌───────────┐
//!     │ Released │                         │ Fulfilled │
//!     └──────────┘                         └───────────┘
//! ```
//!
//! The availability check and the `reserved_quantity` increment happen in
//! one compare-and-swap, so two callers racing for the last unit get one
//! success and one `InsufficientStock`.

use chrono::Utc;
use tracing::{info, instrument};

use super::retry::{run_with_retry, Attempt};
use super::{
    current_stock, ensure_same_vendor, ensure_sync_vendor, publish_stock_change,
    require_active_location, require_product, stock_key_id, InventoryResult, InventoryService,
};
use crate::repository::{movement, reservation, stock};
use mercato_core::validation::validate_quantity;
use mercato_core::{
    CoreError, InventoryMovement, MovementReason, Reservation, ReservationStatus, SyncConfig,
    ValidationError,
};

/// Terminal edge taken by release or fulfill.
#[derive(Debug, Clone, Copy)]
enum Resolution {
    Release,
    Fulfill,
}

impl Resolution {
    fn status(self) -> ReservationStatus {
        match self {
            Resolution::Release => ReservationStatus::Released,
            Resolution::Fulfill => ReservationStatus::Fulfilled,
        }
    }

    fn reason(self) -> MovementReason {
        match self {
            Resolution::Release => MovementReason::ReservationReleased,
            Resolution::Fulfill => MovementReason::ReservationFulfilled,
        }
    }

    fn operation(self) -> &'static str {
        match self {
            Resolution::Release => "release_reserved_inventory",
            Resolution::Fulfill => "fulfill_reserved_inventory",
        }
    }

    /// On-hand change logged for the edge.
    fn quantity_change(self, quantity: i64) -> i64 {
        match self {
            Resolution::Release => 0,
            Resolution::Fulfill => -quantity,
        }
    }
}

impl InventoryService {
    /// Earmarks `quantity` available units and opens a `Reserved` reservation.
    ///
    /// No movement is written: on-hand is unchanged.
    #[instrument(skip(self, sync), fields(vendor_id = %sync.vendor_id))]
    pub async fn reserve_inventory(
        &self,
        sync: &SyncConfig,
        product_id: &str,
        location_id: &str,
        quantity: i64,
    ) -> InventoryResult<Reservation> {
        validate_quantity(quantity)?;

        let key = stock_key_id(product_id, location_id);
        let _guard = self.locks.lock(product_id, location_id).await;

        let reservation = run_with_retry(&self.retry, "reserve_inventory", "StockRecord", &key, move || {
            self.try_reserve(sync, product_id, location_id, quantity)
        })
        .await?;

        info!(
            reservation_id = %reservation.id,
            product_id = %product_id,
            location_id = %location_id,
            quantity,
            "Inventory reserved"
        );
        Ok(reservation)
    }

    /// Returns a reservation's units to the available pool.
    #[instrument(skip(self, sync), fields(vendor_id = %sync.vendor_id))]
    pub async fn release_reserved_inventory(
        &self,
        sync: &SyncConfig,
        reservation_id: &str,
    ) -> InventoryResult<Reservation> {
        self.resolve_reservation(sync, reservation_id, Resolution::Release)
            .await
    }

    /// Ships a reservation's units: they leave the location.
    #[instrument(skip(self, sync), fields(vendor_id = %sync.vendor_id))]
    pub async fn fulfill_reserved_inventory(
        &self,
        sync: &SyncConfig,
        reservation_id: &str,
    ) -> InventoryResult<Reservation> {
        self.resolve_reservation(sync, reservation_id, Resolution::Fulfill)
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_reservation(&self, id: &str) -> InventoryResult<Reservation> {
        self.db
            .reservations()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", id).into())
    }

    /// A product's reservations, newest first.
    #[instrument(skip(self))]
    pub async fn list_reservations(
        &self,
        product_id: &str,
        location_id: Option<&str>,
        status: Option<ReservationStatus>,
    ) -> InventoryResult<Vec<Reservation>> {
        if self.db.products().get_by_id(product_id).await?.is_none() {
            return Err(CoreError::not_found("Product", product_id).into());
        }

        Ok(self
            .db
            .reservations()
            .list(product_id, location_id, status)
            .await?)
    }

    async fn try_reserve(
        &self,
        sync: &SyncConfig,
        product_id: &str,
        location_id: &str,
        quantity: i64,
    ) -> InventoryResult<Attempt<Reservation>> {
        let mut tx = self.db.pool().begin().await?;

        let product = require_product(&mut tx, product_id).await?;
        if !product.is_active {
            return Err(ValidationError::Inactive {
                entity: "Product".to_string(),
                id: product.id,
            }
            .into());
        }
        let location = require_active_location(&mut tx, location_id).await?;
        ensure_same_vendor(&product, &location)?;
        ensure_sync_vendor(sync, &product.vendor_id)?;

        let current = current_stock(&mut tx, product_id, location_id).await?;
        let next = current.reserved_for(quantity)?;

        let Some(stored) = stock::compare_and_swap(&mut tx, &next, current.version).await? else {
            return Ok(Attempt::Contended);
        };

        let created = Reservation::new(product_id, location_id, quantity);
        reservation::insert(&mut tx, &created).await?;

        publish_stock_change(&mut tx, sync, &product, "reserve", std::slice::from_ref(&stored)).await?;

        tx.commit().await?;
        Ok(Attempt::Done(created))
    }

    async fn resolve_reservation(
        &self,
        sync: &SyncConfig,
        reservation_id: &str,
        resolution: Resolution,
    ) -> InventoryResult<Reservation> {
        // The pair to lock is only known from the stored reservation
        let existing = self.get_reservation(reservation_id).await?;
        let _guard = self
            .locks
            .lock(&existing.product_id, &existing.location_id)
            .await;

        let resolved = run_with_retry(
            &self.retry,
            resolution.operation(),
            "Reservation",
            reservation_id,
            move || self.try_resolve(sync, reservation_id, resolution),
        )
        .await?;

        info!(
            reservation_id = %resolved.id,
            product_id = %resolved.product_id,
            location_id = %resolved.location_id,
            quantity = resolved.quantity,
            status = %resolved.status,
            "Reservation resolved"
        );
        Ok(resolved)
    }

    async fn try_resolve(
        &self,
        sync: &SyncConfig,
        reservation_id: &str,
        resolution: Resolution,
    ) -> InventoryResult<Attempt<Reservation>> {
        let mut tx = self.db.pool().begin().await?;

        let current = reservation::fetch(&mut tx, reservation_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Reservation", reservation_id))?;
        let resolved_at = Utc::now();
        let next = current.transition(resolution.status(), resolved_at)?;

        let product = require_product(&mut tx, &current.product_id).await?;
        ensure_sync_vendor(sync, &product.vendor_id)?;

        let stock_now = stock::fetch(&mut tx, &current.product_id, &current.location_id)
            .await?
            .ok_or_else(|| CoreError::LedgerInconsistent {
                product_id: current.product_id.clone(),
                location_id: current.location_id.clone(),
                reason: format!("no stock record behind reservation {}", current.id),
            })?;

        let stock_next = match resolution {
            Resolution::Release => stock_now.released(current.quantity)?,
            Resolution::Fulfill => stock_now.fulfilled(current.quantity)?,
        };

        let Some(stored) = stock::compare_and_swap(&mut tx, &stock_next, stock_now.version).await? else {
            return Ok(Attempt::Contended);
        };

        if !reservation::resolve(&mut tx, &next.id, next.status, resolved_at).await? {
            return Ok(Attempt::Contended);
        }

        let log = InventoryMovement::new(
            &current.product_id,
            &current.location_id,
            resolution.quantity_change(current.quantity),
            resolution.reason(),
        )
        .with_reference(&current.id);
        movement::append(&mut tx, &log).await?;

        publish_stock_change(
            &mut tx,
            sync,
            &product,
            resolution.status().as_str(),
            std::slice::from_ref(&stored),
        )
        .await?;

        tx.commit().await?;
        Ok(Attempt::Done(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::testing::Fixture;
    use crate::inventory::RetryPolicy;
    use crate::{Database, DbConfig};
    use mercato_core::{InventoryLocation, MovementReason, Product, Vendor};
    use std::time::Duration;

    #[tokio::test]
    async fn test_reserve_fulfill_reserve_release_scenario() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        let (p, l) = (fx.product.id.as_str(), fx.location_a.id.as_str());
        fx.stock(l, 10).await;

        let first = fx.service.reserve_inventory(&sync, p, l, 4).await.unwrap();
        assert_eq!(first.status, ReservationStatus::Reserved);
        let record = fx.service.get_inventory(p, l).await.unwrap();
        assert_eq!((record.on_hand_quantity, record.reserved_quantity), (10, 4));
        assert_eq!(record.available_quantity(), 6);

        let fulfilled = fx.service.fulfill_reserved_inventory(&sync, &first.id).await.unwrap();
        assert_eq!(fulfilled.status, ReservationStatus::Fulfilled);
        assert!(fulfilled.resolved_at.is_some());
        let record = fx.service.get_inventory(p, l).await.unwrap();
        assert_eq!((record.on_hand_quantity, record.reserved_quantity), (6, 0));

        let second = fx.service.reserve_inventory(&sync, p, l, 3).await.unwrap();
        let released = fx.service.release_reserved_inventory(&sync, &second.id).await.unwrap();
        assert_eq!(released.status, ReservationStatus::Released);
        let record = fx.service.get_inventory(p, l).await.unwrap();
        assert_eq!((record.on_hand_quantity, record.reserved_quantity), (6, 0));

        let movements = fx.service.list_product_inventory_movements(p, 50).await.unwrap();
        let zero_moves: Vec<_> = movements
            .iter()
            .filter(|m| m.reason == MovementReason::ReservationReleased)
            .collect();
        assert_eq!(zero_moves.len(), 1);
        assert_eq!(zero_moves[0].quantity_change, 0);
        assert_eq!(zero_moves[0].reference_id.as_deref(), Some(second.id.as_str()));

        let fulfilled_move = movements
            .iter()
            .find(|m| m.reason == MovementReason::ReservationFulfilled)
            .unwrap();
        assert_eq!(fulfilled_move.quantity_change, -4);

        let net = fx.service.database().movements().net_change(p, l).await.unwrap();
        assert_eq!(net, record.on_hand_quantity);
    }

    #[tokio::test]
    async fn test_terminal_reservations_reject_transitions() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        fx.stock(&fx.location_a.id, 5).await;

        let reservation = fx
            .service
            .reserve_inventory(&sync, &fx.product.id, &fx.location_a.id, 2)
            .await
            .unwrap();
        fx.service
            .release_reserved_inventory(&sync, &reservation.id)
            .await
            .unwrap();

        for result in [
            fx.service.release_reserved_inventory(&sync, &reservation.id).await,
            fx.service.fulfill_reserved_inventory(&sync, &reservation.id).await,
        ] {
            assert!(matches!(
                result.unwrap_err().as_core(),
                Some(CoreError::InvalidState { current_status, .. }) if current_status == "released"
            ));
        }

        let err = fx
            .service
            .fulfill_reserved_inventory(&sync, "missing")
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_over_reservation_has_no_effect() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        fx.stock(&fx.location_a.id, 3).await;

        let err = fx
            .service
            .reserve_inventory(&sync, &fx.product.id, &fx.location_a.id, 4)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_core(),
            Some(CoreError::InsufficientStock { available: 3, requested: 4, .. })
        ));

        let record = fx.service.get_inventory(&fx.product.id, &fx.location_a.id).await.unwrap();
        assert_eq!(record.reserved_quantity, 0);
        assert_eq!(record.version, 1);
        let reservations = fx
            .service
            .list_reservations(&fx.product.id, None, None)
            .await
            .unwrap();
        assert!(reservations.is_empty());

        let err = fx
            .service
            .reserve_inventory(&sync, &fx.product.id, &fx.location_a.id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reserved_matches_pending_reservations() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        let (p, l) = (fx.product.id.as_str(), fx.location_a.id.as_str());
        fx.stock(l, 20).await;

        let mut ids = Vec::new();
        for qty in [1, 2, 3, 4, 5] {
            ids.push(fx.service.reserve_inventory(&sync, p, l, qty).await.unwrap().id);
        }
        fx.service.fulfill_reserved_inventory(&sync, &ids[1]).await.unwrap();
        fx.service.release_reserved_inventory(&sync, &ids[3]).await.unwrap();

        let record = fx.service.get_inventory(p, l).await.unwrap();
        let pending = fx
            .service
            .database()
            .reservations()
            .pending_quantity(p, l)
            .await
            .unwrap();
        assert_eq!(record.reserved_quantity, pending);
        assert_eq!(pending, 1 + 3 + 5);
        assert_eq!(record.on_hand_quantity, 18);

        let open = fx
            .service
            .list_reservations(p, Some(l), Some(ReservationStatus::Reserved))
            .await
            .unwrap();
        assert_eq!(open.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_for_last_unit() {
        let fx = Fixture::new().await;
        fx.stock(&fx.location_a.id, 1).await;

        let mut tasks = Vec::new();
        for _ in 0..2 {
            let service = fx.service.clone();
            let sync = SyncConfig::disabled(&fx.vendor.id);
            let (p, l) = (fx.product.id.clone(), fx.location_a.id.clone());
            tasks.push(tokio::spawn(async move {
                service.reserve_inventory(&sync, &p, &l, 1).await
            }));
        }

        let mut ok = 0;
        let mut insufficient = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => ok += 1,
                Err(err) if matches!(err.as_core(), Some(CoreError::InsufficientStock { .. })) => {
                    insufficient += 1
                }
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
        assert_eq!((ok, insufficient), (1, 1));

        let record = fx.service.get_inventory(&fx.product.id, &fx.location_a.id).await.unwrap();
        assert_eq!(record.reserved_quantity, 1);
    }

    #[tokio::test]
    async fn test_inactive_product_cannot_be_reserved() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        fx.stock(&fx.location_a.id, 2).await;
        fx.service.database().products().soft_delete(&fx.product.id).await.unwrap();

        let err = fx
            .service
            .reserve_inventory(&sync, &fx.product.id, &fx.location_a.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_core(),
            Some(CoreError::Validation(ValidationError::Inactive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unknown_pairs_leave_no_lock_entries() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);

        for i in 0..200 {
            let err = fx
                .service
                .reserve_inventory(&sync, &format!("ghost-{i}"), "nowhere", 1)
                .await
                .unwrap_err();
            assert!(matches!(err.as_core(), Some(CoreError::NotFound { .. })));
        }
        assert!(fx.service.locks.is_empty());

        fx.stock(&fx.location_a.id, 3).await;
        let held = fx
            .service
            .reserve_inventory(&sync, &fx.product.id, &fx.location_a.id, 2)
            .await
            .unwrap();
        fx.service.release_reserved_inventory(&sync, &held.id).await.unwrap();
        assert!(fx.service.locks.is_empty());
    }

    /// Two services on one file share no lock table, as two processes
    /// would. Only the version check and SQLite's write lock keep them
    /// from over-reserving.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_separate_services_on_one_file_never_over_reserve() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.db");
        let config = || {
            DbConfig::new(&path)
                .max_connections(4)
                .busy_timeout(Duration::from_secs(2))
        };
        let policy = RetryPolicy::new(50, Duration::from_millis(2), Duration::from_millis(50));

        let db_one = Database::new(config()).await.unwrap();
        let db_two = Database::new(config().run_migrations(false)).await.unwrap();

        let vendor = db_one.vendors().insert(&Vendor::new("Acme Goods")).await.unwrap();
        let product = db_one
            .products()
            .insert(&Product::new(&vendor.id, "MUG-001", "Enamel Mug", 1200))
            .await
            .unwrap();
        let location = db_one
            .locations()
            .insert(&InventoryLocation::new(&vendor.id, "Warehouse"))
            .await
            .unwrap();

        let one = InventoryService::with_retry_policy(db_one, policy);
        let two = InventoryService::with_retry_policy(db_two, policy);
        let sync = SyncConfig::disabled(&vendor.id);
        one.update_location_inventory(&sync, &product.id, &location.id, 10, MovementReason::Restock, None)
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for i in 0..30 {
            let service = if i % 2 == 0 { one.clone() } else { two.clone() };
            let sync = sync.clone();
            let (p, l) = (product.id.clone(), location.id.clone());
            tasks.push(tokio::spawn(async move {
                service.reserve_inventory(&sync, &p, &l, 1).await
            }));
        }

        let mut ok = 0;
        let mut insufficient = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => ok += 1,
                Err(err) if matches!(err.as_core(), Some(CoreError::InsufficientStock { .. })) => {
                    insufficient += 1
                }
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
        assert_eq!((ok, insufficient), (10, 20));

        let record = two.get_inventory(&product.id, &location.id).await.unwrap();
        let pending = one
            .database()
            .reservations()
            .pending_quantity(&product.id, &location.id)
            .await
            .unwrap();
        assert_eq!(record.reserved_quantity, ok);
        assert_eq!(pending, ok);
        assert_eq!(record.on_hand_quantity, 10);
        assert!(record.reserved_quantity <= record.on_hand_quantity);

        one.database().close().await;
        two.database().close().await;
    }

    #[tokio::test]
    async fn test_corrupt_stock_row_is_reported_not_overwritten() {
        let fx = Fixture::new().await;
        let sync = SyncConfig::disabled(&fx.vendor.id);
        let (p, l) = (fx.product.id.as_str(), fx.location_a.id.as_str());
        fx.stock(l, 5).await;

        // In-memory pool has a single connection, so the pragma sticks
        let pool = fx.service.database().pool();
        sqlx::query("PRAGMA ignore_check_constraints = ON").execute(pool).await.unwrap();
        sqlx::query("UPDATE stock_records SET reserved_quantity = 9 WHERE product_id = ?1 AND location_id = ?2")
            .bind(p)
            .bind(l)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("PRAGMA ignore_check_constraints = OFF").execute(pool).await.unwrap();

        let err = fx.service.reserve_inventory(&sync, p, l, 1).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::LedgerInconsistent { .. })));

        let stored = fx.service.get_inventory(p, l).await.unwrap();
        assert_eq!((stored.on_hand_quantity, stored.reserved_quantity), (5, 9));
    }
}
