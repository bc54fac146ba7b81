//! # Location Repository
//!
//! Database operations for inventory locations.
//!
//! Locations are never deleted (a trigger enforces it); deactivation is an
//! UPDATE of `is_active`. The "is anything still here?" checks that guard
//! deactivation run on the caller's transaction connection.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercato_core::InventoryLocation;

const LOCATION_COLUMNS: &str = "id, vendor_id, name, is_active, created_at, updated_at";

/// Repository for inventory location operations.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    /// Creates a new LocationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    /// Inserts a new location.
    pub async fn insert(&self, location: &InventoryLocation) -> DbResult<InventoryLocation> {
        debug!(id = %location.id, vendor_id = %location.vendor_id, "Inserting location");

        sqlx::query(
            r#"
            INSERT INTO inventory_locations (
                id, vendor_id, name, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&location.id)
        .bind(&location.vendor_id)
        .bind(&location.name)
        .bind(location.is_active)
        .bind(location.created_at)
        .bind(location.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(location.clone())
    }

    /// Gets a location by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryLocation>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Lists a vendor's locations in creation order.
    ///
    /// ## Arguments
    /// * `include_inactive` - also return deactivated locations
    pub async fn list_by_vendor(
        &self,
        vendor_id: &str,
        include_inactive: bool,
    ) -> DbResult<Vec<InventoryLocation>> {
        let locations = sqlx::query_as::<_, InventoryLocation>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM inventory_locations \
             WHERE vendor_id = ?1 AND (?2 OR is_active = 1) \
             ORDER BY created_at, id"
        ))
        .bind(vendor_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }
}

/// Loads a location on an existing connection.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<InventoryLocation>> {
    let location = sqlx::query_as::<_, InventoryLocation>(&format!(
        "SELECT {LOCATION_COLUMNS} FROM inventory_locations WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(location)
}

/// Writes name, active flag and `updated_at`.
pub async fn update(conn: &mut SqliteConnection, location: &InventoryLocation) -> DbResult<()> {
    debug!(id = %location.id, is_active = location.is_active, "Updating location");

    let result = sqlx::query(
        "UPDATE inventory_locations SET name = ?2, is_active = ?3, updated_at = ?4 WHERE id = ?1",
    )
    .bind(&location.id)
    .bind(&location.name)
    .bind(location.is_active)
    .bind(location.updated_at)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("InventoryLocation", &location.id));
    }

    Ok(())
}

/// Number of stock records at the location still holding on-hand or
/// reserved units.
pub async fn count_nonzero_stock(conn: &mut SqliteConnection, location_id: &str) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM stock_records \
         WHERE location_id = ?1 AND (on_hand_quantity <> 0 OR reserved_quantity <> 0)",
    )
    .bind(location_id)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

/// Number of reservations at the location still in `reserved` status.
pub async fn count_pending_reservations(
    conn: &mut SqliteConnection,
    location_id: &str,
) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM inventory_reservations WHERE location_id = ?1 AND status = 'reserved'",
    )
    .bind(location_id)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use mercato_core::Vendor;

    #[tokio::test]
    async fn test_list_filters_inactive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let vendor = db.vendors().insert(&Vendor::new("Acme")).await.unwrap();
        let repo = db.locations();

        let main = repo
            .insert(&InventoryLocation::new(&vendor.id, "Main"))
            .await
            .unwrap();
        let mut overflow = repo
            .insert(&InventoryLocation::new(&vendor.id, "Overflow"))
            .await
            .unwrap();

        overflow.is_active = false;
        let mut conn = db.pool().acquire().await.unwrap();
        update(&mut conn, &overflow).await.unwrap();
        drop(conn);

        let active = repo.list_by_vendor(&vendor.id, false).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, main.id);

        let all = repo.list_by_vendor(&vendor.id, true).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_hard_delete_is_refused() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let vendor = db.vendors().insert(&Vendor::new("Acme")).await.unwrap();
        let location = db
            .locations()
            .insert(&InventoryLocation::new(&vendor.id, "Main"))
            .await
            .unwrap();

        let result = sqlx::query("DELETE FROM inventory_locations WHERE id = ?1")
            .bind(&location.id)
            .execute(db.pool())
            .await;
        assert!(result.is_err());
        assert!(db.locations().get_by_id(&location.id).await.unwrap().is_some());
    }
}
