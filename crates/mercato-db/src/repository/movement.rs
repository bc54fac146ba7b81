//! # Movement Repository
//!
//! The append-only audit log of stock changes.
//!
//! ## Write Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    UPDATE stock_records … (CAS)                                        │
//! │    INSERT INTO inventory_movements …   ← same transaction              │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  UPDATE / DELETE on inventory_movements → trigger aborts               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads are newest first. `created_at` ties (both legs of one transfer)
//! are broken by insertion order.

use futures_util::stream::{BoxStream, StreamExt};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercato_core::InventoryMovement;

const PRODUCT_MOVEMENTS_SQL: &str = r#"
    SELECT id, product_id, location_id, quantity_change, reason, reference_id, note, created_at
    FROM inventory_movements
    WHERE product_id = ?1
    ORDER BY created_at DESC, rowid DESC
"#;

#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Streams a product's movements, newest first.
    ///
    /// Rows are decoded as the caller polls; dropping the stream stops the
    /// query and returns the connection.
    pub fn stream_for_product(&self, product_id: &str) -> BoxStream<'_, DbResult<InventoryMovement>> {
        stream_for_product(&self.pool, product_id)
    }

    /// The newest `limit` movements of a product.
    pub async fn list_for_product(&self, product_id: &str, limit: u32) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            "{PRODUCT_MOVEMENTS_SQL} LIMIT ?2"
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// All movements tagged with a transfer or reservation id, oldest first.
    pub async fn list_by_reference(&self, reference_id: &str) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT id, product_id, location_id, quantity_change, reason, reference_id, note, created_at
            FROM inventory_movements
            WHERE reference_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Sum of `quantity_change` for a pair; equals its on-hand quantity
    /// when every change went through the log.
    pub async fn net_change(&self, product_id: &str, location_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity_change), 0) FROM inventory_movements \
             WHERE product_id = ?1 AND location_id = ?2",
        )
        .bind(product_id)
        .bind(location_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

/// Pool-level form of [`MovementRepository::stream_for_product`] for callers
/// that hold the pool rather than a repository.
pub fn stream_for_product<'p>(
    pool: &'p SqlitePool,
    product_id: &str,
) -> BoxStream<'p, DbResult<InventoryMovement>> {
    sqlx::query_as::<_, InventoryMovement>(PRODUCT_MOVEMENTS_SQL)
        .bind(product_id.to_string())
        .fetch(pool)
        .map(|row| row.map_err(DbError::from))
        .boxed()
}

/// Appends a movement on the caller's transaction.
pub async fn append(conn: &mut SqliteConnection, movement: &InventoryMovement) -> DbResult<()> {
    debug!(
        id = %movement.id,
        product_id = %movement.product_id,
        location_id = %movement.location_id,
        quantity_change = movement.quantity_change,
        reason = %movement.reason,
        "Appending movement"
    );

    sqlx::query(
        r#"
        INSERT INTO inventory_movements (
            id, product_id, location_id, quantity_change, reason, reference_id, note, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(&movement.location_id)
    .bind(movement.quantity_change)
    .bind(movement.reason)
    .bind(&movement.reference_id)
    .bind(&movement.note)
    .bind(movement.created_at)
    .execute(conn)
    .await?;

    Ok(())
}
