//! # Stock Repository
//!
//! Storage for [`StockRecord`]s, one row per `(product_id, location_id)`.
//!
//! ## Compare-and-Swap Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  read   SELECT … version = 7                                           │
//! │  rule   next = current.reserved_for(qty)?      (mercato-core)          │
//! │  write  UPDATE stock_records SET …, version = 8                        │
//! │         WHERE product_id = ? AND location_id = ? AND version = 7       │
//! │                                                                         │
//! │  rows_affected == 1  → we won, commit                                  │
//! │  rows_affected == 0  → someone else wrote first, retry from read       │
//! │                                                                         │
//! │  First write for a pair: INSERT … ON CONFLICT DO NOTHING (version 1)   │
//! │  rows_affected == 0 means a concurrent first write, same retry.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use mercato_core::{ProductStockLevel, StockRecord, VendorStockTotals};

const STOCK_COLUMNS: &str =
    "product_id, location_id, on_hand_quantity, reserved_quantity, version, updated_at";

/// Repository for stock reads and aggregates.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Gets the stored record for a pair, if one was ever written.
    pub async fn get(&self, product_id: &str, location_id: &str) -> DbResult<Option<StockRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, product_id, location_id).await
    }

    /// One record per active location of `vendor_id`, zero-filled where the
    /// product was never stocked.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        vendor_id: &str,
    ) -> DbResult<Vec<StockRecord>> {
        let records = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT
                ?1 AS product_id,
                l.id AS location_id,
                COALESCE(s.on_hand_quantity, 0) AS on_hand_quantity,
                COALESCE(s.reserved_quantity, 0) AS reserved_quantity,
                COALESCE(s.version, 0) AS version,
                COALESCE(s.updated_at, l.updated_at) AS updated_at
            FROM inventory_locations l
            LEFT JOIN stock_records s
                ON s.location_id = l.id AND s.product_id = ?1
            WHERE l.vendor_id = ?2 AND l.is_active = 1
            ORDER BY l.created_at, l.id
            "#,
        )
        .bind(product_id)
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Sums stock across the vendor's active locations.
    ///
    /// `product_count` counts products with units on hand somewhere.
    pub async fn vendor_totals(&self, vendor_id: &str) -> DbResult<VendorStockTotals> {
        let (on_hand, reserved, product_count): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(s.on_hand_quantity), 0),
                COALESCE(SUM(s.reserved_quantity), 0),
                COUNT(DISTINCT CASE WHEN s.on_hand_quantity > 0 THEN s.product_id END)
            FROM stock_records s
            JOIN inventory_locations l ON l.id = s.location_id
            WHERE l.vendor_id = ?1 AND l.is_active = 1
            "#,
        )
        .bind(vendor_id)
        .fetch_one(&self.pool)
        .await?;

        let location_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory_locations WHERE vendor_id = ?1 AND is_active = 1",
        )
        .bind(vendor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(VendorStockTotals {
            vendor_id: vendor_id.to_string(),
            on_hand_quantity: on_hand,
            reserved_quantity: reserved,
            available_quantity: on_hand - reserved,
            location_count,
            product_count,
        })
    }

    /// Per-product on-hand totals across the vendor's active locations,
    /// including active products with no stock at all.
    pub async fn product_levels(&self, vendor_id: &str) -> DbResult<Vec<ProductStockLevel>> {
        let levels = sqlx::query_as::<_, ProductStockLevel>(
            r#"
            SELECT
                p.id AS product_id,
                COALESCE(SUM(CASE WHEN l.is_active = 1 THEN s.on_hand_quantity END), 0) AS quantity,
                p.price_cents AS price_cents
            FROM products p
            LEFT JOIN stock_records s ON s.product_id = p.id
            LEFT JOIN inventory_locations l ON l.id = s.location_id
            WHERE p.vendor_id = ?1 AND p.is_active = 1
            GROUP BY p.id, p.price_cents
            ORDER BY p.sku
            "#,
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(levels)
    }
}

/// Loads the stored record for a pair on an existing connection.
pub async fn fetch(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
) -> DbResult<Option<StockRecord>> {
    let record = sqlx::query_as::<_, StockRecord>(&format!(
        "SELECT {STOCK_COLUMNS} FROM stock_records WHERE product_id = ?1 AND location_id = ?2"
    ))
    .bind(product_id)
    .bind(location_id)
    .fetch_optional(conn)
    .await?;

    Ok(record)
}

/// Writes `next` if the stored version still equals `expected_version`.
///
/// `expected_version == 0` means "no row yet" and inserts. Returns the
/// stored record with its new version, or `None` when another writer got
/// there first.
pub async fn compare_and_swap(
    conn: &mut SqliteConnection,
    next: &StockRecord,
    expected_version: i64,
) -> DbResult<Option<StockRecord>> {
    let now = Utc::now();

    debug!(
        product_id = %next.product_id,
        location_id = %next.location_id,
        on_hand = next.on_hand_quantity,
        reserved = next.reserved_quantity,
        expected_version,
        "Writing stock record"
    );

    let result = if expected_version == 0 {
        sqlx::query(
            r#"
            INSERT INTO stock_records (
                product_id, location_id, on_hand_quantity, reserved_quantity, version, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 1, ?5)
            ON CONFLICT (product_id, location_id) DO NOTHING
            "#,
        )
        .bind(&next.product_id)
        .bind(&next.location_id)
        .bind(next.on_hand_quantity)
        .bind(next.reserved_quantity)
        .bind(now)
        .execute(conn)
        .await?
    } else {
        sqlx::query(
            r#"
            UPDATE stock_records SET
                on_hand_quantity = ?3,
                reserved_quantity = ?4,
                version = version + 1,
                updated_at = ?5
            WHERE product_id = ?1 AND location_id = ?2 AND version = ?6
            "#,
        )
        .bind(&next.product_id)
        .bind(&next.location_id)
        .bind(next.on_hand_quantity)
        .bind(next.reserved_quantity)
        .bind(now)
        .bind(expected_version)
        .execute(conn)
        .await?
    };

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    Ok(Some(StockRecord {
        version: expected_version + 1,
        updated_at: now,
        ..next.clone()
    }))
}
