//! # Reservation Repository
//!
//! Storage for reservations. The terminal transition is itself a
//! compare-and-swap on `status = 'reserved'`, so two racing release/fulfill
//! calls cannot both resolve the same reservation.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use mercato_core::{Reservation, ReservationStatus};

const RESERVATION_COLUMNS: &str =
    "id, product_id, location_id, quantity, status, created_at, resolved_at";

#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Reservation>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Lists a product's reservations, newest first.
    ///
    /// `location_id` and `status` narrow the result when given.
    pub async fn list(
        &self,
        product_id: &str,
        location_id: Option<&str>,
        status: Option<ReservationStatus>,
    ) -> DbResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM inventory_reservations \
             WHERE product_id = ?1 \
               AND (?2 IS NULL OR location_id = ?2) \
               AND (?3 IS NULL OR status = ?3) \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(product_id)
        .bind(location_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    /// Sum of quantities still in `reserved` status for a pair.
    pub async fn pending_quantity(&self, product_id: &str, location_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM inventory_reservations \
             WHERE product_id = ?1 AND location_id = ?2 AND status = 'reserved'",
        )
        .bind(product_id)
        .bind(location_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

/// Loads a reservation on an existing connection.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Reservation>> {
    let reservation = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM inventory_reservations WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(reservation)
}

pub async fn insert(conn: &mut SqliteConnection, reservation: &Reservation) -> DbResult<()> {
    debug!(
        id = %reservation.id,
        product_id = %reservation.product_id,
        location_id = %reservation.location_id,
        quantity = reservation.quantity,
        "Inserting reservation"
    );

    sqlx::query(
        r#"
        INSERT INTO inventory_reservations (
            id, product_id, location_id, quantity, status, created_at, resolved_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&reservation.id)
    .bind(&reservation.product_id)
    .bind(&reservation.location_id)
    .bind(reservation.quantity)
    .bind(reservation.status)
    .bind(reservation.created_at)
    .bind(reservation.resolved_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Moves a reservation out of `reserved`. Returns false if it was no longer
/// `reserved` when the write landed.
pub async fn resolve(
    conn: &mut SqliteConnection,
    id: &str,
    status: ReservationStatus,
    resolved_at: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, status = %status, "Resolving reservation");

    let result = sqlx::query(
        "UPDATE inventory_reservations SET status = ?2, resolved_at = ?3 \
         WHERE id = ?1 AND status = 'reserved'",
    )
    .bind(id)
    .bind(status)
    .bind(resolved_at)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
