//! # Vendor Repository

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use mercato_core::Vendor;

#[derive(Debug, Clone)]
pub struct VendorRepository {
    pool: SqlitePool,
}

impl VendorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        VendorRepository { pool }
    }

    pub async fn insert(&self, vendor: &Vendor) -> DbResult<Vendor> {
        debug!(id = %vendor.id, name = %vendor.name, "Inserting vendor");

        sqlx::query(
            "INSERT INTO vendors (id, name, is_active, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&vendor.id)
        .bind(&vendor.name)
        .bind(vendor.is_active)
        .bind(vendor.created_at)
        .execute(&self.pool)
        .await?;

        Ok(vendor.clone())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Vendor>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn list(&self) -> DbResult<Vec<Vendor>> {
        let vendors = sqlx::query_as::<_, Vendor>(
            "SELECT id, name, is_active, created_at FROM vendors ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(vendors)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendors")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Loads a vendor on an existing connection.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Vendor>> {
    let vendor = sqlx::query_as::<_, Vendor>(
        "SELECT id, name, is_active, created_at FROM vendors WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(vendor)
}
