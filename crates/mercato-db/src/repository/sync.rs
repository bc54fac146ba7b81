//! # Sync Outbox Repository
//!
//! Manages the outbox of stock notifications for vendors with real-time
//! sync switched on.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  STOCK MUTATION (e.g., reserve_inventory, sync enabled)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. UPDATE stock_records … WHERE version = ?                   │   │
//! │  │  2. INSERT INTO inventory_movements …                          │   │
//! │  │  3. INSERT INTO sync_outbox (entity_type, entity_id, payload)  │   │
//! │  │     VALUES ('STOCK', <product id>, <stock JSON>)               │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← all succeed or all fail                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Downstream consumer (outside this repository) polls get_pending,      │
//! │  then mark_synced / mark_failed                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use mercato_core::SyncOutboxEntry;

/// Entity type for stock change notifications.
pub const ENTITY_STOCK: &str = "STOCK";

/// Repository for sync outbox operations.
#[derive(Debug, Clone)]
pub struct SyncOutboxRepository {
    pool: SqlitePool,
}

impl SyncOutboxRepository {
    /// Creates a new SyncOutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncOutboxRepository { pool }
    }

    /// Gets pending entries, oldest first.
    pub async fn get_pending(&self, limit: u32) -> DbResult<Vec<SyncOutboxEntry>> {
        let entries = sqlx::query_as::<_, SyncOutboxEntry>(
            r#"
            SELECT
                id, vendor_id, entity_type, entity_id, payload,
                attempts, last_error, created_at, attempted_at, synced_at
            FROM sync_outbox
            WHERE synced_at IS NULL
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Marks an entry as successfully synced.
    pub async fn mark_synced(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE sync_outbox SET synced_at = ?2, attempted_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Records a sync failure.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sync_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts pending sync entries.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sync_outbox WHERE synced_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

/// Queues an entity for synchronization on the caller's transaction.
///
/// ## Arguments
/// * `entity_type` - e.g. [`ENTITY_STOCK`]
/// * `entity_id` - The entity's UUID
/// * `payload` - JSON serialization of the change
pub async fn enqueue(
    conn: &mut SqliteConnection,
    vendor_id: &str,
    entity_type: &str,
    entity_id: &str,
    payload: &str,
) -> DbResult<SyncOutboxEntry> {
    debug!(
        vendor_id = %vendor_id,
        entity_type = %entity_type,
        entity_id = %entity_id,
        "Queuing for sync"
    );

    let entry = SyncOutboxEntry {
        id: Uuid::new_v4().to_string(),
        vendor_id: vendor_id.to_string(),
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        payload: payload.to_string(),
        attempts: 0,
        last_error: None,
        created_at: Utc::now(),
        attempted_at: None,
        synced_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO sync_outbox (
            id, vendor_id, entity_type, entity_id, payload,
            attempts, last_error, created_at, attempted_at, synced_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.vendor_id)
    .bind(&entry.entity_type)
    .bind(&entry.entity_id)
    .bind(&entry.payload)
    .bind(entry.attempts)
    .bind(&entry.last_error)
    .bind(entry.created_at)
    .bind(entry.attempted_at)
    .bind(entry.synced_at)
    .execute(conn)
    .await?;

    Ok(entry)
}
