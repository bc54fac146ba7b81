//! # Sync Settings Repository
//!
//! Per-vendor `real_time_sync_enabled` toggle. Vendors that never set it
//! read back as disabled.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use mercato_core::SyncConfig;

#[derive(Debug, Clone)]
pub struct SyncSettingsRepository {
    pool: SqlitePool,
}

impl SyncSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SyncSettingsRepository { pool }
    }

    /// Returns the vendor's setting, or the disabled default.
    pub async fn get(&self, vendor_id: &str) -> DbResult<SyncConfig> {
        let config = sqlx::query_as::<_, SyncConfig>(
            "SELECT vendor_id, real_time_sync_enabled FROM vendor_sync_settings WHERE vendor_id = ?1",
        )
        .bind(vendor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config.unwrap_or_else(|| SyncConfig::disabled(vendor_id)))
    }

    /// Upserts the toggle.
    pub async fn set(&self, vendor_id: &str, enabled: bool) -> DbResult<SyncConfig> {
        debug!(vendor_id = %vendor_id, enabled, "Setting real-time sync");

        sqlx::query(
            r#"
            INSERT INTO vendor_sync_settings (vendor_id, real_time_sync_enabled, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (vendor_id) DO UPDATE SET
                real_time_sync_enabled = excluded.real_time_sync_enabled,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(vendor_id)
        .bind(enabled)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(SyncConfig {
            vendor_id: vendor_id.to_string(),
            real_time_sync_enabled: enabled,
        })
    }
}
