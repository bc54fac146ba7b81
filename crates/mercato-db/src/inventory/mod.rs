//! # Inventory Service
//!
//! Coordinates every stock-changing operation: location registry, stock
//! ledger, reservations, transfers, the movement log and metrics.
//!
//! ## Anatomy of a Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve_inventory(sync, product, location, qty)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate input (mercato-core)            ── Validation                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StockLocks::lock(product, location)      ── in-process exclusion       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────── run_with_retry ─────────────────────────────────────┐   │
//! │  │  BEGIN                                                          │   │
//! │  │    load product / location            ── NotFound, Validation   │   │
//! │  │    read stock (version = v)                                     │   │
//! │  │    next = stock.reserved_for(qty)?    ── InsufficientStock      │   │
//! │  │    UPDATE … WHERE version = v         ── 0 rows → retry         │   │
//! │  │    INSERT reservation / movement                                │   │
//! │  │    INSERT sync_outbox (if enabled)                              │   │
//! │  │  COMMIT                               ── BUSY → retry           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ok(value) or ConcurrentModification once retries run out              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The key lock serialises writers inside this process; the version check
//! catches writers in other processes sharing the database file.

mod error;
mod ledger;
mod locations;
mod locks;
mod movements;
mod reservations;
mod retry;
mod settings;
mod transfers;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::error;

use crate::pool::Database;
use crate::repository::{location, product, stock, sync};
use mercato_core::{
    CoreError, InventoryLocation, InventoryMovement, Product, StockRecord, SyncConfig,
    ValidationError,
};

pub use error::{InventoryError, InventoryResult};
pub use locations::LocationUpdate;
pub use locks::{StockGuard, StockKey, StockLocks};
pub use movements::MAX_MOVEMENT_PAGE;
pub use retry::RetryPolicy;

/// Result of a direct ledger adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerUpdate {
    pub stock: StockRecord,
    pub movement: InventoryMovement,
}

/// Result of a completed transfer: both stock records after the move and
/// the two movement legs (`transfer_out`, `transfer_in`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub transfer_id: String,
    pub source: StockRecord,
    pub destination: StockRecord,
    pub movements: Vec<InventoryMovement>,
}

/// Entry point for inventory operations.
///
/// Cheap to clone; clones share the lock table.
///
/// ## Usage
/// ```rust,ignore
/// let service = InventoryService::new(db);
/// let sync = service.get_sync_config(&vendor_id).await?;
/// let reservation = service.reserve_inventory(&sync, &product_id, &location_id, 2).await?;
/// service.fulfill_reserved_inventory(&sync, &reservation.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
    locks: Arc<StockLocks>,
    retry: RetryPolicy,
}

impl InventoryService {
    pub fn new(db: Database) -> Self {
        InventoryService::with_retry_policy(db, RetryPolicy::default())
    }

    pub fn with_retry_policy(db: Database, retry: RetryPolicy) -> Self {
        InventoryService {
            db,
            locks: Arc::new(StockLocks::new()),
            retry,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

// =============================================================================
// Shared Helpers (transaction-scoped)
// =============================================================================

/// Identifier used in contention errors and logs.
fn stock_key_id(product_id: &str, location_id: &str) -> String {
    format!("{}@{}", product_id, location_id)
}

async fn require_product(conn: &mut SqliteConnection, id: &str) -> InventoryResult<Product> {
    product::fetch(conn, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", id).into())
}

async fn require_location(
    conn: &mut SqliteConnection,
    id: &str,
) -> InventoryResult<InventoryLocation> {
    location::fetch(conn, id)
        .await?
        .ok_or_else(|| CoreError::not_found("InventoryLocation", id).into())
}

/// Stock can only move at active locations.
async fn require_active_location(
    conn: &mut SqliteConnection,
    id: &str,
) -> InventoryResult<InventoryLocation> {
    let location = require_location(conn, id).await?;
    if !location.is_active {
        return Err(ValidationError::Inactive {
            entity: "InventoryLocation".to_string(),
            id: id.to_string(),
        }
        .into());
    }
    Ok(location)
}

fn ensure_same_vendor(product: &Product, location: &InventoryLocation) -> Result<(), ValidationError> {
    if product.vendor_id != location.vendor_id {
        return Err(ValidationError::VendorMismatch {
            entity: "InventoryLocation".to_string(),
            id: location.id.clone(),
            vendor_id: product.vendor_id.clone(),
        });
    }
    Ok(())
}

/// The injected sync config must describe the vendor that owns the stock.
fn ensure_sync_vendor(sync: &SyncConfig, vendor_id: &str) -> Result<(), ValidationError> {
    if sync.vendor_id != vendor_id {
        return Err(ValidationError::VendorMismatch {
            entity: "SyncConfig".to_string(),
            id: sync.vendor_id.clone(),
            vendor_id: vendor_id.to_string(),
        });
    }
    Ok(())
}

/// The stored record, or a zero record (version 0) for a pair never stocked.
///
/// A stored row that breaks `0 <= reserved <= on_hand` fails the operation
/// with `LedgerInconsistent` instead of being written over.
async fn current_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
) -> InventoryResult<StockRecord> {
    let Some(record) = stock::fetch(conn, product_id, location_id).await? else {
        return Ok(StockRecord::empty(product_id, location_id));
    };
    if let Err(err) = record.check_invariants() {
        error!(product_id, location_id, error = %err, "Stored stock record is inconsistent");
        return Err(err.into());
    }
    Ok(record)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StockChangePayload<'a> {
    vendor_id: &'a str,
    product_id: &'a str,
    operation: &'a str,
    records: &'a [StockRecord],
}

/// Queues one `STOCK` outbox entry for the whole operation when the vendor
/// has real-time sync on. Runs on the operation's transaction.
async fn publish_stock_change(
    conn: &mut SqliteConnection,
    sync: &SyncConfig,
    product: &Product,
    operation: &str,
    records: &[StockRecord],
) -> InventoryResult<()> {
    if !sync.real_time_sync_enabled {
        return Ok(());
    }

    let payload = serde_json::to_string(&StockChangePayload {
        vendor_id: &product.vendor_id,
        product_id: &product.id,
        operation,
        records,
    })
    .map_err(crate::error::DbError::from)?;

    sync::enqueue(conn, &product.vendor_id, sync::ENTITY_STOCK, &product.id, &payload).await?;
    Ok(())
}
