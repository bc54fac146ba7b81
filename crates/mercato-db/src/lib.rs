//! # mercato-db: Persistence & Inventory Engine
//!
//! SQLite storage for the marketplace inventory core, and the
//! [`InventoryService`] that performs every stock-changing operation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Mercato Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /reservations)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   mercato-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────────┐   ┌───────────────┐  ┌─────────────┐  │   │
//! │  │   │  InventoryService  │   │ Repositories  │  │ Migrations  │  │   │
//! │  │   │  (inventory/)      │──►│ (repository/) │  │ (embedded)  │  │   │
//! │  │   │                    │   │               │  │             │  │   │
//! │  │   │ StockLocks         │   │ StockRepo     │  │ 001_initial │  │   │
//! │  │   │ RetryPolicy        │   │ MovementRepo  │  │  _schema    │  │   │
//! │  │   │ transactions       │   │ ...           │  │             │  │   │
//! │  │   └────────────────────┘   └───────┬───────┘  └─────────────┘  │   │
//! │  │                                    │                            │   │
//! │  │                          Database (pool.rs)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (stock, movement, etc.)
//! - [`inventory`] - Atomic, concurrency-safe inventory operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mercato_db::{Database, DbConfig, InventoryService};
//!
//! let db = Database::new(DbConfig::new("path/to/mercato.db")).await?;
//! let service = InventoryService::new(db);
//!
//! let sync = service.get_sync_config(&vendor_id).await?;
//! let outcome = service
//!     .transfer_inventory(&sync, &product_id, &warehouse_id, &store_id, 4)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use inventory::{
    InventoryError, InventoryResult, InventoryService, LedgerUpdate, LocationUpdate,
    RetryPolicy, TransferOutcome, MAX_MOVEMENT_PAGE,
};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::location::LocationRepository;
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
pub use repository::reservation::ReservationRepository;
pub use repository::stock::StockRepository;
pub use repository::sync::SyncOutboxRepository;
pub use repository::sync_settings::SyncSettingsRepository;
pub use repository::vendor::VendorRepository;
