//! # Repository Module
//!
//! Database repository implementations for the inventory store.
//!
//! ## Two Access Styles
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Read path (dashboard, HTTP GETs)                                      │
//! │       │                                                                 │
//! │       │  db.locations().list_by_vendor(&vendor_id, false)              │
//! │       ▼                                                                 │
//! │  XxxRepository { pool }  ← acquires its own pooled connection          │
//! │                                                                         │
//! │  Write path (InventoryService inside one transaction)                  │
//! │       │                                                                 │
//! │       │  stock::compare_and_swap(&mut *tx, &next, expected_version)    │
//! │       ▼                                                                 │
//! │  module-level fns taking &mut SqliteConnection                         │
//! │  ← never touch the pool, so a transaction never waits on itself        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`vendor::VendorRepository`] - Vendors
//! - [`product::ProductRepository`] - Products
//! - [`location::LocationRepository`] - Inventory locations
//! - [`stock::StockRepository`] - Stock records and aggregates
//! - [`reservation::ReservationRepository`] - Reservations
//! - [`movement::MovementRepository`] - Append-only movement log
//! - [`sync_settings::SyncSettingsRepository`] - Per-vendor sync toggle
//! - [`sync::SyncOutboxRepository`] - Sync queue management

pub mod location;
pub mod movement;
pub mod product;
pub mod reservation;
pub mod stock;
pub mod sync;
pub mod sync_settings;
pub mod vendor;
