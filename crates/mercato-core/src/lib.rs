//! # mercato-core: Pure Inventory Logic for the Mercato Marketplace
//!
//! This crate holds the inventory rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mercato Inventory Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Vendor dashboard / API routes                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP (inventory-api)                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        mercato-db: InventoryService + repositories              │   │
//! │  │        key locks, CAS retries, SQLite transactions              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ mercato-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   stock   │  │  metrics  │  │ validation│  │   │
//! │  │   │ Location  │  │ reserve   │  │ classify  │  │  names    │  │   │
//! │  │   │Reservation│  │ fulfil    │  │ aggregate │  │  deltas   │  │   │
//! │  │   │ Movement  │  │ transfer  │  │           │  │  pairs    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (locations, stock records, reservations, movements)
//! - [`stock`] - Stock arithmetic that enforces `0 <= reserved <= on_hand`
//! - [`metrics`] - Dashboard stock-health classification
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use mercato_core::StockRecord;
//!
//! let stock = StockRecord::empty("product-1", "warehouse-a").credited(10).unwrap();
//! let held = stock.reserved_for(4).unwrap();
//! assert_eq!(held.available_quantity(), 6);
//!
//! let shipped = held.fulfilled(4).unwrap();
//! assert_eq!(shipped.on_hand_quantity, 6);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod metrics;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use metrics::{calculate_inventory_metrics, InventoryMetrics, ProductStockLevel, StockStatus, StockThresholds};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Positive stock at or below this is "low stock" on the dashboard.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Stock at or above this is "overstock" on the dashboard.
pub const DEFAULT_OVERSTOCK_THRESHOLD: i64 = 100;

/// Largest quantity accepted in a single command.
///
/// Guards against fat-finger input (1000000 instead of 100) and keeps
/// arithmetic far from overflow.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000;

/// Maximum length of a location name.
pub const MAX_LOCATION_NAME_LEN: usize = 100;

/// Maximum length of a movement note.
pub const MAX_NOTE_LEN: usize = 500;

/// Longest vendor SKU accepted.
pub const MAX_SKU_LEN: usize = 64;
