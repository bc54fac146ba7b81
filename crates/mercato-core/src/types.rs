//! # Domain Types
//!
//! Core domain types used throughout the inventory engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Vendor      │──►│    Product      │   │InventoryLocation│◄──┐   │
//! │  │  id, name       │   │  vendor_id (FK) │   │  vendor_id (FK) │   │   │
//! │  └─────────────────┘   └────────┬────────┘   └────────┬────────┘   │   │
//! │                                 │   (product, location)│            │   │
//! │                                 └──────────┬───────────┘            │   │
//! │                                            ▼                        │   │
//! │                                 ┌─────────────────────┐             │   │
//! │                                 │    StockRecord      │             │   │
//! │                                 │  on_hand, reserved  │             │   │
//! │                                 │  version (CAS)      │             │   │
//! │                                 └──────────┬──────────┘             │   │
//! │                     ┌──────────────────────┼─────────────────┐      │   │
//! │                     ▼                      ▼                 │      │   │
//! │          ┌─────────────────────┐ ┌─────────────────────┐     │      │   │
//! │          │    Reservation      │ │ InventoryMovement   │     │      │   │
//! │          │ Reserved → Fulfilled│ │ append-only, signed │     │      │   │
//! │          │ Reserved → Released │ │ quantity_change     │     │      │   │
//! │          └─────────────────────┘ └─────────────────────┘     │      │   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All identifiers are UUID v4 strings, matching the storage format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::{validate_price_cents, validate_sku, ValidationResult};

// =============================================================================
// Vendor & Product
// =============================================================================

/// A marketplace vendor owning products and stock locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Vendor {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product listed by a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub vendor_id: String,
    /// Stock Keeping Unit - unique per vendor.
    pub sku: String,
    pub name: String,
    /// Unit price in cents (smallest currency unit).
    pub price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Vendor {
    pub fn new(name: impl Into<String>) -> Self {
        Vendor {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

impl Product {
    /// Creates a new active product with a fresh ID.
    pub fn new(
        vendor_id: impl Into<String>,
        sku: impl Into<String>,
        name: impl Into<String>,
        price_cents: i64,
    ) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            vendor_id: vendor_id.into(),
            sku: sku.into(),
            name: name.into(),
            price_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Catalog rules checked before a product is written.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_sku(&self.sku)?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            });
        }
        validate_price_cents(self.price_cents)
    }
}

// =============================================================================
// Inventory Location
// =============================================================================

/// A physical or logical place where a vendor keeps stock.
///
/// Locations are soft-deleted: `is_active = false` keeps the movement log
/// referentially intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryLocation {
    pub id: String,
    pub vendor_id: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryLocation {
    /// Creates a new active location with a fresh ID.
    pub fn new(vendor_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        InventoryLocation {
            id: Uuid::new_v4().to_string(),
            vendor_id: vendor_id.into(),
            name: name.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Stock Record
// =============================================================================

/// Stock held for one product at one location.
///
/// Unique per `(product_id, location_id)`. Arithmetic lives in
/// [`crate::stock`]; this is the stored shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockRecord {
    pub product_id: String,
    pub location_id: String,
    /// Physical units at the location, reserved ones included.
    pub on_hand_quantity: i64,
    /// Units earmarked for in-progress orders.
    pub reserved_quantity: i64,
    /// Optimistic-concurrency token, bumped by every write.
    pub version: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Reservation
// =============================================================================

/// Lifecycle of a reservation.
///
/// ```text
///              ┌──────────► Fulfilled   (stock leaves the location)
///   Reserved ──┤
///              └──────────► Released    (stock returns to available)
/// ```
///
/// Both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Reserved,
    Fulfilled,
    Released,
}

impl ReservationStatus {
    /// The only legal edges are out of `Reserved` into a terminal state.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (ReservationStatus::Reserved, ReservationStatus::Fulfilled)
                | (ReservationStatus::Reserved, ReservationStatus::Released)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Fulfilled => "fulfilled",
            ReservationStatus::Released => "released",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reserved" => Ok(ReservationStatus::Reserved),
            "fulfilled" => Ok(ReservationStatus::Fulfilled),
            "released" => Ok(ReservationStatus::Released),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "reserved".to_string(),
                    "fulfilled".to_string(),
                    "released".to_string(),
                ],
            }
            .into()),
        }
    }
}

/// Stock earmarked for an order at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Reservation {
    pub id: String,
    pub product_id: String,
    pub location_id: String,
    /// Fixed at creation.
    pub quantity: i64,
    pub status: ReservationStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// When the reservation reached its terminal state.
    #[ts(as = "Option<String>")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Creates a new reservation in `Reserved` state.
    pub fn new(
        product_id: impl Into<String>,
        location_id: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Reservation {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            location_id: location_id.into(),
            quantity,
            status: ReservationStatus::Reserved,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Returns the reservation moved into `next`.
    ///
    /// Fails with `InvalidState` unless the edge is legal, which guarantees
    /// exactly one terminal transition per reservation.
    pub fn transition(&self, next: ReservationStatus, at: DateTime<Utc>) -> CoreResult<Reservation> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidState {
                reservation_id: self.id.clone(),
                current_status: self.status.to_string(),
            });
        }

        Ok(Reservation {
            status: next,
            resolved_at: Some(at),
            ..self.clone()
        })
    }
}

// =============================================================================
// Movement Log
// =============================================================================

/// Why a stock movement happened.
///
/// The last four variants are produced only by the engine itself; direct
/// ledger adjustments must use one of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    ManualAdjustment,
    Restock,
    Sale,
    Return,
    Damage,
    Correction,
    ReservationReleased,
    ReservationFulfilled,
    TransferOut,
    TransferIn,
}

impl MovementReason {
    /// Reasons callers may pass to a direct ledger adjustment.
    pub const ADJUSTMENT_REASONS: [MovementReason; 6] = [
        MovementReason::ManualAdjustment,
        MovementReason::Restock,
        MovementReason::Sale,
        MovementReason::Return,
        MovementReason::Damage,
        MovementReason::Correction,
    ];

    /// True for reasons reserved to reservation and transfer bookkeeping.
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            MovementReason::ReservationReleased
                | MovementReason::ReservationFulfilled
                | MovementReason::TransferOut
                | MovementReason::TransferIn
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementReason::ManualAdjustment => "manual_adjustment",
            MovementReason::Restock => "restock",
            MovementReason::Sale => "sale",
            MovementReason::Return => "return",
            MovementReason::Damage => "damage",
            MovementReason::Correction => "correction",
            MovementReason::ReservationReleased => "reservation_released",
            MovementReason::ReservationFulfilled => "reservation_fulfilled",
            MovementReason::TransferOut => "transfer_out",
            MovementReason::TransferIn => "transfer_in",
        }
    }
}

impl std::fmt::Display for MovementReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record of a signed stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryMovement {
    pub id: String,
    pub product_id: String,
    pub location_id: String,
    /// Signed: negative when stock leaves the location.
    pub quantity_change: i64,
    pub reason: MovementReason,
    /// Transfer or reservation this movement belongs to.
    pub reference_id: Option<String>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InventoryMovement {
    pub fn new(
        product_id: impl Into<String>,
        location_id: impl Into<String>,
        quantity_change: i64,
        reason: MovementReason,
    ) -> Self {
        InventoryMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            location_id: location_id.into(),
            quantity_change,
            reason,
            reference_id: None,
            note: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}

// =============================================================================
// Sync Configuration
// =============================================================================

/// Per-vendor toggle for live propagation of stock changes.
///
/// Passed explicitly into every stock-mutating call; when
/// `real_time_sync_enabled` is set the mutation also queues a `STOCK`
/// outbox entry in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SyncConfig {
    pub vendor_id: String,
    pub real_time_sync_enabled: bool,
}

impl SyncConfig {
    /// Sync switched off. The default for vendors that never toggled it.
    pub fn disabled(vendor_id: impl Into<String>) -> Self {
        SyncConfig {
            vendor_id: vendor_id.into(),
            real_time_sync_enabled: false,
        }
    }

    pub fn enabled(vendor_id: impl Into<String>) -> Self {
        SyncConfig {
            vendor_id: vendor_id.into(),
            real_time_sync_enabled: true,
        }
    }
}

// =============================================================================
// Sync Outbox
// =============================================================================

/// An entry in the sync outbox queue.
/// Uses the outbox pattern so notifications commit with the stock change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SyncOutboxEntry {
    pub id: String,
    pub vendor_id: String,
    /// Type of entity being synced: "STOCK", "RESERVATION", ...
    pub entity_type: String,
    pub entity_id: String,
    /// The full entity data as JSON.
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub synced_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Aggregates
// =============================================================================

/// Stock totals across all of a vendor's active locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VendorStockTotals {
    pub vendor_id: String,
    pub on_hand_quantity: i64,
    pub reserved_quantity: i64,
    pub available_quantity: i64,
    pub location_count: i64,
    pub product_count: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_validation() {
        assert!(Product::new("v1", "NRD-MUG-001", "Stoneware Mug", 1800).validate().is_ok());
        assert!(Product::new("v1", "FREE_SAMPLE", "Sticker", 0).validate().is_ok());
        assert!(matches!(
            Product::new("v1", "MUG 001", "Mug", 1800).validate(),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Product::new("v1", "MUG-001", "  ", 1800).validate(),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            Product::new("v1", "MUG-001", "Mug", -1).validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_reservation_transitions() {
        use ReservationStatus::*;

        assert!(Reserved.can_transition_to(Fulfilled));
        assert!(Reserved.can_transition_to(Released));
        assert!(!Reserved.can_transition_to(Reserved));
        assert!(!Fulfilled.can_transition_to(Released));
        assert!(!Released.can_transition_to(Fulfilled));
        assert!(!Fulfilled.can_transition_to(Fulfilled));
    }

    #[test]
    fn test_transition_is_single_shot() {
        let reservation = Reservation::new("p1", "l1", 4);
        let fulfilled = reservation
            .transition(ReservationStatus::Fulfilled, Utc::now())
            .unwrap();
        assert_eq!(fulfilled.status, ReservationStatus::Fulfilled);
        assert!(fulfilled.resolved_at.is_some());
        assert_eq!(fulfilled.quantity, 4);

        let err = fulfilled
            .transition(ReservationStatus::Released, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { current_status, .. } if current_status == "fulfilled"));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Reserved".parse::<ReservationStatus>().unwrap(), ReservationStatus::Reserved);
        assert_eq!("released".parse::<ReservationStatus>().unwrap(), ReservationStatus::Released);
        assert!("pending".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn test_system_reasons() {
        assert!(MovementReason::TransferIn.is_system());
        assert!(MovementReason::ReservationReleased.is_system());
        assert!(MovementReason::ADJUSTMENT_REASONS.iter().all(|r| !r.is_system()));
    }

    #[test]
    fn test_reason_serializes_snake_case() {
        let json = serde_json::to_string(&MovementReason::ReservationReleased).unwrap();
        assert_eq!(json, "\"reservation_released\"");
    }
}
