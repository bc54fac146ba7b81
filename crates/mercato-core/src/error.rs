//! # Error Types
//!
//! Domain-specific error types for mercato-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mercato-core errors (this file)                                       │
//! │  ├── CoreError        - Inventory business failures                    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mercato-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── InventoryError   - CoreError | DbError, returned by the service   │
//! │                                                                         │
//! │  HTTP errors (in app)                                                  │
//! │  └── ApiError         - What the dashboard sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → InventoryError → ApiError         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business failures are always returned as values. Nothing in the inventory
//! path panics on an expected condition like a short shelf.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Inventory business errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Malformed input (missing quantity, equal from/to location, ...).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown product, location, vendor or reservation.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Requested quantity exceeds what the location can give.
    ///
    /// ## User Workflow
    /// ```text
    /// Reserve (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: on_hand=8, reserved=5 → available=3
    ///      │
    ///      ▼
    /// InsufficientStock { available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Dashboard shows: "Only 3 available at Warehouse A"
    /// ```
    #[error(
        "Insufficient stock for product {product_id} at location {location_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: String,
        location_id: String,
        available: i64,
        requested: i64,
    },

    /// Reservation is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Releasing a reservation that was already fulfilled
    /// - Fulfilling a reservation twice
    #[error("Reservation {reservation_id} is {current_status}, cannot perform operation")]
    InvalidState {
        reservation_id: String,
        current_status: String,
    },

    /// Operation would orphan stock or reservations.
    ///
    /// ## When This Occurs
    /// - Deleting a location that still holds stock
    /// - Deleting a location with pending reservations
    #[error("{entity} {id} cannot be modified: {reason}")]
    Conflict {
        entity: String,
        id: String,
        reason: String,
    },

    /// Optimistic-lock contention exceeded the retry budget.
    #[error("{entity} {id} was modified concurrently; gave up after {attempts} attempts")]
    ConcurrentModification {
        entity: String,
        id: String,
        attempts: u32,
    },

    /// Stored ledger state contradicts an invariant (reserved > on hand,
    /// reservation larger than the reserved pool). Never caused by input.
    #[error("Ledger inconsistent for product {product_id} at location {location_id}: {reason}")]
    LedgerInconsistent {
        product_id: String,
        location_id: String,
        reason: String,
    },
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(
        entity: impl Into<String>,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::Conflict {
            entity: entity.into(),
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the same request unchanged.
    ///
    /// Only contention is transient; every other kind fails identically on
    /// a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::ConcurrentModification { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any stock is read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be zero.
    #[error("{field} must not be zero")]
    MustBeNonZero { field: String },

    /// Two fields must differ (e.g. transfer source and destination).
    #[error("{field} must differ from {other}")]
    MustDiffer { field: String, other: String },

    /// Malformed value, e.g. a SKU with spaces.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Referenced entity exists but is deactivated.
    #[error("{entity} {id} is inactive")]
    Inactive { entity: String, id: String },

    /// Referenced entity does not exist (used where the caller supplied a
    /// parent id, e.g. the vendor of a new location).
    #[error("{entity} {id} does not exist")]
    UnknownReference { entity: String, id: String },

    /// Entities belong to different vendors.
    #[error("{entity} {id} does not belong to vendor {vendor_id}")]
    VendorMismatch {
        entity: String,
        id: String,
        vendor_id: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
