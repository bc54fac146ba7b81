//! # Validation Module
//!
//! Input validation for inventory commands.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (Rust)                                          │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  └── names, quantities, deltas, location pairs, reasons               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (on_hand >= 0, reserved <= on_hand)                        │
//! │  ├── UNIQUE (product_id, location_id)                                 │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::MovementReason;
use crate::{MAX_LOCATION_NAME_LEN, MAX_NOTE_LEN, MAX_SKU_LEN, MAX_STOCK_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a location name.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 100 characters
///
/// ## Returns
/// The trimmed name.
///
/// ## Example
/// ```rust
/// use mercato_core::validation::validate_location_name;
///
/// assert_eq!(validate_location_name("  Main Warehouse ").unwrap(), "Main Warehouse");
/// assert!(validate_location_name("   ").is_err());
/// ```
pub fn validate_location_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_LOCATION_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_LOCATION_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Vendor SKUs are ASCII letters, digits, `-` and `_`, unique per vendor.
/// Whitespace is not trimmed: `" MUG"` and `"MUG"` would collide in listings.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if let Some(bad) = sku.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))) {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: format!("unexpected character {bad:?}"),
        });
    }

    Ok(())
}

/// Validates an optional free-text movement note; blank notes become `None`.
pub fn validate_note(note: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if note.chars().count() > MAX_NOTE_LEN {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LEN,
        });
    }

    Ok(Some(note.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a reservation or transfer quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_STOCK_QUANTITY
///
/// ```rust
/// use mercato_core::validation::validate_quantity;
///
/// assert!(validate_quantity(4).is_ok());
/// assert!(validate_quantity(0).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_STOCK_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_STOCK_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a signed ledger adjustment.
///
/// ## Rules
/// - Must not be zero (a no-op would still write a movement)
/// - Magnitude must not exceed MAX_STOCK_QUANTITY
pub fn validate_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::MustBeNonZero {
            field: "delta".to_string(),
        });
    }

    if delta.unsigned_abs() > MAX_STOCK_QUANTITY as u64 {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_STOCK_QUANTITY,
            max: MAX_STOCK_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the reason on a direct ledger adjustment.
///
/// Reservation and transfer reasons are written only by those operations so
/// the log stays reconstructible.
pub fn validate_adjustment_reason(reason: MovementReason) -> ValidationResult<()> {
    if reason.is_system() {
        return Err(ValidationError::NotAllowed {
            field: "reason".to_string(),
            allowed: MovementReason::ADJUSTMENT_REASONS
                .iter()
                .map(|r| r.as_str().to_string())
                .collect(),
        });
    }

    Ok(())
}

/// Prices are stored in minor units; free items (0) are allowed.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents >= 0 {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field: "price_cents".to_string(),
        min: 0,
        max: i64::MAX,
    })
}

// =============================================================================
// Transfer Validators
// =============================================================================

/// Validates the shape of a transfer request.
///
/// ```text
/// from == to        → MustDiffer
/// quantity <= 0     → MustBePositive
/// ```
pub fn validate_transfer(from_location_id: &str, to_location_id: &str, quantity: i64) -> ValidationResult<()> {
    if from_location_id == to_location_id {
        return Err(ValidationError::MustDiffer {
            field: "to_location_id".to_string(),
            other: "from_location_id".to_string(),
        });
    }

    validate_quantity(quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================
