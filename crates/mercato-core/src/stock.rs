//! # Stock Arithmetic
//!
//! Pure state transitions on a [`StockRecord`].
//!
//! ## Quantities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  on_hand  ████████████████████████████████████  10                      │
//! │  reserved ████████████                           4                      │
//! │  available            ████████████████████████   6  = on_hand - reserved│
//! │                                                                         │
//! │  Invariant: 0 <= reserved <= on_hand                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function returns a *new* record (the caller persists it with a
//! compare-and-swap on `version`) or an error; the input is never left
//! half-modified. `version` and `updated_at` are the storage layer's concern.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::StockRecord;
use chrono::Utc;

impl StockRecord {
    /// A record for a pair that has never been stocked.
    pub fn empty(product_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        StockRecord {
            product_id: product_id.into(),
            location_id: location_id.into(),
            on_hand_quantity: 0,
            reserved_quantity: 0,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// What can be newly reserved or transferred out.
    #[inline]
    pub fn available_quantity(&self) -> i64 {
        self.on_hand_quantity - self.reserved_quantity
    }

    /// True when nothing is on hand or reserved.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.on_hand_quantity == 0 && self.reserved_quantity == 0
    }

    /// Checks `0 <= reserved <= on_hand`.
    pub fn check_invariants(&self) -> CoreResult<()> {
        if self.on_hand_quantity < 0 || self.reserved_quantity < 0 {
            return Err(self.inconsistent("negative quantity"));
        }
        if self.reserved_quantity > self.on_hand_quantity {
            return Err(self.inconsistent("reserved exceeds on hand"));
        }
        Ok(())
    }

    /// Applies a signed on-hand adjustment.
    ///
    /// Fails with `InsufficientStock` when the result would go negative or
    /// would leave reserved units without backing stock. `available` in the
    /// error is what could have been removed.
    pub fn adjusted(&self, delta: i64) -> CoreResult<StockRecord> {
        let on_hand = self
            .on_hand_quantity
            .checked_add(delta)
            .ok_or_else(|| overflow("delta"))?;

        if on_hand < self.reserved_quantity {
            return Err(self.insufficient(delta.saturating_neg()));
        }

        Ok(StockRecord {
            on_hand_quantity: on_hand,
            ..self.clone()
        })
    }

    /// Earmarks `quantity` units. Check and increment are one step.
    pub fn reserved_for(&self, quantity: i64) -> CoreResult<StockRecord> {
        if quantity > self.available_quantity() {
            return Err(self.insufficient(quantity));
        }

        Ok(StockRecord {
            reserved_quantity: self.reserved_quantity + quantity,
            ..self.clone()
        })
    }

    /// Returns `quantity` reserved units to the available pool.
    pub fn released(&self, quantity: i64) -> CoreResult<StockRecord> {
        if quantity > self.reserved_quantity {
            return Err(self.inconsistent("release exceeds reserved quantity"));
        }

        Ok(StockRecord {
            reserved_quantity: self.reserved_quantity - quantity,
            ..self.clone()
        })
    }

    /// Ships `quantity` reserved units: both reserved and on-hand drop.
    pub fn fulfilled(&self, quantity: i64) -> CoreResult<StockRecord> {
        if quantity > self.reserved_quantity || quantity > self.on_hand_quantity {
            return Err(self.inconsistent("fulfillment exceeds reserved quantity"));
        }

        Ok(StockRecord {
            on_hand_quantity: self.on_hand_quantity - quantity,
            reserved_quantity: self.reserved_quantity - quantity,
            ..self.clone()
        })
    }

    /// Removes `quantity` units for a transfer. Reserved stock stays put.
    pub fn debited(&self, quantity: i64) -> CoreResult<StockRecord> {
        if quantity > self.available_quantity() {
            return Err(self.insufficient(quantity));
        }

        Ok(StockRecord {
            on_hand_quantity: self.on_hand_quantity - quantity,
            ..self.clone()
        })
    }

    /// Adds `quantity` units arriving from a transfer.
    pub fn credited(&self, quantity: i64) -> CoreResult<StockRecord> {
        let on_hand = self
            .on_hand_quantity
            .checked_add(quantity)
            .ok_or_else(|| overflow("quantity"))?;

        Ok(StockRecord {
            on_hand_quantity: on_hand,
            ..self.clone()
        })
    }

    fn insufficient(&self, requested: i64) -> CoreError {
        CoreError::InsufficientStock {
            product_id: self.product_id.clone(),
            location_id: self.location_id.clone(),
            available: self.available_quantity(),
            requested,
        }
    }

    fn inconsistent(&self, reason: &str) -> CoreError {
        CoreError::LedgerInconsistent {
            product_id: self.product_id.clone(),
            location_id: self.location_id.clone(),
            reason: reason.to_string(),
        }
    }
}

fn overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: i64::MIN,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
