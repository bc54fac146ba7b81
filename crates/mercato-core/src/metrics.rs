//! # Inventory Metrics
//!
//! Dashboard summary of stock health. Pure: no I/O, no side effects.
//!
//! ## Classification
//! ```text
//!   quantity:   ≤ 0        1 ..= low        low+1 .. over-1       ≥ over
//!             ┌─────────┬──────────────┬──────────────────┬───────────────┐
//!             │ out of  │  low stock   │     adequate     │   overstock   │
//!             │ stock   │              │                  │               │
//!             └─────────┴──────────────┴──────────────────┴───────────────┘
//! ```
//! With the defaults (`low = 5`, `over = 100`).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;
use crate::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_OVERSTOCK_THRESHOLD};

/// Boundaries used to classify stock levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockThresholds {
    /// Positive quantities at or below this are low stock.
    pub low: i64,
    /// Quantities at or above this are overstock.
    pub overstock: i64,
}

impl Default for StockThresholds {
    fn default() -> Self {
        StockThresholds {
            low: DEFAULT_LOW_STOCK_THRESHOLD,
            overstock: DEFAULT_OVERSTOCK_THRESHOLD,
        }
    }
}

impl StockThresholds {
    pub fn new(low: i64, overstock: i64) -> ValidationResult<Self> {
        let thresholds = StockThresholds { low, overstock };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// `0 <= low < overstock`.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.low < 0 {
            return Err(ValidationError::OutOfRange {
                field: "low".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        if self.overstock <= self.low {
            return Err(ValidationError::OutOfRange {
                field: "overstock".to_string(),
                min: self.low.saturating_add(1),
                max: i64::MAX,
            });
        }
        Ok(())
    }

    pub fn classify(&self, quantity: i64) -> StockStatus {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= self.low {
            StockStatus::LowStock
        } else if quantity >= self.overstock {
            StockStatus::Overstock
        } else {
            StockStatus::Adequate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Overstock,
    Adequate,
}

/// One product's current stock, summed across locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductStockLevel {
    pub product_id: String,
    pub quantity: i64,
    pub price_cents: i64,
}

/// Aggregated counts for the dashboard summary cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryMetrics {
    pub total_products: usize,
    pub total_units: i64,
    pub total_value_cents: i64,
    pub out_of_stock_count: usize,
    pub low_stock_count: usize,
    pub overstock_count: usize,
    pub adequate_stock_count: usize,
}

/// Classifies every product and aggregates the counts.
///
/// Negative quantities count as out of stock and contribute nothing to
/// units or value.
pub fn calculate_inventory_metrics(
    products: &[ProductStockLevel],
    thresholds: StockThresholds,
) -> InventoryMetrics {
    products
        .iter()
        .fold(InventoryMetrics::default(), |mut metrics, product| {
            metrics.total_products += 1;

            let units = product.quantity.max(0);
            metrics.total_units = metrics.total_units.saturating_add(units);
            metrics.total_value_cents = metrics
                .total_value_cents
                .saturating_add(units.saturating_mul(product.price_cents));

            match thresholds.classify(product.quantity) {
                StockStatus::OutOfStock => metrics.out_of_stock_count += 1,
                StockStatus::LowStock => metrics.low_stock_count += 1,
                StockStatus::Overstock => metrics.overstock_count += 1,
                StockStatus::Adequate => metrics.adequate_stock_count += 1,
            }

            metrics
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
