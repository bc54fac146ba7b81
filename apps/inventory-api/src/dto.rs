//! # Data Transfer Objects
//!
//! camelCase request and response bodies for the dashboard.
//!
//! Domain types from mercato-core stay snake_case; the DTOs here are the
//! only shapes that cross the HTTP boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercato_core::{
    InventoryLocation, InventoryMovement, MovementReason, Reservation, ReservationStatus,
    StockRecord, SyncConfig, VendorStockTotals,
};
use mercato_db::{LedgerUpdate, LocationUpdate, TransferOutcome};

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    pub id: String,
    pub vendor_id: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InventoryLocation> for LocationDto {
    fn from(l: InventoryLocation) -> Self {
        LocationDto {
            id: l.id,
            vendor_id: l.vendor_id,
            name: l.name,
            is_active: l.is_active,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

/// Stock for one (product, location) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecordDto {
    pub product_id: String,
    pub location_id: String,
    pub on_hand_quantity: i64,
    pub reserved_quantity: i64,
    /// on hand minus reserved
    pub available_quantity: i64,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<StockRecord> for StockRecordDto {
    fn from(s: StockRecord) -> Self {
        StockRecordDto {
            available_quantity: s.available_quantity(),
            product_id: s.product_id,
            location_id: s.location_id,
            on_hand_quantity: s.on_hand_quantity,
            reserved_quantity: s.reserved_quantity,
            version: s.version,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub id: String,
    pub product_id: String,
    pub location_id: String,
    pub quantity: i64,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        ReservationDto {
            id: r.id,
            product_id: r.product_id,
            location_id: r.location_id,
            quantity: r.quantity,
            status: r.status,
            created_at: r.created_at,
            resolved_at: r.resolved_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementDto {
    pub id: String,
    pub product_id: String,
    pub location_id: String,
    pub quantity_change: i64,
    pub reason: MovementReason,
    pub reference_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<InventoryMovement> for MovementDto {
    fn from(m: InventoryMovement) -> Self {
        MovementDto {
            id: m.id,
            product_id: m.product_id,
            location_id: m.location_id,
            quantity_change: m.quantity_change,
            reason: m.reason,
            reference_id: m.reference_id,
            note: m.note,
            created_at: m.created_at,
        }
    }
}

/// Result of a manual adjustment: the new stock and its audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentDto {
    pub stock: StockRecordDto,
    pub movement: MovementDto,
}

impl From<LedgerUpdate> for AdjustmentDto {
    fn from(u: LedgerUpdate) -> Self {
        AdjustmentDto {
            stock: u.stock.into(),
            movement: u.movement.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDto {
    pub transfer_id: String,
    pub source: StockRecordDto,
    pub destination: StockRecordDto,
    pub movements: Vec<MovementDto>,
}

impl From<TransferOutcome> for TransferDto {
    fn from(t: TransferOutcome) -> Self {
        TransferDto {
            transfer_id: t.transfer_id,
            source: t.source.into(),
            destination: t.destination.into(),
            movements: t.movements.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorTotalsDto {
    pub vendor_id: String,
    pub on_hand_quantity: i64,
    pub reserved_quantity: i64,
    pub available_quantity: i64,
    pub location_count: i64,
    pub product_count: i64,
}

impl From<VendorStockTotals> for VendorTotalsDto {
    fn from(t: VendorStockTotals) -> Self {
        VendorTotalsDto {
            vendor_id: t.vendor_id,
            on_hand_quantity: t.on_hand_quantity,
            reserved_quantity: t.reserved_quantity,
            available_quantity: t.available_quantity,
            location_count: t.location_count,
            product_count: t.product_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfigDto {
    pub vendor_id: String,
    pub real_time_sync_enabled: bool,
}

impl From<SyncConfig> for SyncConfigDto {
    fn from(c: SyncConfig) -> Self {
        SyncConfigDto {
            vendor_id: c.vendor_id,
            real_time_sync_enabled: c.real_time_sync_enabled,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl From<UpdateLocationRequest> for LocationUpdate {
    fn from(r: UpdateLocationRequest) -> Self {
        LocationUpdate {
            name: r.name,
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    pub delta: i64,
    pub reason: MovementReason,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    pub product_id: String,
    pub location_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub product_id: String,
    pub from_location_id: String,
    pub to_location_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSyncRequest {
    pub real_time_sync_enabled: bool,
}

// =============================================================================
// Query Strings
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLocationsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementsQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsQuery {
    pub low: Option<i64>,
    pub over: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationsQuery {
    pub location_id: Option<String>,
    pub status: Option<ReservationStatus>,
}
