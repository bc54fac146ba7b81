//! Stock ledger, movement log and dashboard endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;

use mercato_core::{InventoryMetrics, StockThresholds};

use crate::dto::{
    AdjustmentDto, AdjustmentRequest, MetricsQuery, MovementDto, MovementsQuery, StockRecordDto,
    VendorTotalsDto,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// Page size when `?limit=` is omitted.
pub const DEFAULT_MOVEMENT_LIMIT: u32 = 50;

/// GET /products/{product_id}/inventory
pub async fn across_locations(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Vec<StockRecordDto>>> {
    let records = state.service.get_across_locations(&product_id).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// GET /products/{product_id}/locations/{location_id}/inventory
pub async fn get_inventory(
    State(state): State<AppState>,
    Path((product_id, location_id)): Path<(String, String)>,
) -> ApiResult<Json<StockRecordDto>> {
    let record = state.service.get_inventory(&product_id, &location_id).await?;
    Ok(Json(record.into()))
}

/// POST /products/{product_id}/locations/{location_id}/adjustments
pub async fn adjust_inventory(
    State(state): State<AppState>,
    Path((product_id, location_id)): Path<(String, String)>,
    payload: Result<Json<AdjustmentRequest>, JsonRejection>,
) -> ApiResult<Json<AdjustmentDto>> {
    let Json(req) = payload?;
    let sync = state.service.get_sync_config_for_product(&product_id).await?;
    let update = state
        .service
        .update_location_inventory(
            &sync,
            &product_id,
            &location_id,
            req.delta,
            req.reason,
            req.note.as_deref(),
        )
        .await?;
    Ok(Json(update.into()))
}

/// GET /products/{product_id}/movements
pub async fn list_movements(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    query: Result<Query<MovementsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<MovementDto>>> {
    let Query(query) = query?;
    let movements = state
        .service
        .list_product_inventory_movements(&product_id, query.limit.unwrap_or(DEFAULT_MOVEMENT_LIMIT))
        .await?;
    Ok(Json(movements.into_iter().map(Into::into).collect()))
}

/// GET /vendors/{vendor_id}/inventory/totals
pub async fn vendor_totals(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
) -> ApiResult<Json<VendorTotalsDto>> {
    let totals = state.service.get_total_for_vendor(&vendor_id).await?;
    Ok(Json(totals.into()))
}

/// GET /vendors/{vendor_id}/inventory/metrics
pub async fn vendor_metrics(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
    query: Result<Query<MetricsQuery>, QueryRejection>,
) -> ApiResult<Json<InventoryMetrics>> {
    let Query(query) = query?;
    let thresholds = StockThresholds {
        low: query.low.unwrap_or(state.thresholds.low),
        overstock: query.over.unwrap_or(state.thresholds.overstock),
    };
    let metrics = state
        .service
        .get_vendor_inventory_metrics(&vendor_id, thresholds)
        .await?;
    Ok(Json(metrics))
}
