//! Reservation endpoints.
//!
//! ```text
//!   POST /reservations ──► reserved ──┬── POST /{id}/fulfill ──► fulfilled
//!                                     └── POST /{id}/release ──► released
//! ```
//!
//! Release and fulfill look the reservation up first so the owning vendor's
//! sync setting can be read before the stock write.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::dto::{ReservationDto, ReservationsQuery, ReserveRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /reservations
pub async fn reserve(
    State(state): State<AppState>,
    payload: Result<Json<ReserveRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ReservationDto>)> {
    let Json(req) = payload?;
    let sync = state.service.get_sync_config_for_product(&req.product_id).await?;
    let reservation = state
        .service
        .reserve_inventory(&sync, &req.product_id, &req.location_id, req.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// GET /reservations/{id}
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReservationDto>> {
    let reservation = state.service.get_reservation(&id).await?;
    Ok(Json(reservation.into()))
}

/// POST /reservations/{id}/release
pub async fn release(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReservationDto>> {
    let reservation = state.service.get_reservation(&id).await?;
    let sync = state
        .service
        .get_sync_config_for_product(&reservation.product_id)
        .await?;
    let released = state.service.release_reserved_inventory(&sync, &id).await?;
    Ok(Json(released.into()))
}

/// POST /reservations/{id}/fulfill
pub async fn fulfill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReservationDto>> {
    let reservation = state.service.get_reservation(&id).await?;
    let sync = state
        .service
        .get_sync_config_for_product(&reservation.product_id)
        .await?;
    let fulfilled = state.service.fulfill_reserved_inventory(&sync, &id).await?;
    Ok(Json(fulfilled.into()))
}

/// GET /products/{product_id}/reservations
pub async fn list_reservations(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    query: Result<Query<ReservationsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ReservationDto>>> {
    let Query(query) = query?;
    let reservations = state
        .service
        .list_reservations(&product_id, query.location_id.as_deref(), query.status)
        .await?;
    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::super::testing::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_reserve_fulfill_release_flow() {
        let app = TestApp::new().await;
        app.stock(&app.warehouse.id, 10).await;
        let stock_uri = format!(
            "/products/{}/locations/{}/inventory",
            app.product.id, app.warehouse.id
        );
        let reserve = |quantity: i64| {
            json!({
                "productId": app.product.id,
                "locationId": app.warehouse.id,
                "quantity": quantity,
            })
        };

        let (status, first) = app.post("/reservations", reserve(4)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["status"], "reserved");
        assert!(first["resolvedAt"].is_null());

        let (_, stock) = app.get(&stock_uri).await;
        assert_eq!(stock["reservedQuantity"], 4);
        assert_eq!(stock["availableQuantity"], 6);

        let id = first["id"].as_str().unwrap().to_string();
        let (status, body) = app.post(&format!("/reservations/{id}/fulfill"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "fulfilled");

        let (_, stock) = app.get(&stock_uri).await;
        assert_eq!(stock["onHandQuantity"], 6);
        assert_eq!(stock["reservedQuantity"], 0);

        let (_, second) = app.post("/reservations", reserve(3)).await;
        let second_id = second["id"].as_str().unwrap().to_string();
        let (status, body) = app
            .post(&format!("/reservations/{second_id}/release"), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "released");

        let (_, stock) = app.get(&stock_uri).await;
        assert_eq!(stock["onHandQuantity"], 6);
        assert_eq!(stock["reservedQuantity"], 0);

        // Terminal states stay terminal
        let (status, body) = app.post(&format!("/reservations/{id}/release"), json!({})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_STATE");

        let (_, body) = app.get(&format!("/reservations/{id}")).await;
        assert_eq!(body["status"], "fulfilled");

        let (_, body) = app
            .get(&format!("/products/{}/reservations?status=released", app.product.id))
            .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], second_id.as_str());
    }

    #[tokio::test]
    async fn test_reserve_rejections() {
        let app = TestApp::new().await;
        app.stock(&app.warehouse.id, 2).await;

        let (status, body) = app
            .post(
                "/reservations",
                json!({
                    "productId": app.product.id,
                    "locationId": app.warehouse.id,
                    "quantity": 3,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert!(body["message"].as_str().unwrap().contains("available 2"));

        let (status, _) = app
            .post(
                "/reservations",
                json!({
                    "productId": app.product.id,
                    "locationId": app.warehouse.id,
                    "quantity": 0,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.post("/reservations/missing/fulfill", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
