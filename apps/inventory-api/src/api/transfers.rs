//! Transfer endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::dto::{MovementDto, TransferDto, TransferRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /transfers
pub async fn transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransferDto>)> {
    let Json(req) = payload?;
    let sync = state.service.get_sync_config_for_product(&req.product_id).await?;
    let outcome = state
        .service
        .transfer_inventory(
            &sync,
            &req.product_id,
            &req.from_location_id,
            &req.to_location_id,
            req.quantity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// GET /transfers/{id}/movements
pub async fn transfer_movements(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<MovementDto>>> {
    let movements = state.service.get_transfer_movements(&id).await?;
    Ok(Json(movements.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::super::testing::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_transfer_moves_units_and_logs_both_legs() {
        let app = TestApp::new().await;
        app.stock(&app.warehouse.id, 20).await;

        let (status, body) = app
            .post(
                "/transfers",
                json!({
                    "productId": app.product.id,
                    "fromLocationId": app.warehouse.id,
                    "toLocationId": app.storefront.id,
                    "quantity": 5,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["source"]["onHandQuantity"], 15);
        assert_eq!(body["destination"]["onHandQuantity"], 5);
        assert_eq!(body["movements"].as_array().unwrap().len(), 2);

        let transfer_id = body["transferId"].as_str().unwrap();
        let (status, legs) = app.get(&format!("/transfers/{transfer_id}/movements")).await;
        assert_eq!(status, StatusCode::OK);
        let mut changes: Vec<i64> = legs
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["quantityChange"].as_i64().unwrap())
            .collect();
        changes.sort();
        assert_eq!(changes, vec![-5, 5]);

        let (status, _) = app.get("/transfers/missing/movements").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_transfer_rejections() {
        let app = TestApp::new().await;
        app.stock(&app.warehouse.id, 1).await;

        let (status, body) = app
            .post(
                "/transfers",
                json!({
                    "productId": app.product.id,
                    "fromLocationId": app.warehouse.id,
                    "toLocationId": app.warehouse.id,
                    "quantity": 1,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = app
            .post(
                "/transfers",
                json!({
                    "productId": app.product.id,
                    "fromLocationId": app.warehouse.id,
                    "toLocationId": app.storefront.id,
                    "quantity": 2,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");

        // Unknown destination answers like every other unknown location
        let (status, body) = app
            .post(
                "/transfers",
                json!({
                    "productId": app.product.id,
                    "fromLocationId": app.warehouse.id,
                    "toLocationId": "nowhere",
                    "quantity": 1,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
