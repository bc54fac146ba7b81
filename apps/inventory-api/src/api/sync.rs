//! Real-time sync toggle.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use crate::dto::{SetSyncRequest, SyncConfigDto};
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /vendors/{vendor_id}/sync
pub async fn get_sync(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
) -> ApiResult<Json<SyncConfigDto>> {
    let config = state.service.get_sync_config(&vendor_id).await?;
    Ok(Json(config.into()))
}

/// PUT /vendors/{vendor_id}/sync
pub async fn set_sync(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
    payload: Result<Json<SetSyncRequest>, JsonRejection>,
) -> ApiResult<Json<SyncConfigDto>> {
    let Json(req) = payload?;
    let config = state
        .service
        .set_real_time_sync(&vendor_id, req.real_time_sync_enabled)
        .await?;
    Ok(Json(config.into()))
}

#[cfg(test)]
mod tests {
    use super::super::testing::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_toggle_controls_outbox() {
        let app = TestApp::new().await;
        let uri = format!("/vendors/{}/sync", app.vendor.id);
        let outbox = app.db.sync_outbox();

        let (status, body) = app.get(&uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["realTimeSyncEnabled"], false);

        app.stock(&app.warehouse.id, 3).await;
        assert_eq!(outbox.count_pending().await.unwrap(), 0);

        let (status, body) = app
            .send(Method::PUT, &uri, Some(json!({ "realTimeSyncEnabled": true })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["realTimeSyncEnabled"], true);

        app.stock(&app.warehouse.id, 3).await;
        let (status, reservation) = app
            .post(
                "/reservations",
                json!({
                    "productId": app.product.id,
                    "locationId": app.warehouse.id,
                    "quantity": 1,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = reservation["id"].as_str().unwrap();
        app.post(&format!("/reservations/{id}/release"), json!({})).await;
        assert_eq!(outbox.count_pending().await.unwrap(), 3);

        let (status, _) = app.get("/vendors/missing/sync").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
