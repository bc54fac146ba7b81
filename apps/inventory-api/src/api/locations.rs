//! Location registry endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::dto::{CreateLocationRequest, ListLocationsQuery, LocationDto, UpdateLocationRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /vendors/{vendor_id}/locations
pub async fn create_location(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
    payload: Result<Json<CreateLocationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LocationDto>)> {
    let Json(req) = payload?;
    let location = state.service.create_location(&vendor_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(location.into())))
}

/// GET /vendors/{vendor_id}/locations
pub async fn list_locations(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
    query: Result<Query<ListLocationsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<LocationDto>>> {
    let Query(query) = query?;
    let locations = state
        .service
        .list_locations(&vendor_id, query.include_inactive)
        .await?;
    Ok(Json(locations.into_iter().map(Into::into).collect()))
}

/// GET /locations/{location_id}
pub async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> ApiResult<Json<LocationDto>> {
    let location = state.service.get_location(&location_id).await?;
    Ok(Json(location.into()))
}

/// PATCH /locations/{location_id}
pub async fn update_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
    payload: Result<Json<UpdateLocationRequest>, JsonRejection>,
) -> ApiResult<Json<LocationDto>> {
    let Json(req) = payload?;
    let location = state.service.update_location(&location_id, req.into()).await?;
    Ok(Json(location.into()))
}

/// DELETE /locations/{location_id}
///
/// Soft delete: the location is deactivated and returned.
pub async fn delete_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> ApiResult<Json<LocationDto>> {
    let location = state.service.delete_location(&location_id).await?;
    Ok(Json(location.into()))
}

#[cfg(test)]
mod tests {
    use super::super::testing::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_list() {
        let app = TestApp::new().await;
        let uri = format!("/vendors/{}/locations", app.vendor.id);

        let (status, body) = app.post(&uri, json!({ "name": "  Pop-up Stand " })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Pop-up Stand");
        assert_eq!(body["vendorId"], app.vendor.id.as_str());
        assert_eq!(body["isActive"], true);

        let (status, body) = app.get(&uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, body) = app.post(&uri, json!({ "name": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = app.post(&uri, json!({ "title": "no name" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app.get("/vendors/missing/locations").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_refused_while_stocked() {
        let app = TestApp::new().await;
        app.stock(&app.storefront.id, 4).await;
        let uri = format!("/locations/{}", app.storefront.id);

        let (status, body) = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _) = app
            .post(
                "/transfers",
                json!({
                    "productId": app.product.id,
                    "fromLocationId": app.storefront.id,
                    "toLocationId": app.warehouse.id,
                    "quantity": 4,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isActive"], false);

        // Inactive locations are hidden unless asked for
        let list = format!("/vendors/{}/locations", app.vendor.id);
        let (_, body) = app.get(&list).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        let (_, body) = app.get(&format!("{list}?include_inactive=true")).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rename_and_reactivate() {
        let app = TestApp::new().await;
        let uri = format!("/locations/{}", app.warehouse.id);

        let (status, body) = app
            .send(Method::PATCH, &uri, Some(json!({ "name": "Back Room", "isActive": false })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Back Room");
        assert_eq!(body["isActive"], false);

        let (status, body) = app
            .send(Method::PATCH, &uri, Some(json!({ "isActive": true })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Back Room");
        assert_eq!(body["isActive"], true);

        let (status, _) = app.get("/locations/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
