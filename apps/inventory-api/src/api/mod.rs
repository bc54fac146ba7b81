//! API routes for the inventory service.
//!
//! ```text
//!  /health
//!  /vendors/{vendor_id}/locations            POST GET
//!  /vendors/{vendor_id}/inventory/totals     GET
//!  /vendors/{vendor_id}/inventory/metrics    GET   ?low=&over=
//!  /vendors/{vendor_id}/sync                 GET PUT
//!  /locations/{location_id}                  GET PATCH DELETE
//!  /products/{product_id}/inventory          GET
//!  /products/{product_id}/locations/{location_id}/inventory    GET
//!  /products/{product_id}/locations/{location_id}/adjustments  POST
//!  /products/{product_id}/movements          GET   ?limit=
//!  /products/{product_id}/reservations       GET   ?location_id=&status=
//!  /reservations                             POST
//!  /reservations/{id}                        GET
//!  /reservations/{id}/release                POST
//!  /reservations/{id}/fulfill                POST
//!  /transfers                                POST
//!  /transfers/{id}/movements                 GET
//! ```

pub mod health;
pub mod inventory;
pub mod locations;
pub mod reservations;
pub mod sync;
pub mod transfers;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let vendors = Router::new()
        .route(
            "/vendors/{vendor_id}/locations",
            post(locations::create_location).get(locations::list_locations),
        )
        .route("/vendors/{vendor_id}/inventory/totals", get(inventory::vendor_totals))
        .route("/vendors/{vendor_id}/inventory/metrics", get(inventory::vendor_metrics))
        .route("/vendors/{vendor_id}/sync", get(sync::get_sync).put(sync::set_sync));

    let locations = Router::new().route(
        "/locations/{location_id}",
        get(locations::get_location)
            .patch(locations::update_location)
            .delete(locations::delete_location),
    );

    let products = Router::new()
        .route("/products/{product_id}/inventory", get(inventory::across_locations))
        .route(
            "/products/{product_id}/locations/{location_id}/inventory",
            get(inventory::get_inventory),
        )
        .route(
            "/products/{product_id}/locations/{location_id}/adjustments",
            post(inventory::adjust_inventory),
        )
        .route("/products/{product_id}/movements", get(inventory::list_movements))
        .route(
            "/products/{product_id}/reservations",
            get(reservations::list_reservations),
        );

    let reservations = Router::new()
        .route("/reservations", post(reservations::reserve))
        .route("/reservations/{id}", get(reservations::get_reservation))
        .route("/reservations/{id}/release", post(reservations::release))
        .route("/reservations/{id}/fulfill", post(reservations::fulfill));

    let transfers = Router::new()
        .route("/transfers", post(transfers::transfer))
        .route("/transfers/{id}/movements", get(transfers::transfer_movements));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(vendors)
        .merge(locations)
        .merge(products)
        .merge(reservations)
        .merge(transfers)
        .with_state(state)
}
