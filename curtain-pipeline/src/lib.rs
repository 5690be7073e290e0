//! curtain-pipeline library - custom curtain order pipeline
//!
//! Customers and orders flow through measurement, manufacturing and delivery;
//! each role works through its own gated view of the same store.

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod pipeline;

pub use error::{ApiError, ApiResult};
pub use pipeline::{Pipeline, Submitted};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

/// Build application router
///
/// Role endpoints are gated per request by the pipeline; `/health` is not.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let roles = Router::new()
        .route("/api/marketing", get(api::marketing_view))
        .route("/api/marketing/customers", post(api::create_customer))
        .route("/api/salesperson", get(api::salesperson_view))
        .route("/api/salesperson/orders", post(api::create_order))
        .route(
            "/api/measurement",
            get(api::measurement_view).post(api::submit_measurement),
        )
        .route(
            "/api/manufacturer",
            get(api::manufacturer_view).post(api::submit_manufacturing_status),
        )
        .route(
            "/api/delivery",
            get(api::delivery_view).post(api::submit_delivery),
        )
        .route("/api/owner", get(api::owner_view));

    Router::new()
        .merge(roles)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
