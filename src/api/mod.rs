pub mod handlers;

pub use handlers::*;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

/// HTTP routes over the trip registry.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/allocate", post(allocate))
        .route("/api/trips/:trip_id", get(get_trip))
        .route("/api/trips/:trip_id/header", put(update_header))
        .route("/api/trips/:trip_id/invoices", post(add_invoice))
        .route("/api/trips/:trip_id/invoices/:invoice_id", delete(remove_invoice))
        .route("/api/trips/:trip_id/imports", post(import_batch))
        .route("/api/trips/:trip_id/imports/csv", post(import_csv))
        .route("/api/trips/:trip_id/recalculate", post(recalculate))
        .route("/api/trips/:trip_id/export.csv", get(export_csv))
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state)
}
