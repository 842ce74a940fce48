use crate::error::TripError;
use crate::models::{HeaderParameters, InvoiceId, InvoiceRecord, RawInvoiceEntry};
use crate::service::{self, BatchImportAdapter, Recalculation, TripRegistry};
use crate::spreadsheet;
use axum::{
    body::Bytes,
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Shared state: trip sessions plus the import adapter
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TripRegistry>,
    pub importer: Arc<BatchImportAdapter>,
}

/// Response body
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

/// Request body for a one-off allocation
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    #[serde(default)]
    pub header: HeaderParameters,
    #[serde(default)]
    pub invoices: Vec<InvoiceRecord>,
}

fn success<T: Serialize>(message: String, data: T) -> Response {
    let response = ApiResponse {
        success: true,
        message,
        data: Some(data),
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn failure(status: StatusCode, message: String) -> Response {
    let response = ApiResponse::<()> {
        success: false,
        message,
        data: None,
    };
    (status, Json(response)).into_response()
}

fn trip_failure(trip_id: &str, e: TripError) -> Response {
    let status = match &e {
        TripError::Allocation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TripError::UnknownInvoice(_) => StatusCode::NOT_FOUND,
        TripError::BatchTooLarge { .. } | TripError::Csv(_) => StatusCode::BAD_REQUEST,
    };
    tracing::warn!("Trip {}: request failed: {}", trip_id, e);
    failure(status, format!("Error: {}", e))
}

fn unknown_trip(trip_id: &str) -> Response {
    failure(StatusCode::NOT_FOUND, format!("Trip {} not found", trip_id))
}

fn recalculated(trip_id: &str, result: Result<Recalculation, TripError>) -> Response {
    match result {
        Ok(recalculation) => {
            let message = format!(
                "Trip {}: values apportioned across {} invoices",
                trip_id,
                recalculation.snapshot.invoices.len()
            );
            success(message, recalculation)
        }
        Err(e) => trip_failure(trip_id, e),
    }
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// Stateless allocation of a header and invoice list
pub async fn allocate(Json(req): Json<AllocateRequest>) -> Response {
    let mut seen = HashSet::new();
    if let Some(duplicate) = req.invoices.iter().find(|invoice| !seen.insert(invoice.id)) {
        return failure(
            StatusCode::BAD_REQUEST,
            format!("Error: invoice id {} appears more than once", duplicate.id),
        );
    }

    match service::allocate(&req.header, &req.invoices) {
        Ok(snapshot) => {
            let message = format!(
                "Allocated {:.2} across {} invoices",
                snapshot.totals.grand_total,
                snapshot.invoices.len()
            );
            success(message, snapshot)
        }
        Err(e) => failure(StatusCode::UNPROCESSABLE_ENTITY, format!("Error: {}", e)),
    }
}

/// Current allocation of a trip
pub async fn get_trip(State(state): State<AppState>, Path(trip_id): Path<String>) -> Response {
    let Some(session) = state.registry.get(&trip_id) else {
        return unknown_trip(&trip_id);
    };
    let snapshot = session.lock().await.snapshot();
    success(
        format!("Trip {}: {} invoices", trip_id, snapshot.invoices.len()),
        snapshot,
    )
}

/// Replace the trip header
pub async fn update_header(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Json(header): Json<HeaderParameters>,
) -> Response {
    let session = state.registry.session(&trip_id);
    let result = session.lock().await.update_header(header);
    recalculated(&trip_id, result)
}

/// Add one invoice
pub async fn add_invoice(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Json(entry): Json<RawInvoiceEntry>,
) -> Response {
    let session = state.registry.session(&trip_id);
    let result = session.lock().await.add_invoice(entry);
    recalculated(&trip_id, result)
}

/// Remove one invoice
pub async fn remove_invoice(
    State(state): State<AppState>,
    Path((trip_id, invoice_id)): Path<(String, u64)>,
) -> Response {
    let Some(session) = state.registry.get(&trip_id) else {
        return unknown_trip(&trip_id);
    };
    let result = session.lock().await.remove_invoice(InvoiceId(invoice_id));
    recalculated(&trip_id, result)
}

/// Manual re-apply
pub async fn recalculate(State(state): State<AppState>, Path(trip_id): Path<String>) -> Response {
    let Some(session) = state.registry.get(&trip_id) else {
        return unknown_trip(&trip_id);
    };
    let result = session.lock().await.reapply();
    recalculated(&trip_id, result)
}

/// Batch import from JSON
pub async fn import_batch(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Json(entries): Json<Vec<RawInvoiceEntry>>,
) -> Response {
    let session = state.registry.session(&trip_id);
    let result = state.importer.import(&mut *session.lock().await, entries);
    match result {
        Ok(outcome) => success(
            format!("{} invoices imported", outcome.report.imported),
            outcome,
        ),
        Err(e) => trip_failure(&trip_id, e),
    }
}

/// Batch import from a CSV document. Raw bytes, so an undecodable document
/// is reported by the CSV reader.
pub async fn import_csv(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    body: Bytes,
) -> Response {
    let session = state.registry.session(&trip_id);
    let result = state
        .importer
        .import_csv(&mut *session.lock().await, &body[..]);
    match result {
        Ok(outcome) => success(
            format!("{} invoices imported", outcome.report.imported),
            outcome,
        ),
        Err(e) => trip_failure(&trip_id, e),
    }
}

/// CSV export of the current allocation
pub async fn export_csv(State(state): State<AppState>, Path(trip_id): Path<String>) -> Response {
    let Some(session) = state.registry.get(&trip_id) else {
        return unknown_trip(&trip_id);
    };
    let snapshot = session.lock().await.snapshot();
    match spreadsheet::snapshot_to_csv(&snapshot, state.importer.config().delimiter()) {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)),
    }
}
