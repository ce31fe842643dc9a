use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orders_core::types::{OrderSummary, SnapshotMessage};

use crate::error::AppError;
use crate::hub::Payload;
use crate::state::AppState;

fn latest(app: &AppState) -> Result<Payload, AppError> {
    app.hub
        .latest_snapshot()
        .ok_or_else(|| AppError::not_found("no order snapshot has been broadcast yet"))
}

/// GET /api/orders: the latest broadcast payload, verbatim.
pub async fn get_orders(State(app): State<AppState>) -> Result<Response, AppError> {
    let payload = latest(&app)?;
    Ok(([(CONTENT_TYPE, "application/json")], payload.to_string()).into_response())
}

/// GET /api/orders/summary: order counts per status phase.
pub async fn get_summary(State(app): State<AppState>) -> Result<Json<OrderSummary>, AppError> {
    let payload = latest(&app)?;
    let message: SnapshotMessage = serde_json::from_str(&payload)?;
    Ok(Json(message.summary()))
}
