use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::{errors::ApiError, handlers::common::map_service_error, AppState};

/// Ledger read surface: total stock of a part plus its per-store breakdown.
async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(part_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let total = state
        .services
        .ledger
        .total_stock(part_id)
        .await
        .map_err(map_service_error)?;
    let locations = state
        .services
        .ledger
        .stock_for_part(part_id)
        .await
        .map_err(map_service_error)?;
    Ok(Json(json!({
        "part_id": part_id,
        "total": total,
        "locations": locations,
    })))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/:part_id", get(get_stock))
}
