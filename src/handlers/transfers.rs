use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::transfer::{TransferKind, TransferStatus},
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response, validate_input},
    services::transfers::RequestTransferInput,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RequestTransferRequest {
    pub part_id: Uuid,
    pub from_store_id: i32,
    pub to_store_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i64,
    pub kind: TransferKind,
    #[validate(length(min = 1))]
    pub actor: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdvanceTransferRequest {
    pub target_status: TransferStatus,
    #[validate(length(min = 1))]
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreQuery {
    pub store_id: i32,
}

async fn request_transfer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RequestTransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let id = state
        .services
        .transfers
        .request_transfer(RequestTransferInput {
            part_id: payload.part_id,
            from_store_id: payload.from_store_id,
            to_store_id: payload.to_store_id,
            quantity: payload.quantity,
            kind: payload.kind,
            actor: payload.actor,
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response(json!({ "transfer_id": id })))
}

async fn list_transfers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StoreQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let transfers = state
        .services
        .transfers
        .list_for_store(params.store_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(transfers))
}

async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transfer = state
        .services
        .transfers
        .get_transfer(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(transfer))
}

async fn advance_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceTransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let new_status = state
        .services
        .transfers
        .advance(id, payload.target_status, payload.actor)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(json!({ "new_status": new_status })))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(request_transfer))
        .route("/", get(list_transfers))
        .route("/:id", get(get_transfer))
        .route("/:id/advance", post(advance_transfer))
}
