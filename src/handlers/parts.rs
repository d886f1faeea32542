use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response, validate_input},
    services::catalog::{CreatePartInput, StockEntryInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct StockEntryRequest {
    pub store_id: i32,
    #[serde(default)]
    pub label: String,
    #[validate(range(min = 0))]
    pub quantity: i64,
    #[serde(default)]
    pub sub_location: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePartRequest {
    #[validate(length(min = 1))]
    pub sku: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub manufacturer_code: String,
    pub brand: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ai_tags: Option<String>,
    #[serde(default)]
    #[validate]
    pub initial_stock: Vec<StockEntryRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub term: String,
}

async fn create_part(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let input = CreatePartInput {
        sku: payload.sku,
        name: payload.name,
        manufacturer_code: payload.manufacturer_code,
        brand: payload.brand,
        unit_price: payload.unit_price,
        image_url: payload.image_url,
        ai_tags: payload.ai_tags,
        initial_stock: payload
            .initial_stock
            .into_iter()
            .map(|e| StockEntryInput {
                store_id: e.store_id,
                label: e.label,
                quantity: e.quantity,
                sub_location: e.sub_location,
            })
            .collect(),
    };
    let id = state
        .services
        .catalog
        .create_part(input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(json!({ "part_id": id })))
}

/// Accepts a raw legacy catalog document; quantity coercion happens in the
/// catalog service.
async fn import_part(
    State(state): State<Arc<AppState>>,
    Json(doc): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state
        .services
        .catalog
        .import_part(&doc)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(json!({ "part_id": id })))
}

async fn search_parts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let parts = state
        .services
        .catalog
        .search_parts(&params.term)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(parts))
}

async fn get_part(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let part = state
        .services
        .catalog
        .get_part(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(part))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_part))
        .route("/import", post(import_part))
        .route("/search", get(search_parts))
        .route("/:id", get(get_part))
}
