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
    services::sales::{CreateSaleInput, SaleItemInput},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct SaleItemRequest {
    pub part_id: Uuid,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 1))]
    pub quantity: i64,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSaleRequest {
    pub store_id: i32,
    #[validate(length(min = 1))]
    pub seller: String,
    #[validate(length(min = 1))]
    pub client: String,
    #[validate]
    pub items: Vec<SaleItemRequest>,
    #[serde(default)]
    pub discount: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FinalizeSaleRequest {
    #[validate(length(min = 1))]
    pub payment_method: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreQuery {
    pub store_id: i32,
}

async fn create_sale(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let input = CreateSaleInput {
        store_id: payload.store_id,
        seller: payload.seller,
        client: payload.client,
        items: payload
            .items
            .into_iter()
            .map(|i| SaleItemInput {
                part_id: i.part_id,
                name: i.name,
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect(),
        discount: payload.discount,
    };
    let id = state
        .services
        .sales
        .create_sale(input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(json!({ "sale_id": id })))
}

async fn list_pending_sales(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StoreQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = state
        .services
        .sales
        .list_pending_sales(params.store_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sales))
}

async fn get_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = state
        .services
        .sales
        .get_sale(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sale))
}

async fn finalize_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FinalizeSaleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let sale = state
        .services
        .sales
        .finalize_sale(id, payload.payment_method)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sale))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_sale))
        .route("/pending", get(list_pending_sales))
        .route("/:id", get(get_sale))
        .route("/:id/finalize", post(finalize_sale))
}
