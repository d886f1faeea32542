use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response, validate_input},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ClassifyRequest {
    #[validate(length(min = 1))]
    pub image_base64: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1))]
    pub question: String,
    #[serde(default)]
    pub vehicle: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(length(min = 1))]
    pub subject: String,
    pub instructions: String,
    pub table_data: String,
}

/// Vision AI: photo in, part analysis out. Best-effort; a full backend
/// outage answers 503 without touching the ledger.
async fn classify(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ClassifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let image = BASE64
        .decode(payload.image_base64.as_bytes())
        .map_err(|e| ApiError::Validation(format!("image_base64 is not valid base64: {}", e)))?;
    let descriptor = state
        .services
        .classifier
        .classify(&image)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(json!({
        "analysis": descriptor.analysis,
        "engine": descriptor.engine,
    })))
}

/// Workshop chatbot over the same failover chain.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let prompt = match payload.vehicle {
        Some(vehicle) => format!("Vehicle: {}. Question: {}", vehicle, payload.question),
        None => payload.question,
    };
    let descriptor = state
        .services
        .classifier
        .generate(&prompt, "Technical consultant for a car workshop. Brief answers.")
        .await
        .map_err(map_service_error)?;
    Ok(success_response(json!({
        "answer": descriptor.analysis,
        "engine": descriptor.engine,
    })))
}

/// Supplier quotation e-mail drafting.
async fn email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let prompt = format!(
        "Subject: {}\nInstructions: {}\nTable data: {}",
        payload.subject, payload.instructions, payload.table_data
    );
    let descriptor = state
        .services
        .classifier
        .generate(
            &prompt,
            "Write a formal e-mail for quotation/purchase of automotive parts.",
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(json!({
        "email": descriptor.analysis,
        "engine": descriptor.engine,
    })))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/classify", post(classify))
        .route("/chat", post(chat))
        .route("/email", post(email))
}
