use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::entities::transfer::TransferStatus;

/// Error body returned by every failing endpoint: a machine-readable kind,
/// a human-readable message, and the ids/quantities needed to render an
/// actionable message on the caller side.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub timestamp: String,
}

/// Domain error taxonomy for the ledger, sale and transfer services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid transition from '{from}' on request for '{requested}'")]
    InvalidTransition {
        from: TransferStatus,
        requested: TransferStatus,
    },

    #[error(
        "Insufficient stock for part {part_id} at store {store_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        part_id: Uuid,
        store_id: i32,
        requested: i64,
        available: i64,
    },

    #[error("Part {part_id} has no stock location at store {store_id}")]
    NoSuchLocation { part_id: Uuid, store_id: i32 },

    #[error("Sale {0} is already finalized")]
    AlreadyFinalized(Uuid),

    #[error("Stock debit failed for part {part_id}: {cause}")]
    StockDebitFailed {
        part_id: Uuid,
        #[source]
        cause: Box<ServiceError>,
    },

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Event error: {0}")]
    EventError(String),
}

impl ServiceError {
    /// Machine-readable error kind for the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::DatabaseError(_) => "database_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::ValidationError(_) => "validation_error",
            ServiceError::InvalidTransition { .. } => "invalid_transition",
            ServiceError::InsufficientStock { .. } => "insufficient_stock",
            ServiceError::NoSuchLocation { .. } => "no_such_location",
            ServiceError::AlreadyFinalized(_) => "already_finalized",
            ServiceError::StockDebitFailed { .. } => "stock_debit_failed",
            ServiceError::ExternalServiceError(_) => "external_service_error",
            ServiceError::EventError(_) => "event_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidTransition { .. } | ServiceError::AlreadyFinalized(_) => {
                StatusCode::CONFLICT
            }
            ServiceError::InsufficientStock { .. }
            | ServiceError::NoSuchLocation { .. }
            | ServiceError::StockDebitFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::ExternalServiceError(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::DatabaseError(_) | ServiceError::EventError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServiceError::InvalidTransition { from, requested } => Some(json!({
                "from": from.to_string(),
                "requested": requested.to_string(),
            })),
            ServiceError::InsufficientStock {
                part_id,
                store_id,
                requested,
                available,
            } => Some(json!({
                "part_id": part_id,
                "store_id": store_id,
                "requested": requested,
                "available": available,
            })),
            ServiceError::NoSuchLocation { part_id, store_id } => Some(json!({
                "part_id": part_id,
                "store_id": store_id,
            })),
            ServiceError::AlreadyFinalized(sale_id) => Some(json!({ "sale_id": sale_id })),
            ServiceError::StockDebitFailed { part_id, cause } => Some(json!({
                "part_id": part_id,
                "cause": cause.kind(),
                "cause_details": cause.details(),
            })),
            _ => None,
        }
    }
}

/// HTTP-facing error wrapper used by the axum handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message, details) = match self {
            ApiError::Service(err) => {
                let status = err.status();
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "internal error");
                    // Internals are logged, not leaked.
                    (
                        status,
                        err.kind().to_string(),
                        "internal server error".to_string(),
                        None,
                    )
                } else {
                    (status, err.kind().to_string(), err.to_string(), err.details())
                }
            }
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error".to_string(),
                msg,
                None,
            ),
        };

        let body = ErrorResponse {
            error: kind,
            message,
            details,
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}
