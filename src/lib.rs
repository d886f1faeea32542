//! partshub-api: parts-catalog backend built around a multi-location
//! inventory ledger. Stock quantities move only through the ledger service's
//! atomic guarded updates; the point-of-sale flow and the transfer workflow
//! are its two callers.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Versioned API surface.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/parts", handlers::parts::routes())
        .nest("/inventory", handlers::inventory::routes())
        .nest("/sales", handlers::sales::routes())
        .nest("/transfers", handlers::transfers::routes())
        .nest("/vision", handlers::vision::routes())
}

/// Full application router with request tracing.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "partshub-api up" }))
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
