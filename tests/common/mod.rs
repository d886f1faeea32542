use std::sync::Arc;

use axum::Router;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use uuid::Uuid;

use partshub_api::{
    app_router,
    config::AppConfig,
    db,
    events::{self, EventSender},
    handlers::AppServices,
    services::catalog::{CreatePartInput, StockEntryInput},
    AppState,
};

/// Test harness: application state over a fresh file-backed SQLite database
/// that lives in a per-test temporary directory.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    /// Single-connection pool; writes are fully serialized.
    pub async fn new() -> Self {
        Self::with_pool_size(1).await
    }

    /// Larger pool for tests that race connections against each other.
    pub async fn with_pool_size(max_connections: u32) -> Self {
        let db_dir = tempfile::tempdir().expect("tempdir");
        let db_path = db_dir.path().join("partshub_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = max_connections;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection(&cfg).await.expect("db connect");
        db::run_migrations(&pool).await.expect("migrations");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone(), &cfg);
        let state = Arc::new(AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        });
        let router = app_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
        }
    }

    pub fn services(&self) -> &AppServices {
        &self.state.services
    }

    /// Seeds a catalog part with stock at the given `(store_id, quantity)`
    /// pairs and returns its id.
    pub async fn seed_part(&self, name: &str, stock: &[(i32, i64)]) -> Uuid {
        self.services()
            .catalog
            .create_part(CreatePartInput {
                sku: format!("SKU-{}", name),
                name: name.to_string(),
                manufacturer_code: format!("MF-{}", name),
                brand: "TestBrand".to_string(),
                unit_price: Decimal::new(9990, 2),
                image_url: None,
                ai_tags: None,
                initial_stock: stock
                    .iter()
                    .map(|(store_id, quantity)| StockEntryInput {
                        store_id: *store_id,
                        label: format!("Loja {}", store_id),
                        quantity: *quantity,
                        sub_location: "A1".to_string(),
                    })
                    .collect(),
            })
            .await
            .expect("seed part")
    }

    /// Current quantity at a store, or None when the part has no location
    /// there.
    pub async fn quantity_at(&self, part_id: Uuid, store_id: i32) -> Option<i64> {
        self.services()
            .ledger
            .stock_for_part(part_id)
            .await
            .expect("stock_for_part")
            .into_iter()
            .find(|l| l.store_id == store_id)
            .map(|l| l.quantity)
    }
}
