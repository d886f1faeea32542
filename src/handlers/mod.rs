use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    events::EventSender,
    services::{
        catalog::CatalogService, classifier::ClassifierService, ledger::LedgerService,
        sales::SaleService, transfers::TransferService,
    },
};

pub mod common;
pub mod health;
pub mod inventory;
pub mod parts;
pub mod sales;
pub mod transfers;
pub mod vision;

/// Aggregated service handles shared by the HTTP handlers. Constructed once
/// at startup and injected through `AppState`; nothing reaches the stock
/// records except through the ledger service held here.
#[derive(Clone)]
pub struct AppServices {
    pub ledger: LedgerService,
    pub sales: SaleService,
    pub transfers: TransferService,
    pub catalog: CatalogService,
    pub classifier: ClassifierService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender, cfg: &AppConfig) -> Self {
        let ledger = LedgerService::new(db.clone(), event_sender.clone());
        let catalog = CatalogService::new(db.clone(), event_sender.clone());
        let sales = SaleService::new(db.clone(), event_sender.clone());
        let transfers = TransferService::new(db, event_sender, catalog.clone());
        let classifier = ClassifierService::new(
            cfg.classifier_backends.clone(),
            cfg.classifier_api_key.clone(),
        );
        Self {
            ledger,
            sales,
            transfers,
            catalog,
            classifier,
        }
    }
}
