use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        part::{self, Entity as Parts},
        stock_location,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger::coerce_quantity,
};

const SEARCH_LIMIT: u64 = 10;

#[derive(Debug, Clone)]
pub struct StockEntryInput {
    pub store_id: i32,
    pub label: String,
    pub quantity: i64,
    pub sub_location: String,
}

#[derive(Debug, Clone)]
pub struct CreatePartInput {
    pub sku: String,
    pub name: String,
    pub manufacturer_code: String,
    pub brand: String,
    pub unit_price: Decimal,
    pub image_url: Option<String>,
    pub ai_tags: Option<String>,
    pub initial_stock: Vec<StockEntryInput>,
}

/// Display metadata snapshotted onto a transfer at creation time. Never used
/// for live pricing or stock, which stay in the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct PartSnapshot {
    pub name: String,
    pub image_url: Option<String>,
}

/// Thin catalog collaborator: part creation/import, lookup and search. No
/// stock mutation happens here beyond seeding initial locations at creation.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_part(&self, input: CreatePartInput) -> Result<Uuid, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "part name cannot be empty".to_string(),
            ));
        }
        for entry in &input.initial_stock {
            if entry.quantity < 0 {
                return Err(ServiceError::ValidationError(format!(
                    "initial stock cannot be negative, got {} for store {}",
                    entry.quantity, entry.store_id
                )));
            }
        }

        let part_id = Uuid::new_v4();
        let txn = self.db.begin().await?;

        part::ActiveModel {
            id: Set(part_id),
            sku: Set(input.sku),
            name: Set(input.name),
            manufacturer_code: Set(input.manufacturer_code),
            brand: Set(input.brand),
            unit_price: Set(input.unit_price),
            image_url: Set(input.image_url),
            ai_tags: Set(input.ai_tags),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        for entry in input.initial_stock {
            stock_location::ActiveModel {
                part_id: Set(part_id),
                store_id: Set(entry.store_id),
                label: Set(entry.label),
                quantity: Set(entry.quantity),
                sub_location: Set(entry.sub_location),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::PartCreated(part_id)).await {
            warn!(error = %e, "failed to publish part created event");
        }

        Ok(part_id)
    }

    /// Imports a part from a legacy catalog dump document
    /// (`SKU_ID`/`PRODUTO_NOME`/`ESTOQUE_REDE` shape). Quantities in these
    /// dumps are loosely typed; they pass through `coerce_quantity` so the
    /// domain only ever sees non-negative integers.
    #[instrument(skip(self, doc))]
    pub async fn import_part(&self, doc: &serde_json::Value) -> Result<Uuid, ServiceError> {
        let text = |key: &str| -> Result<String, ServiceError> {
            doc.get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!("missing or non-string field {}", key))
                })
        };

        let sku = text("SKU_ID")?;
        let name = text("PRODUTO_NOME")?;
        let brand = text("MARCA")?;
        let manufacturer_code = text("COD_FABRICANTE")?;

        let unit_price = match doc.get("PRECO_VENDA") {
            Some(serde_json::Value::Number(n)) => n
                .as_f64()
                .and_then(|f| Decimal::try_from(f).ok())
                .ok_or_else(|| {
                    ServiceError::ValidationError("PRECO_VENDA is not a valid price".to_string())
                })?,
            Some(serde_json::Value::String(s)) => s.trim().parse::<Decimal>().map_err(|_| {
                ServiceError::ValidationError("PRECO_VENDA is not a valid price".to_string())
            })?,
            _ => {
                return Err(ServiceError::ValidationError(
                    "missing field PRECO_VENDA".to_string(),
                ))
            }
        };

        let ai_tags = doc
            .get("TAGS_IA")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let mut initial_stock = Vec::new();
        if let Some(entries) = doc.get("ESTOQUE_REDE").and_then(|v| v.as_array()) {
            for entry in entries {
                let store_id = entry.get("loja_id").and_then(|v| v.as_i64()).ok_or_else(|| {
                    ServiceError::ValidationError(
                        "stock entry is missing an integer loja_id".to_string(),
                    )
                })?;
                initial_stock.push(StockEntryInput {
                    store_id: store_id as i32,
                    label: entry
                        .get("nome")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    quantity: entry
                        .get("qtd")
                        .map(coerce_quantity)
                        .unwrap_or_default(),
                    sub_location: entry
                        .get("local")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                });
            }
        }

        self.create_part(CreatePartInput {
            sku,
            name,
            manufacturer_code,
            brand,
            unit_price,
            image_url: None,
            ai_tags,
            initial_stock,
        })
        .await
    }

    /// Display snapshot used by the transfer workflow at creation time.
    #[instrument(skip(self))]
    pub async fn lookup_part(&self, part_id: Uuid) -> Result<PartSnapshot, ServiceError> {
        let part = Parts::find_by_id(part_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("part {} not found", part_id)))?;
        Ok(PartSnapshot {
            name: part.name,
            image_url: part.image_url,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_part(&self, part_id: Uuid) -> Result<part::Model, ServiceError> {
        Parts::find_by_id(part_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("part {} not found", part_id)))
    }

    /// Case-insensitive substring search over name, SKU, manufacturer code
    /// and AI tags; top 10 matches, newest first. An empty term matches
    /// nothing.
    #[instrument(skip(self))]
    pub async fn search_parts(&self, term: &str) -> Result<Vec<part::Model>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        Ok(Parts::find()
            .filter(
                Condition::any()
                    .add(part::Column::Name.contains(term))
                    .add(part::Column::Sku.contains(term))
                    .add(part::Column::ManufacturerCode.contains(term))
                    .add(part::Column::AiTags.contains(term)),
            )
            .order_by_desc(part::Column::CreatedAt)
            .limit(SEARCH_LIMIT)
            .all(&*self.db)
            .await?)
    }
}
