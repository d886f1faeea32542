use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        sale::{self, Entity as Sales, SaleStatus},
        sale_item::{self, Entity as SaleItems},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger::LedgerService,
};

#[derive(Debug, Clone)]
pub struct SaleItemInput {
    pub part_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateSaleInput {
    pub store_id: i32,
    pub seller: String,
    pub client: String,
    pub items: Vec<SaleItemInput>,
    pub discount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub items: Vec<sale_item::Model>,
}

/// Two-phase point-of-sale flow: `create_sale` holds a pending cart without
/// touching stock; `finalize_sale` commits the stock debit exactly once.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl SaleService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Persists a new pending sale. Totals are computed from the
    /// caller-supplied prices; this layer trusts them. No stock is touched.
    #[instrument(skip(self, input), fields(store_id = input.store_id, items = input.items.len()))]
    pub async fn create_sale(&self, input: CreateSaleInput) -> Result<Uuid, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "a sale needs at least one item".to_string(),
            ));
        }
        for item in &input.items {
            if item.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "item quantity must be at least 1, got {} for part {}",
                    item.quantity, item.part_id
                )));
            }
        }
        if input.discount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "discount cannot be negative".to_string(),
            ));
        }

        let subtotal: Decimal = input
            .items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum();
        if input.discount > subtotal {
            return Err(ServiceError::ValidationError(format!(
                "discount {} exceeds subtotal {}",
                input.discount, subtotal
            )));
        }

        let sale_id = Uuid::new_v4();
        let txn = self.db.begin().await?;

        sale::ActiveModel {
            id: Set(sale_id),
            store_id: Set(input.store_id),
            seller: Set(input.seller),
            client: Set(input.client),
            subtotal: Set(subtotal),
            discount: Set(input.discount),
            total: Set(subtotal - input.discount),
            status: Set(SaleStatus::Pending),
            payment_method: Set(None),
            created_at: Set(Utc::now()),
            finalized_at: Set(None),
        }
        .insert(&txn)
        .await?;

        for item in input.items {
            sale_item::ActiveModel {
                sale_id: Set(sale_id),
                part_id: Set(item.part_id),
                name: Set(item.name),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::SaleCreated(sale_id)).await {
            warn!(error = %e, "failed to publish sale created event");
        }

        Ok(sale_id)
    }

    /// Pending sales for a store, newest first, with items attached.
    #[instrument(skip(self))]
    pub async fn list_pending_sales(
        &self,
        store_id: i32,
    ) -> Result<Vec<SaleWithItems>, ServiceError> {
        let sales = Sales::find()
            .filter(sale::Column::StoreId.eq(store_id))
            .filter(sale::Column::Status.eq(SaleStatus::Pending))
            .order_by_desc(sale::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut result = Vec::with_capacity(sales.len());
        for s in sales {
            let items = self.items_of(s.id).await?;
            result.push(SaleWithItems { sale: s, items });
        }
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn get_sale(&self, sale_id: Uuid) -> Result<SaleWithItems, ServiceError> {
        let sale = Sales::find_by_id(sale_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("sale {} not found", sale_id)))?;
        let items = self.items_of(sale_id).await?;
        Ok(SaleWithItems { sale, items })
    }

    /// Finalizes a pending sale: flips the status and debits every item from
    /// the sale's store, all in one transaction. The status flip is a
    /// conditional update guarded on `status = pending`, so two concurrent
    /// finalizations can never both pass it; the loser gets
    /// `AlreadyFinalized`. A failed debit aborts the whole operation, so no
    /// partial debits survive.
    #[instrument(skip(self), fields(sale_id = %sale_id))]
    pub async fn finalize_sale(
        &self,
        sale_id: Uuid,
        payment_method: String,
    ) -> Result<sale::Model, ServiceError> {
        let txn = self.db.begin().await?;

        // First statement of the transaction; the guard re-evaluates against
        // the committed row once any concurrent finalization finishes.
        let flipped = Sales::update_many()
            .col_expr(sale::Column::Status, Expr::value(SaleStatus::Finalized))
            .col_expr(
                sale::Column::PaymentMethod,
                Expr::value(Some(payment_method)),
            )
            .col_expr(sale::Column::FinalizedAt, Expr::value(Some(Utc::now())))
            .filter(sale::Column::Id.eq(sale_id))
            .filter(sale::Column::Status.eq(SaleStatus::Pending))
            .exec(&txn)
            .await?;

        if flipped.rows_affected == 0 {
            return Err(match Sales::find_by_id(sale_id).one(&txn).await? {
                Some(_) => ServiceError::AlreadyFinalized(sale_id),
                None => ServiceError::NotFound(format!("sale {} not found", sale_id)),
            });
        }

        let sale = Sales::find_by_id(sale_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("sale {} not found", sale_id)))?;

        let items = SaleItems::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .all(&txn)
            .await?;

        let store_id = sale.store_id;
        for item in &items {
            LedgerService::debit_on(&txn, item.part_id, store_id, item.quantity)
                .await
                .map_err(|cause| ServiceError::StockDebitFailed {
                    part_id: item.part_id,
                    cause: Box::new(cause),
                })?;
        }

        txn.commit().await?;

        if let Err(e) = self
            .event_sender
            .send(Event::SaleFinalized { sale_id, store_id })
            .await
        {
            warn!(error = %e, "failed to publish sale finalized event");
        }

        Ok(sale)
    }

    async fn items_of(&self, sale_id: Uuid) -> Result<Vec<sale_item::Model>, ServiceError> {
        Ok(SaleItems::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .order_by_asc(sale_item::Column::Id)
            .all(&*self.db)
            .await?)
    }
}
