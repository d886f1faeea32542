use std::sync::Arc;

use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entities::stock_location::{self, Entity as StockLocations},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Ledger gateway: the only code allowed to mutate
/// `stock_locations.quantity`. Debits and credits are single guarded UPDATE
/// statements, so the availability check and the quantity change are one
/// atomic operation per `(part, store)` pair and concurrent callers
/// serialize at the storage layer.
#[derive(Clone)]
pub struct LedgerService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl LedgerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Debits `qty` units of a part from a store's stock location.
    ///
    /// Fails with `NoSuchLocation` when the store has no entry for the part
    /// and `InsufficientStock` (carrying the available quantity) when the
    /// entry cannot cover the debit.
    #[instrument(skip(self))]
    pub async fn debit(&self, part_id: Uuid, store_id: i32, qty: i64) -> Result<(), ServiceError> {
        Self::debit_on(&*self.db, part_id, store_id, qty).await?;
        if let Err(e) = self
            .event_sender
            .send(Event::StockDebited {
                part_id,
                store_id,
                quantity: qty,
            })
            .await
        {
            warn!(error = %e, "failed to publish stock debit event");
        }
        Ok(())
    }

    /// Credits `qty` units of a part to a store, appending a new stock
    /// location when the store has never held the part. Never fails for a
    /// positive quantity.
    #[instrument(skip(self))]
    pub async fn credit(&self, part_id: Uuid, store_id: i32, qty: i64) -> Result<(), ServiceError> {
        Self::credit_on(&*self.db, part_id, store_id, qty).await?;
        if let Err(e) = self
            .event_sender
            .send(Event::StockCredited {
                part_id,
                store_id,
                quantity: qty,
            })
            .await
        {
            warn!(error = %e, "failed to publish stock credit event");
        }
        Ok(())
    }

    /// Guarded debit usable inside a caller-owned transaction. The
    /// `quantity >= qty` predicate lives in the UPDATE itself; there is no
    /// separate check that a concurrent writer could slip between.
    pub(crate) async fn debit_on<C: ConnectionTrait>(
        conn: &C,
        part_id: Uuid,
        store_id: i32,
        qty: i64,
    ) -> Result<(), ServiceError> {
        if qty <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "debit quantity must be positive, got {}",
                qty
            )));
        }

        let result = StockLocations::update_many()
            .col_expr(
                stock_location::Column::Quantity,
                Expr::col(stock_location::Column::Quantity).sub(qty),
            )
            .filter(stock_location::Column::PartId.eq(part_id))
            .filter(stock_location::Column::StoreId.eq(store_id))
            .filter(stock_location::Column::Quantity.gte(qty))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            // Guard refused; read back to tell the caller why.
            let existing = StockLocations::find()
                .filter(stock_location::Column::PartId.eq(part_id))
                .filter(stock_location::Column::StoreId.eq(store_id))
                .one(conn)
                .await?;
            return Err(match existing {
                Some(location) => ServiceError::InsufficientStock {
                    part_id,
                    store_id,
                    requested: qty,
                    available: location.quantity,
                },
                None => ServiceError::NoSuchLocation { part_id, store_id },
            });
        }

        Ok(())
    }

    /// Guarded credit usable inside a caller-owned transaction.
    pub(crate) async fn credit_on<C: ConnectionTrait>(
        conn: &C,
        part_id: Uuid,
        store_id: i32,
        qty: i64,
    ) -> Result<(), ServiceError> {
        if qty <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "credit quantity must be positive, got {}",
                qty
            )));
        }

        let result = StockLocations::update_many()
            .col_expr(
                stock_location::Column::Quantity,
                Expr::col(stock_location::Column::Quantity).add(qty),
            )
            .filter(stock_location::Column::PartId.eq(part_id))
            .filter(stock_location::Column::StoreId.eq(store_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            // First stock this store has ever held of the part: append a
            // fresh location row.
            let location = stock_location::ActiveModel {
                part_id: Set(part_id),
                store_id: Set(store_id),
                label: Set(format!("Loja {}", store_id)),
                quantity: Set(qty),
                sub_location: Set("received".to_string()),
                ..Default::default()
            };
            if let Err(insert_err) = location.insert(conn).await {
                // Lost an insert race on the (part, store) unique key; the
                // row exists now, so increment it instead.
                let retry = StockLocations::update_many()
                    .col_expr(
                        stock_location::Column::Quantity,
                        Expr::col(stock_location::Column::Quantity).add(qty),
                    )
                    .filter(stock_location::Column::PartId.eq(part_id))
                    .filter(stock_location::Column::StoreId.eq(store_id))
                    .exec(conn)
                    .await?;
                if retry.rows_affected == 0 {
                    return Err(ServiceError::DatabaseError(insert_err));
                }
            }
        }

        Ok(())
    }

    /// Sum of the part's quantities across all stores. A part with no
    /// locations totals zero; this never fails on content.
    #[instrument(skip(self))]
    pub async fn total_stock(&self, part_id: Uuid) -> Result<i64, ServiceError> {
        let locations = StockLocations::find()
            .filter(stock_location::Column::PartId.eq(part_id))
            .all(&*self.db)
            .await?;
        Ok(locations.iter().map(|l| l.quantity).sum())
    }

    /// Stock locations of a part in append order.
    #[instrument(skip(self))]
    pub async fn stock_for_part(
        &self,
        part_id: Uuid,
    ) -> Result<Vec<stock_location::Model>, ServiceError> {
        Ok(StockLocations::find()
            .filter(stock_location::Column::PartId.eq(part_id))
            .order_by_asc(stock_location::Column::Id)
            .all(&*self.db)
            .await?)
    }
}

/// Coerces a quantity field from a legacy loosely-typed catalog document.
/// Old dumps carry quantities as strings ("12") and occasionally garbage;
/// anything that does not parse as a non-negative integer counts as zero.
pub fn coerce_quantity(value: &serde_json::Value) -> i64 {
    let parsed = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    };
    parsed.max(0)
}
