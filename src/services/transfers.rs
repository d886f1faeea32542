use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        transfer::{self, Entity as Transfers, TransferKind, TransferStatus},
        transfer_event::{self, Entity as TransferEvents},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{catalog::CatalogService, ledger::LedgerService},
};

#[derive(Debug, Clone)]
pub struct RequestTransferInput {
    pub part_id: Uuid,
    pub from_store_id: i32,
    pub to_store_id: i32,
    pub quantity: i64,
    pub kind: TransferKind,
    pub actor: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferWithHistory {
    #[serde(flatten)]
    pub transfer: transfer::Model,
    pub history: Vec<transfer_event::Model>,
}

/// Transfer workflow engine. Status moves only through `advance`, each
/// accepted transition running as one transaction: ledger effect, status
/// update and history append commit together or not at all.
#[derive(Clone)]
pub struct TransferService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    catalog: CatalogService,
}

impl TransferService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        catalog: CatalogService,
    ) -> Self {
        Self {
            db,
            event_sender,
            catalog,
        }
    }

    /// Creates a pending transfer, snapshotting the part's display metadata
    /// from the catalog. No stock moves until approval.
    #[instrument(skip(self, input), fields(part_id = %input.part_id))]
    pub async fn request_transfer(
        &self,
        input: RequestTransferInput,
    ) -> Result<Uuid, ServiceError> {
        if input.from_store_id == input.to_store_id {
            return Err(ServiceError::ValidationError(
                "origin and destination stores must differ".to_string(),
            ));
        }
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "transfer quantity must be at least 1, got {}",
                input.quantity
            )));
        }

        let snapshot = self.catalog.lookup_part(input.part_id).await?;

        let transfer_id = Uuid::new_v4();
        let now = Utc::now();
        let txn = self.db.begin().await?;

        transfer::ActiveModel {
            id: Set(transfer_id),
            part_id: Set(input.part_id),
            part_name: Set(snapshot.name),
            part_image: Set(snapshot.image_url),
            from_store_id: Set(input.from_store_id),
            to_store_id: Set(input.to_store_id),
            quantity: Set(input.quantity),
            kind: Set(input.kind),
            status: Set(TransferStatus::Pending),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        transfer_event::ActiveModel {
            transfer_id: Set(transfer_id),
            status: Set(TransferStatus::Pending),
            actor: Set(input.actor),
            recorded_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        if let Err(e) = self
            .event_sender
            .send(Event::TransferRequested(transfer_id))
            .await
        {
            warn!(error = %e, "failed to publish transfer requested event");
        }

        Ok(transfer_id)
    }

    /// Drives a transfer one step forward.
    ///
    /// Approval settles in the same call: the guarded origin debit doubles as
    /// the availability check, then a pickup credits the destination and
    /// completes while a delivery parks in `picking` with the stock reserved
    /// out of the origin. Any event not in the transition table fails with
    /// `InvalidTransition` and leaves no trace, so a duplicate client retry
    /// can never double-credit. The status flip itself is a conditional
    /// update guarded on the observed status; when two calls race, exactly
    /// one passes and the loser gets `InvalidTransition` against the settled
    /// state.
    #[instrument(skip(self), fields(transfer_id = %transfer_id, target_status = %target))]
    pub async fn advance(
        &self,
        transfer_id: Uuid,
        target: TransferStatus,
        actor: String,
    ) -> Result<TransferStatus, ServiceError> {
        let t = Transfers::find_by_id(transfer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("transfer {} not found", transfer_id))
            })?;

        let old_status = t.status;
        let new_status = match (t.status, target) {
            (TransferStatus::Pending, TransferStatus::Approved) => match t.kind {
                TransferKind::Pickup => TransferStatus::Completed,
                TransferKind::Delivery => TransferStatus::Picking,
            },
            (TransferStatus::Picking, TransferStatus::InTransit) => TransferStatus::InTransit,
            (TransferStatus::InTransit, TransferStatus::Completed) => TransferStatus::Completed,
            (TransferStatus::Pending, TransferStatus::Rejected) => TransferStatus::Rejected,
            (from, requested) => {
                return Err(ServiceError::InvalidTransition { from, requested });
            }
        };

        let txn = self.db.begin().await?;

        // First statement of the transaction; the guard re-evaluates once a
        // concurrent advance commits, so a lost race never applies its
        // ledger effects.
        let flipped = Transfers::update_many()
            .col_expr(transfer::Column::Status, Expr::value(new_status))
            .filter(transfer::Column::Id.eq(transfer_id))
            .filter(transfer::Column::Status.eq(old_status))
            .exec(&txn)
            .await?;

        if flipped.rows_affected == 0 {
            let fresh = Transfers::find_by_id(transfer_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("transfer {} not found", transfer_id))
                })?;
            return Err(ServiceError::InvalidTransition {
                from: fresh.status,
                requested: target,
            });
        }

        if old_status == TransferStatus::Pending && target == TransferStatus::Approved {
            // The debit is the guard: it refuses atomically when the origin
            // cannot cover the quantity.
            LedgerService::debit_on(&txn, t.part_id, t.from_store_id, t.quantity).await?;
            if t.kind == TransferKind::Pickup {
                LedgerService::credit_on(&txn, t.part_id, t.to_store_id, t.quantity).await?;
            }
        } else if new_status == TransferStatus::Completed {
            LedgerService::credit_on(&txn, t.part_id, t.to_store_id, t.quantity).await?;
        }

        transfer_event::ActiveModel {
            transfer_id: Set(transfer_id),
            status: Set(new_status),
            actor: Set(actor),
            recorded_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        if let Err(e) = self
            .event_sender
            .send(Event::TransferAdvanced {
                transfer_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await
        {
            warn!(error = %e, "failed to publish transfer advanced event");
        }

        Ok(new_status)
    }

    /// Transfers where the store is origin or destination, newest first.
    /// One feed serves both "things I must approve" and "things I am
    /// expecting".
    #[instrument(skip(self))]
    pub async fn list_for_store(
        &self,
        store_id: i32,
    ) -> Result<Vec<TransferWithHistory>, ServiceError> {
        let transfers = Transfers::find()
            .filter(
                Condition::any()
                    .add(transfer::Column::FromStoreId.eq(store_id))
                    .add(transfer::Column::ToStoreId.eq(store_id)),
            )
            .order_by_desc(transfer::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut result = Vec::with_capacity(transfers.len());
        for t in transfers {
            let history = self.history_of(t.id).await?;
            result.push(TransferWithHistory {
                transfer: t,
                history,
            });
        }
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn get_transfer(
        &self,
        transfer_id: Uuid,
    ) -> Result<TransferWithHistory, ServiceError> {
        let transfer = Transfers::find_by_id(transfer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("transfer {} not found", transfer_id))
            })?;
        let history = self.history_of(transfer_id).await?;
        Ok(TransferWithHistory { transfer, history })
    }

    async fn history_of(
        &self,
        transfer_id: Uuid,
    ) -> Result<Vec<transfer_event::Model>, ServiceError> {
        Ok(TransferEvents::find()
            .filter(transfer_event::Column::TransferId.eq(transfer_id))
            .order_by_asc(transfer_event::Column::Seq)
            .all(&*self.db)
            .await?)
    }
}
