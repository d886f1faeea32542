use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Domain events emitted after a mutation commits. Consumed in-process by
/// `process_events`; delivery is best-effort and never blocks the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    PartCreated(Uuid),
    SaleCreated(Uuid),
    SaleFinalized {
        sale_id: Uuid,
        store_id: i32,
    },
    TransferRequested(Uuid),
    TransferAdvanced {
        transfer_id: Uuid,
        old_status: String,
        new_status: String,
    },
    StockDebited {
        part_id: Uuid,
        store_id: i32,
        quantity: i64,
    },
    StockCredited {
        part_id: Uuid,
        store_id: i32,
        quantity: i64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("failed to send event: {}", e)))
    }
}

/// Drains the event channel, logging each event. Spawned once at startup.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(event = ?event, "domain event");
    }
}
