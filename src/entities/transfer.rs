use std::fmt;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// Request to move quantity of one part between two distinct stores, driven
/// through approval/transit gates. Part name and image are snapshotted from
/// the catalog at creation time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub part_id: Uuid,
    pub part_name: String,
    pub part_image: Option<String>,
    pub from_store_id: i32,
    pub to_store_id: i32,
    pub quantity: i64,
    pub kind: TransferKind,
    pub status: TransferStatus,
    pub created_at: DateTimeUtc,
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Origin ships; stock is reserved out of the origin at approval and the
    /// destination is credited only once transit completes.
    #[sea_orm(string_value = "delivery")]
    Delivery,
    /// Destination collects at approval time; settled in the approval call.
    #[sea_orm(string_value = "pickup")]
    Pickup,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferKind::Delivery => write!(f, "delivery"),
            TransferKind::Pickup => write!(f, "pickup"),
        }
    }
}

/// `Approved` is a transient request target: a pending transfer advanced to
/// it settles in the same call as `Completed` (pickup) or `Picking`
/// (delivery), so it is never persisted.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "picking")]
    Picking,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStatus::Pending => write!(f, "pending"),
            TransferStatus::Approved => write!(f, "approved"),
            TransferStatus::Picking => write!(f, "picking"),
            TransferStatus::InTransit => write!(f, "in_transit"),
            TransferStatus::Completed => write!(f, "completed"),
            TransferStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transfer_event::Entity")]
    TransferEvents,
}

impl Related<super::transfer_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransferEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
