use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-part, per-store quantity ledger entry. `quantity >= 0` is enforced by
/// the guarded updates in the ledger service, never by read-side clamping.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub part_id: Uuid,
    pub store_id: i32,
    pub label: String,
    pub quantity: i64,
    pub sub_location: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::PartId",
        to = "super::part::Column::Id"
    )]
    Part,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
