use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One approval event in the movement ledger. Append-only; a header is
/// never written without at least one intended detail row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movement_headers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub moved_at: DateTime<Utc>,
    /// Administrator who approved the request
    pub actor_id: Uuid,
    /// Beneficiary who received the goods
    pub recipient_id: Uuid,
    pub status: String,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
