use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A measurement unit. Reference data, immutable at runtime.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "units")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Short code, e.g. "kg", "g", "l"
    pub code: String,
    pub name: String,
    /// Units are only convertible within the same magnitude group
    /// (e.g. "mass", "volume").
    pub magnitude_group: String,
    /// Marks the canonical base unit of its magnitude group
    pub is_base: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
