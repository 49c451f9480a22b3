use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A stored conversion between two units:
/// `quantity_in_destination = quantity_in_origin * factor`.
///
/// Only one direction is stored per pair; the inverse is derived as
/// `1 / factor` at lookup time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "unit_conversions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub origin_unit_id: i64,
    pub destination_unit_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))")]
    pub factor: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
