use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of an inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Egress,
    Ingress,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Egress => "egress",
            TransactionKind::Ingress => "ingress",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "egress" => Some(TransactionKind::Egress),
            "ingress" => Some(TransactionKind::Ingress),
            _ => None,
        }
    }
}

/// One product line under a movement header.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movement_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub header_id: i64,
    pub product_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    pub transaction_kind: String, // Storing as string in DB, but will convert to/from enum
    pub unit_id: Option<i64>,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
