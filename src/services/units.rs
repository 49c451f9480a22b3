use crate::{
    db::DbPool,
    entities::unit::{self, Entity as Unit},
    entities::unit_conversion::{self, Entity as UnitConversion},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::*;
use std::sync::Arc;
use tracing::debug;

/// Resolves multiplicative conversion factors between measurement units.
///
/// Only one direction is stored per unit pair; the inverse direction is
/// derived as `1 / factor`. Transitive conversion through a third unit is
/// deliberately not attempted.
pub struct UnitConversionService {
    db_pool: Arc<DbPool>,
}

impl UnitConversionService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Returns the factor such that
    /// `quantity_in_destination = quantity_in_origin * factor`, or `None`
    /// when no conversion is defined between the two units.
    ///
    /// `None` is a valid business outcome, not an error: callers decide
    /// whether to proceed unconverted.
    pub async fn resolve(
        &self,
        origin_unit_id: i64,
        destination_unit_id: i64,
    ) -> Result<Option<Decimal>, ServiceError> {
        if origin_unit_id == destination_unit_id {
            return Ok(Some(Decimal::ONE));
        }

        let db = self.db_pool.as_ref();

        let origin = Unit::find_by_id(origin_unit_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        let destination = Unit::find_by_id(destination_unit_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        let (origin, destination) = match (origin, destination) {
            (Some(o), Some(d)) => (o, d),
            _ => {
                debug!(
                    origin_unit_id,
                    destination_unit_id, "One or both units not found, no conversion"
                );
                return Ok(None);
            }
        };

        // Units from different magnitude groups are never convertible,
        // even if a row for the pair exists in the conversion table.
        if origin.magnitude_group != destination.magnitude_group {
            debug!(
                origin = %origin.code,
                destination = %destination.code,
                "Units belong to different magnitude groups, no conversion"
            );
            return Ok(None);
        }

        if let Some(direct) = self
            .find_conversion(origin_unit_id, destination_unit_id)
            .await?
        {
            return Ok(Some(direct.factor));
        }

        if let Some(inverse) = self
            .find_conversion(destination_unit_id, origin_unit_id)
            .await?
        {
            if inverse.factor.is_zero() {
                return Ok(None);
            }
            return Ok(Some(Decimal::ONE / inverse.factor));
        }

        Ok(None)
    }

    /// Converts a quantity between units. `None` when no conversion exists.
    pub async fn convert(
        &self,
        quantity: Decimal,
        origin_unit_id: i64,
        destination_unit_id: i64,
    ) -> Result<Option<Decimal>, ServiceError> {
        let factor = self.resolve(origin_unit_id, destination_unit_id).await?;
        Ok(factor.map(|f| quantity * f))
    }

    /// Looks up a unit by id, for display purposes.
    pub async fn get_unit(&self, unit_id: i64) -> Result<Option<unit::Model>, ServiceError> {
        Unit::find_by_id(unit_id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn find_conversion(
        &self,
        origin_unit_id: i64,
        destination_unit_id: i64,
    ) -> Result<Option<unit_conversion::Model>, ServiceError> {
        UnitConversion::find()
            .filter(unit_conversion::Column::OriginUnitId.eq(origin_unit_id))
            .filter(unit_conversion::Column::DestinationUnitId.eq(destination_unit_id))
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
