use crate::{
    db::DbPool,
    entities::{
        donation_request,
        inventory_batch::{self, Entity as InventoryBatch},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
    services::units::UnitConversionService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Business result of an allocation attempt, distinct from technical
/// success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AllocationOutcome {
    Fulfilled,
    Partial,
    NoStock,
    Error,
}

impl AllocationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationOutcome::Fulfilled => "fulfilled",
            AllocationOutcome::Partial => "partial",
            AllocationOutcome::NoStock => "no-stock",
            AllocationOutcome::Error => "error",
        }
    }
}

/// One successful batch decrement.
#[derive(Debug, Clone)]
pub struct BatchDelivery {
    pub batch_id: i64,
    pub location_id: i64,
    pub taken: Decimal,
}

/// Result of depleting an ordered list of batches for one product.
/// Quantities are in the product's inventory unit.
#[derive(Debug, Clone)]
pub struct DepletionOutcome {
    pub delivered: Decimal,
    pub remaining: Decimal,
    /// Batches whose decrement persisted
    pub batches_touched: u32,
    /// Batches the loop tried, including ones whose persistence failed
    pub batches_attempted: u32,
    pub per_batch: Vec<BatchDelivery>,
}

/// Quantity delivered from one product, in that product's unit.
#[derive(Debug, Clone)]
pub struct ProductAllocation {
    pub product_id: i64,
    pub product_name: String,
    pub unit_id: Option<i64>,
    pub delivered: Decimal,
    pub batches_touched: u32,
}

/// End-to-end result of allocating inventory for one request.
/// `requested`, `delivered` and `remaining` are in the request's unit
/// where a conversion exists, otherwise best-effort in inventory units.
#[derive(Debug, Clone)]
pub struct AllocationResult {
    pub outcome: AllocationOutcome,
    pub requested: Decimal,
    pub delivered: Decimal,
    pub remaining: Decimal,
    /// Set when a unit conversion was missing and quantities were used
    /// untransformed
    pub conversion_warning: bool,
    pub batches_touched: u32,
    pub batches_attempted: u32,
    pub allocations: Vec<ProductAllocation>,
}

impl AllocationResult {
    /// Result used when allocation aborted with an unexpected failure.
    /// The approval itself still goes through; only the inventory outcome
    /// is flagged.
    pub fn error(requested: Decimal) -> Self {
        Self {
            outcome: AllocationOutcome::Error,
            requested,
            delivered: Decimal::ZERO,
            remaining: requested,
            conversion_warning: false,
            batches_touched: 0,
            batches_attempted: 0,
            allocations: Vec::new(),
        }
    }

    fn no_stock(requested: Decimal) -> Self {
        Self {
            outcome: AllocationOutcome::NoStock,
            requested,
            delivered: Decimal::ZERO,
            remaining: requested,
            conversion_warning: false,
            batches_touched: 0,
            batches_attempted: 0,
            allocations: Vec::new(),
        }
    }
}

fn classify(delivered: Decimal, remaining: Decimal) -> AllocationOutcome {
    if delivered <= Decimal::ZERO {
        AllocationOutcome::NoStock
    } else if remaining <= Decimal::ZERO {
        AllocationOutcome::Fulfilled
    } else {
        AllocationOutcome::Partial
    }
}

/// Locates stock, converts units and depletes batches for approved
/// requests.
pub struct AllocationService {
    db_pool: Arc<DbPool>,
    units: Arc<UnitConversionService>,
}

impl AllocationService {
    pub fn new(db_pool: Arc<DbPool>, units: Arc<UnitConversionService>) -> Self {
        Self { db_pool, units }
    }

    /// Allocates inventory for a request, depleting matching batches in
    /// order and accumulating per-product deliveries.
    ///
    /// The unmet remainder is carried between products in the request's
    /// unit and converted per product, so products measured in different
    /// units are each depleted against the correct quantity.
    #[instrument(skip(self, request), fields(request_id = %request.id))]
    pub async fn allocate(
        &self,
        request: &donation_request::Model,
    ) -> Result<AllocationResult, ServiceError> {
        let products = self.match_products(&request.food_type).await?;
        if products.is_empty() {
            info!(food_type = %request.food_type, "No products match the request");
            return Ok(AllocationResult::no_stock(request.quantity));
        }

        let mut remaining = request.quantity;
        let mut conversion_warning = false;
        let mut batches_touched = 0u32;
        let mut batches_attempted = 0u32;
        let mut allocations = Vec::new();

        for prod in products {
            if remaining <= Decimal::ZERO {
                break;
            }

            // Factor from request units to this product's inventory units.
            // A missing conversion never blocks the approval; quantities
            // are used untransformed and the caller is warned.
            let factor = match (request.unit_id, prod.unit_id) {
                (Some(origin), Some(destination)) => {
                    match self.units.resolve(origin, destination).await? {
                        Some(f) => f,
                        None => {
                            warn!(
                                product_id = prod.id,
                                origin, destination, "No unit conversion, using raw quantity"
                            );
                            conversion_warning = true;
                            Decimal::ONE
                        }
                    }
                }
                (None, None) => Decimal::ONE,
                _ => {
                    conversion_warning = true;
                    Decimal::ONE
                }
            };

            let required = remaining * factor;
            let batches = self.find_batches(prod.id).await?;
            if batches.is_empty() {
                continue;
            }

            let depletion = self.deplete_batches(required, &batches).await;
            batches_touched += depletion.batches_touched;
            batches_attempted += depletion.batches_attempted;

            if depletion.delivered > Decimal::ZERO {
                allocations.push(ProductAllocation {
                    product_id: prod.id,
                    product_name: prod.name.clone(),
                    unit_id: prod.unit_id,
                    delivered: depletion.delivered,
                    batches_touched: depletion.batches_touched,
                });
            }

            // Convert the unmet remainder back to request units for the
            // next product. A zero factor cannot occur for stored
            // conversions but is guarded to avoid division by zero.
            remaining = if factor.is_zero() {
                remaining
            } else {
                depletion.remaining / factor
            };
        }

        if remaining < Decimal::ZERO {
            remaining = Decimal::ZERO;
        }
        let delivered = request.quantity - remaining;
        let outcome = classify(delivered, remaining);

        info!(
            outcome = outcome.as_str(),
            %delivered,
            %remaining,
            batches_touched,
            batches_attempted,
            "Allocation completed"
        );

        Ok(AllocationResult {
            outcome,
            requested: request.quantity,
            delivered,
            remaining,
            conversion_warning,
            batches_touched,
            batches_attempted,
            allocations,
        })
    }

    /// Matches products by case-insensitive substring against the name.
    pub async fn match_products(
        &self,
        food_type: &str,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let needle = format!("%{}%", food_type.trim().to_lowercase());
        Product::find()
            .filter(Expr::expr(Func::lower(Expr::col(product::Column::Name))).like(needle))
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Returns batches with stock for a product, oldest-updated first.
    /// An empty result is not an error.
    pub async fn find_batches(
        &self,
        product_id: i64,
    ) -> Result<Vec<inventory_batch::Model>, ServiceError> {
        InventoryBatch::find()
            .filter(inventory_batch::Column::ProductId.eq(product_id))
            .filter(inventory_batch::Column::QuantityAvailable.gt(Decimal::ZERO))
            .order_by_asc(inventory_batch::Column::UpdatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Depletes batches in order until `required` is met or the list is
    /// exhausted. A batch whose decrement fails to persist is logged and
    /// skipped; the loop continues with the next batch.
    pub async fn deplete_batches(
        &self,
        required: Decimal,
        batches: &[inventory_batch::Model],
    ) -> DepletionOutcome {
        let db = self.db_pool.as_ref();
        let mut delivered = Decimal::ZERO;
        let mut remaining = required;
        let mut batches_touched = 0u32;
        let mut batches_attempted = 0u32;
        let mut per_batch = Vec::new();

        for batch in batches {
            if remaining <= Decimal::ZERO {
                break;
            }
            batches_attempted += 1;

            let mut available = batch.quantity_available;
            let mut retried = false;
            loop {
                let take = remaining.min(available);
                if take <= Decimal::ZERO {
                    break;
                }

                match self.try_decrement(db, batch.id, take).await {
                    Ok(true) => {
                        delivered += take;
                        remaining -= take;
                        batches_touched += 1;
                        per_batch.push(BatchDelivery {
                            batch_id: batch.id,
                            location_id: batch.location_id,
                            taken: take,
                        });
                        debug!(batch_id = batch.id, %take, "Batch depleted");
                        break;
                    }
                    Ok(false) if !retried => {
                        // The conditional update matched no rows: a
                        // concurrent writer changed the quantity. Re-read
                        // once and retry with the fresh value.
                        retried = true;
                        match InventoryBatch::find_by_id(batch.id).one(db).await {
                            Ok(Some(fresh)) => available = fresh.quantity_available,
                            Ok(None) => {
                                warn!(batch_id = batch.id, "Batch gone during depletion, skipping");
                                break;
                            }
                            Err(e) => {
                                warn!(
                                    batch_id = batch.id,
                                    error = %e,
                                    "Failed to re-read batch, skipping"
                                );
                                break;
                            }
                        }
                    }
                    Ok(false) => {
                        warn!(
                            batch_id = batch.id,
                            "Conditional decrement failed after retry, skipping batch"
                        );
                        break;
                    }
                    Err(e) => {
                        warn!(
                            batch_id = batch.id,
                            error = %e,
                            "Failed to persist batch decrement, skipping batch"
                        );
                        break;
                    }
                }
            }
        }

        DepletionOutcome {
            delivered,
            remaining,
            batches_touched,
            batches_attempted,
            per_batch,
        }
    }

    /// Decrements a batch only if it still holds at least `take`.
    /// Returns whether a row was updated. Never produces negative stock.
    async fn try_decrement(
        &self,
        db: &DatabaseConnection,
        batch_id: i64,
        take: Decimal,
    ) -> Result<bool, DbErr> {
        let result = InventoryBatch::update_many()
            .col_expr(
                inventory_batch::Column::QuantityAvailable,
                Expr::col(inventory_batch::Column::QuantityAvailable).sub(take),
            )
            .col_expr(inventory_batch::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(inventory_batch::Column::Id.eq(batch_id))
            .filter(inventory_batch::Column::QuantityAvailable.gte(take))
            .exec(db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn classify_no_delivery_is_no_stock() {
        assert_eq!(classify(dec!(0), dec!(10)), AllocationOutcome::NoStock);
    }

    #[test]
    fn classify_zero_remaining_is_fulfilled() {
        assert_eq!(classify(dec!(10), dec!(0)), AllocationOutcome::Fulfilled);
    }

    #[test]
    fn classify_partial_delivery() {
        assert_eq!(classify(dec!(7), dec!(3)), AllocationOutcome::Partial);
    }

    #[test]
    fn error_result_keeps_requested_quantity() {
        let result = AllocationResult::error(dec!(5));
        assert_eq!(result.outcome, AllocationOutcome::Error);
        assert_eq!(result.remaining, dec!(5));
        assert_eq!(result.delivered, dec!(0));
        assert!(result.allocations.is_empty());
    }
}
