use crate::{
    db::DbPool,
    entities::{
        movement_detail::{self, Entity as MovementDetail, TransactionKind},
        movement_header::{self, Entity as MovementHeader},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::allocation::ProductAllocation,
};
use chrono::Utc;
use sea_orm::*;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Result of a ledger write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Nothing was delivered, so no ledger entry was written at all.
    Skipped,
    Recorded {
        header_id: i64,
        details_recorded: usize,
        details_failed: usize,
    },
}

/// Writes the append-only movement ledger: one header per approval event
/// and one detail row per product delivered.
pub struct LedgerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LedgerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records an approval movement. Skips entirely when nothing was
    /// delivered: a header with zero detail rows must never exist.
    ///
    /// A header insert failure aborts the whole operation. A detail insert
    /// failure is logged and does not roll back the header or the other
    /// details; the count of failures is reported to the caller.
    #[instrument(skip(self, allocations), fields(details = allocations.len()))]
    pub async fn record(
        &self,
        actor_id: Uuid,
        recipient_id: Uuid,
        note: Option<String>,
        detail_note: Option<String>,
        allocations: &[ProductAllocation],
    ) -> Result<RecordOutcome, ServiceError> {
        if allocations.is_empty() {
            info!("No deliveries, skipping ledger entry");
            return Ok(RecordOutcome::Skipped);
        }

        let db = self.db_pool.as_ref();

        let header = movement_header::ActiveModel {
            moved_at: Set(Utc::now()),
            actor_id: Set(actor_id),
            recipient_id: Set(recipient_id),
            status: Set("completed".to_string()),
            note: Set(note),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        let mut details_recorded = 0usize;
        let mut details_failed = 0usize;

        for allocation in allocations {
            let detail = movement_detail::ActiveModel {
                header_id: Set(header.id),
                product_id: Set(allocation.product_id),
                quantity: Set(allocation.delivered),
                transaction_kind: Set(TransactionKind::Egress.as_str().to_string()),
                unit_id: Set(allocation.unit_id),
                note: Set(detail_note.clone()),
                ..Default::default()
            };

            match detail.insert(db).await {
                Ok(_) => details_recorded += 1,
                Err(e) => {
                    details_failed += 1;
                    error!(
                        header_id = header.id,
                        product_id = allocation.product_id,
                        error = %e,
                        "Failed to record movement detail"
                    );
                }
            }
        }

        if let Err(e) = self
            .event_sender
            .send(Event::MovementRecorded {
                header_id: header.id,
                detail_count: details_recorded,
            })
            .await
        {
            warn!("Failed to send movement event: {}", e);
        }

        info!(
            header_id = header.id,
            details_recorded, details_failed, "Movement ledger entry recorded"
        );

        Ok(RecordOutcome::Recorded {
            header_id: header.id,
            details_recorded,
            details_failed,
        })
    }

    /// Returns ledger headers, newest first.
    pub async fn list_headers(&self) -> Result<Vec<movement_header::Model>, ServiceError> {
        MovementHeader::find()
            .order_by_desc(movement_header::Column::MovedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Returns the detail rows under one header.
    pub async fn list_details(
        &self,
        header_id: i64,
    ) -> Result<Vec<movement_detail::Model>, ServiceError> {
        MovementDetail::find()
            .filter(movement_detail::Column::HeaderId.eq(header_id))
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
