use crate::{
    db::DbPool,
    entities::donation_request::{self, Entity as DonationRequest, RequestStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        allocation::{AllocationOutcome, AllocationResult, AllocationService},
        ledger::{LedgerService, RecordOutcome},
        notifications::{
            Notification, NotificationCategory, NotificationSeverity, Notifier,
        },
        units::UnitConversionService,
    },
};
use chrono::Utc;
use sea_orm::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Uniform result of an administrative action on a request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Orchestrates the request lifecycle: approval (with inventory
/// allocation and ledger recording), rejection, and revert to pending.
pub struct RequestService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    allocation: Arc<AllocationService>,
    ledger: Arc<LedgerService>,
    units: Arc<UnitConversionService>,
    notifier: Arc<dyn Notifier>,
}

impl RequestService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        allocation: Arc<AllocationService>,
        ledger: Arc<LedgerService>,
        units: Arc<UnitConversionService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            allocation,
            ledger,
            units,
            notifier,
        }
    }

    pub async fn get_request(
        &self,
        request_id: Uuid,
    ) -> Result<donation_request::Model, ServiceError> {
        DonationRequest::find_by_id(request_id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {} not found", request_id)))
    }

    /// Lists requests, optionally filtered by status, newest first.
    pub async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<donation_request::Model>, ServiceError> {
        let mut query =
            DonationRequest::find().order_by_desc(donation_request::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(donation_request::Column::Status.eq(status.as_str()));
        }
        query
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Approves a pending request, allocating inventory and recording the
    /// movement ledger.
    ///
    /// Allocation failures never block the approval itself: the request
    /// still transitions to approved and the inventory outcome is reported
    /// as a warning.
    #[instrument(skip(self, comment), fields(request_id = %request_id))]
    pub async fn approve(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        comment: Option<String>,
    ) -> Result<ActionResult, ServiceError> {
        let request = self.get_request(request_id).await?;
        self.ensure_pending(&request)?;

        let allocation = match self.allocation.allocate(&request).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Allocation failed, approving without inventory update");
                AllocationResult::error(request.quantity)
            }
        };

        if !allocation.allocations.is_empty() {
            let note = Some(format!(
                "Delivery for approved request - {} ({} requested)",
                request.food_type,
                request.quantity.normalize()
            ));
            let detail_note = Some(format!(
                "Delivery for approved request - {}",
                request.food_type
            ));
            match self
                .ledger
                .record(
                    actor_id,
                    request.beneficiary_id,
                    note,
                    detail_note,
                    &allocation.allocations,
                )
                .await
            {
                Ok(RecordOutcome::Recorded { details_failed, .. }) if details_failed > 0 => {
                    warn!(details_failed, "Some ledger details were not recorded");
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Failed to record movement ledger");
                }
            }
        }

        let updated = self
            .transition(request, RequestStatus::Approved, comment, Some(Utc::now()))
            .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::RequestApproved {
                request_id: updated.id,
                beneficiary_id: updated.beneficiary_id,
                outcome: allocation.outcome.as_str().to_string(),
                delivered: allocation.delivered,
            })
            .await
        {
            warn!("Failed to send approval event: {}", e);
        }
        if allocation.outcome == AllocationOutcome::Partial {
            if let Err(e) = self
                .event_sender
                .send(Event::PartialAllocationWarning {
                    request_id: updated.id,
                    required: allocation.requested,
                    delivered: allocation.delivered,
                })
                .await
            {
                warn!("Failed to send partial allocation event: {}", e);
            }
        }
        for product in &allocation.allocations {
            if let Err(e) = self
                .event_sender
                .send(Event::InventoryDepleted {
                    request_id: updated.id,
                    product_id: product.product_id,
                    quantity: product.delivered,
                    batches_touched: product.batches_touched,
                })
                .await
            {
                warn!("Failed to send depletion event: {}", e);
            }
        }

        let (message, warning) = self.summarize(&updated, &allocation).await;

        self.notify(
            updated.beneficiary_id,
            "Request approved",
            &message,
            match allocation.outcome {
                AllocationOutcome::Fulfilled => NotificationSeverity::Success,
                _ => NotificationSeverity::Warning,
            },
        )
        .await;

        info!(outcome = allocation.outcome.as_str(), "Request approved");
        Ok(ActionResult {
            success: true,
            message,
            warning,
        })
    }

    /// Rejects a pending request. No inventory interaction.
    #[instrument(skip(self, comment), fields(request_id = %request_id))]
    pub async fn reject(
        &self,
        request_id: Uuid,
        _actor_id: Uuid,
        comment: Option<String>,
    ) -> Result<ActionResult, ServiceError> {
        let request = self.get_request(request_id).await?;
        self.ensure_pending(&request)?;

        let comment = normalize_comment(comment);
        let updated = self
            .transition(request, RequestStatus::Rejected, comment.clone(), Some(Utc::now()))
            .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::RequestRejected {
                request_id: updated.id,
                beneficiary_id: updated.beneficiary_id,
            })
            .await
        {
            warn!("Failed to send rejection event: {}", e);
        }

        let body = match &comment {
            Some(comment) => format!(
                "Your request was rejected. Administrator comment: {}",
                comment
            ),
            None => "Your donation request was rejected.".to_string(),
        };
        self.notify(
            updated.beneficiary_id,
            "Request rejected",
            &body,
            NotificationSeverity::Info,
        )
        .await;

        info!("Request rejected");
        Ok(ActionResult {
            success: true,
            message: "Request rejected.".to_string(),
            warning: None,
        })
    }

    /// Returns an approved or rejected request to pending, clearing the
    /// response timestamp. Inventory already deducted is NOT restored.
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn revert(&self, request_id: Uuid) -> Result<ActionResult, ServiceError> {
        let request = self.get_request(request_id).await?;
        match request.status() {
            Some(RequestStatus::Approved) | Some(RequestStatus::Rejected) => {}
            _ => {
                return Err(ServiceError::InvalidOperation(format!(
                    "Request {} is not in a decided state",
                    request_id
                )))
            }
        }

        let mut active: donation_request::ActiveModel = request.into();
        active.status = Set(RequestStatus::Pending.as_str().to_string());
        active.responded_at = Set(None);
        let updated = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        if let Err(e) = self
            .event_sender
            .send(Event::RequestReverted {
                request_id: updated.id,
            })
            .await
        {
            warn!("Failed to send revert event: {}", e);
        }

        info!("Request reverted to pending");
        Ok(ActionResult {
            success: true,
            message: "Request returned to pending. Inventory already deducted is not restored."
                .to_string(),
            warning: None,
        })
    }

    fn ensure_pending(&self, request: &donation_request::Model) -> Result<(), ServiceError> {
        match request.status() {
            Some(RequestStatus::Pending) => Ok(()),
            _ => Err(ServiceError::InvalidOperation(format!(
                "Request {} has already been decided",
                request.id
            ))),
        }
    }

    async fn transition(
        &self,
        request: donation_request::Model,
        status: RequestStatus,
        comment: Option<String>,
        responded_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<donation_request::Model, ServiceError> {
        let mut active: donation_request::ActiveModel = request.into();
        active.status = Set(status.as_str().to_string());
        active.admin_comment = Set(normalize_comment(comment));
        active.responded_at = Set(responded_at);
        active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Builds the user-facing summary and warning for an approval.
    async fn summarize(
        &self,
        request: &donation_request::Model,
        allocation: &AllocationResult,
    ) -> (String, Option<String>) {
        let unit_label = match request.unit_id {
            Some(unit_id) => match self.units.get_unit(unit_id).await {
                Ok(Some(unit)) => format!(" {}", unit.code),
                Ok(None) => String::new(),
                Err(e) => {
                    warn!(error = %e, "Failed to look up request unit for summary");
                    String::new()
                }
            },
            None => String::new(),
        };

        let mut warning = None;
        let message = match allocation.outcome {
            AllocationOutcome::Error => {
                warning = Some("Inventory could not be updated.".to_string());
                "Request approved, but inventory could not be updated.".to_string()
            }
            AllocationOutcome::NoStock => {
                warning = Some("No stock available.".to_string());
                "Request approved. No stock is available for the requested products.".to_string()
            }
            AllocationOutcome::Partial => {
                warning = Some(format!(
                    "{}{} could not be covered with current stock.",
                    allocation.remaining.normalize(),
                    unit_label
                ));
                format!(
                    "Request approved. Delivered {} of {}{}.",
                    allocation.delivered.normalize(),
                    allocation.requested.normalize(),
                    unit_label
                )
            }
            AllocationOutcome::Fulfilled => {
                "Request approved and inventory updated.".to_string()
            }
        };

        if allocation.conversion_warning {
            let note = "No unit conversion was defined; quantities were applied without conversion.";
            warning = Some(match warning {
                Some(existing) => format!("{} {}", existing, note),
                None => note.to_string(),
            });
        }

        (message, warning)
    }

    /// Fire-and-forget notification; failures are logged, never propagated.
    async fn notify(
        &self,
        recipient_id: Uuid,
        title: &str,
        body: &str,
        severity: NotificationSeverity,
    ) {
        let notification = Notification {
            recipient_id,
            title: title.to_string(),
            body: body.to_string(),
            category: NotificationCategory::RequestDecision,
            severity,
            action_url: Some("/requests".to_string()),
            metadata: None,
            created_at: Utc::now(),
        };
        if let Err(e) = self.notifier.send(notification).await {
            warn!(error = %e, "Failed to deliver notification");
        }
    }
}

/// Trims an administrator comment and drops it entirely when blank.
fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comments_are_dropped() {
        assert_eq!(normalize_comment(None), None);
        assert_eq!(normalize_comment(Some("   ".to_string())), None);
        assert_eq!(
            normalize_comment(Some("  ok  ".to_string())),
            Some("ok".to_string())
        );
    }
}
