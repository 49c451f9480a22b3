use crate::{
    commands::{requests::request_service, Command},
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::requests::ActionResult,
};
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref REQUEST_APPROVALS: IntCounter = IntCounter::new(
        "request_approvals_total",
        "Total number of approved donation requests"
    )
    .expect("metric can be created");
    static ref REQUEST_APPROVAL_FAILURES: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            "request_approval_failures_total",
            "Total number of failed request approvals"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

/// Approves a pending request, allocating inventory and recording the
/// movement ledger.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ApproveRequestCommand {
    pub request_id: Uuid,
    /// Administrator performing the approval
    pub actor_id: Uuid,
    #[validate(length(max = 500))]
    pub comment: Option<String>,
}

#[async_trait::async_trait]
impl Command for ApproveRequestCommand {
    type Result = ActionResult;

    #[instrument(skip(self, db_pool, event_sender), fields(request_id = %self.request_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            REQUEST_APPROVAL_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;

        let service = request_service(db_pool, event_sender);
        let result = service
            .approve(self.request_id, self.actor_id, self.comment.clone())
            .await
            .map_err(|e| {
                REQUEST_APPROVAL_FAILURES
                    .with_label_values(&["service_error"])
                    .inc();
                e
            })?;

        REQUEST_APPROVALS.inc();
        Ok(result)
    }
}
