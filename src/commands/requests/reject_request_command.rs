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
    static ref REQUEST_REJECTIONS: IntCounter = IntCounter::new(
        "request_rejections_total",
        "Total number of rejected donation requests"
    )
    .expect("metric can be created");
    static ref REQUEST_REJECTION_FAILURES: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            "request_rejection_failures_total",
            "Total number of failed request rejections"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

/// Rejects a pending request. No inventory interaction takes place.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RejectRequestCommand {
    pub request_id: Uuid,
    /// Administrator performing the rejection
    pub actor_id: Uuid,
    #[validate(length(max = 500))]
    pub comment: Option<String>,
}

#[async_trait::async_trait]
impl Command for RejectRequestCommand {
    type Result = ActionResult;

    #[instrument(skip(self, db_pool, event_sender), fields(request_id = %self.request_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            REQUEST_REJECTION_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;

        let service = request_service(db_pool, event_sender);
        let result = service
            .reject(self.request_id, self.actor_id, self.comment.clone())
            .await
            .map_err(|e| {
                REQUEST_REJECTION_FAILURES
                    .with_label_values(&["service_error"])
                    .inc();
                e
            })?;

        REQUEST_REJECTIONS.inc();
        Ok(result)
    }
}
