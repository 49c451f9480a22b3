use crate::{
    commands::{requests::request_service, Command},
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::requests::ActionResult,
};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref REQUEST_REVERTS: IntCounter = IntCounter::new(
        "request_reverts_total",
        "Total number of requests returned to pending"
    )
    .expect("metric can be created");
}

/// Returns a decided request to pending. Inventory already deducted is
/// not restored.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RevertRequestCommand {
    pub request_id: Uuid,
}

#[async_trait::async_trait]
impl Command for RevertRequestCommand {
    type Result = ActionResult;

    #[instrument(skip(self, db_pool, event_sender), fields(request_id = %self.request_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let service = request_service(db_pool, event_sender);
        let result = service.revert(self.request_id).await?;
        REQUEST_REVERTS.inc();
        Ok(result)
    }
}
