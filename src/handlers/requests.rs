use crate::{
    commands::{
        requests::{ApproveRequestCommand, RejectRequestCommand, RevertRequestCommand},
        Command,
    },
    entities::donation_request::{self, RequestStatus},
    errors::ServiceError,
    services::requests::ActionResult,
    ApiResponse, AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionBody {
    /// Administrator making the decision
    pub actor_id: Uuid,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RequestFilters {
    /// Filter by lifecycle state: pending, approved or rejected
    pub status: Option<String>,
}

/// Create the requests router
pub fn requests_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests))
        .route("/:id", get(get_request))
        .route("/:id/approve", post(approve_request))
        .route("/:id/reject", post(reject_request))
        .route("/:id/revert", post(revert_request))
}

/// List donation requests with optional status filtering
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    params(RequestFilters),
    responses(
        (status = 200, description = "Request list returned"),
        (status = 400, description = "Invalid status filter", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Query(filters): Query<RequestFilters>,
) -> Result<Json<ApiResponse<Vec<donation_request::Model>>>, ServiceError> {
    let status = match filters.status.as_deref() {
        Some(raw) => Some(RequestStatus::from_str(raw).ok_or_else(|| {
            ServiceError::InvalidInput(format!("Unknown request status: {}", raw))
        })?),
        None => None,
    };

    let requests = state.services.requests.list_requests(status).await?;
    Ok(Json(ApiResponse::success(requests)))
}

/// Get a single donation request
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    responses(
        (status = 200, description = "Request returned"),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<donation_request::Model>>, ServiceError> {
    let request = state.services.requests.get_request(id).await?;
    Ok(Json(ApiResponse::success(request)))
}

/// Approve a pending request, allocating inventory
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/approve",
    request_body = DecisionBody,
    responses(
        (status = 200, description = "Request approved", body = ActionResult),
        (status = 400, description = "Request already decided", body = crate::errors::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<Json<ApiResponse<ActionResult>>, ServiceError> {
    let command = ApproveRequestCommand {
        request_id: id,
        actor_id: body.actor_id,
        comment: body.comment,
    };
    let result = command
        .execute(state.db.clone(), state.event_sender.clone())
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Reject a pending request
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/reject",
    request_body = DecisionBody,
    responses(
        (status = 200, description = "Request rejected", body = ActionResult),
        (status = 400, description = "Request already decided", body = crate::errors::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<Json<ApiResponse<ActionResult>>, ServiceError> {
    let command = RejectRequestCommand {
        request_id: id,
        actor_id: body.actor_id,
        comment: body.comment,
    };
    let result = command
        .execute(state.db.clone(), state.event_sender.clone())
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Return a decided request to pending. Inventory is not restored.
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/revert",
    responses(
        (status = 200, description = "Request reverted", body = ActionResult),
        (status = 400, description = "Request is not in a decided state", body = crate::errors::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn revert_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ActionResult>>, ServiceError> {
    let command = RevertRequestCommand { request_id: id };
    let result = command
        .execute(state.db.clone(), state.event_sender.clone())
        .await?;
    Ok(Json(ApiResponse::success(result)))
}
