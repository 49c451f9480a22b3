use crate::{
    entities::{movement_detail, movement_header},
    errors::ServiceError,
    ApiResponse, AppState,
};
use axum::{
    extract::{Json, Path, State},
    routing::get,
    Router,
};

/// Create the movement ledger router
pub fn ledger_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_movements))
        .route("/:id/details", get(get_movement_details))
}

/// List movement ledger headers, newest first
#[utoipa::path(
    get,
    path = "/api/v1/movements",
    responses(
        (status = 200, description = "Movement headers returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<movement_header::Model>>>, ServiceError> {
    let headers = state.services.ledger.list_headers().await?;
    Ok(Json(ApiResponse::success(headers)))
}

/// List the detail rows under one movement header
#[utoipa::path(
    get,
    path = "/api/v1/movements/{id}/details",
    responses(
        (status = 200, description = "Movement details returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn get_movement_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<movement_detail::Model>>>, ServiceError> {
    let details = state.services.ledger.list_details(id).await?;
    Ok(Json(ApiResponse::success(details)))
}
