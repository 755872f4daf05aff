//! Check-in endpoint

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::checkin::{CheckinRequest, CheckinResponse},
    AppState,
};

use super::AdminUser;

/// Check a registration in or out for the current period
#[utoipa::path(
    post,
    path = "/checkin",
    tag = "checkin",
    security(("bearer_auth" = [])),
    request_body = CheckinRequest,
    responses(
        (status = 200, description = "Resulting check-in state", body = CheckinResponse),
        (status = 400, description = "Missing session ID or invalid action", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_checkin(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Json(request): Json<CheckinRequest>,
) -> AppResult<Json<CheckinResponse>> {
    let response = state.services.checkin.update(request).await?;
    Ok(Json(response))
}
