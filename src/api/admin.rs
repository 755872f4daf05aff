//! Admin session and diagnostics endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::admin::{LoginRequest, StoreDiagnostics, TokenResponse},
    AppState,
};

use super::AdminUser;

/// Exchange the admin password for a bearer token
#[utoipa::path(
    post,
    path = "/admin/login",
    tag = "admin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token", body = TokenResponse),
        (status = 401, description = "Invalid password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let session = state.services.admin.login(&request.password)?;
    Ok(Json(session))
}

/// Store connectivity and key inventory
#[utoipa::path(
    get,
    path = "/admin/debug",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Store report", body = StoreDiagnostics),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    )
)]
pub async fn debug(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
) -> AppResult<Json<StoreDiagnostics>> {
    let report = state.services.admin.diagnostics().await?;
    Ok(Json(report))
}
