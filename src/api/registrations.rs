//! Registration endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::registration::{
        CreateRegistration, CreateRegistrationResponse, RegistrationQuery, RegistrationsResponse,
    },
    AppState,
};

use super::AdminUser;

/// Register a guest or apprentice (no payment)
#[utoipa::path(
    post,
    path = "/register",
    tag = "registration",
    request_body = CreateRegistration,
    responses(
        (status = 200, description = "Registration stored", body = CreateRegistrationResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_registration(
    State(state): State<AppState>,
    Json(data): Json<CreateRegistration>,
) -> AppResult<Json<CreateRegistrationResponse>> {
    let registration = state.services.registrations.create_free(data).await?;
    Ok(Json(CreateRegistrationResponse {
        success: true,
        id: registration.id,
    }))
}

/// List paid and free registrations with their check-in state
#[utoipa::path(
    get,
    path = "/registrations",
    tag = "checkin",
    security(("bearer_auth" = [])),
    params(RegistrationQuery),
    responses(
        (status = 200, description = "Registrations, newest first", body = RegistrationsResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_registrations(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Query(query): Query<RegistrationQuery>,
) -> AppResult<Json<RegistrationsResponse>> {
    let registrations = state.services.registrations.list(&query).await?;
    Ok(Json(RegistrationsResponse { registrations }))
}
