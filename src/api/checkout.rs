//! Paid checkout endpoint

use axum::{
    extract::State,
    http::{header::ORIGIN, HeaderMap},
    Json,
};

use crate::{
    error::AppResult,
    models::checkout::{CheckoutResponse, CreateCheckoutSession},
    AppState,
};

/// Start a paid registration; the client redirects to the returned URL
#[utoipa::path(
    post,
    path = "/checkout",
    tag = "registration",
    request_body = CreateCheckoutSession,
    responses(
        (status = 200, description = "Hosted payment page", body = CheckoutResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 500, description = "Payment provider error", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(data): Json<CreateCheckoutSession>,
) -> AppResult<Json<CheckoutResponse>> {
    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    let url = state.services.registrations.start_checkout(data, origin).await?;
    Ok(Json(CheckoutResponse { url }))
}
