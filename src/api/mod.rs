//! API handlers for Regdesk REST endpoints

pub mod admin;
pub mod checkin;
pub mod checkout;
pub mod health;
pub mod history;
pub mod openapi;
pub mod registrations;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::admin::AdminClaims, AppState};

/// Extractor for an authenticated admin session
pub struct AdminUser(pub AdminClaims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Authentication("Missing bearer token".to_string()))?;

        let claims = state.services.admin.verify_token(bearer.token())?;
        Ok(AdminUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Public registration
        .route("/checkout", post(checkout::create_checkout_session))
        .route("/register", post(registrations::create_registration))
        // Admin
        .route("/admin/login", post(admin::login))
        .route("/admin/debug", get(admin::debug))
        .route("/checkin", post(checkin::update_checkin))
        .route("/registrations", get(registrations::list_registrations))
        .route("/history", get(history::get_history))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
