//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, checkin, checkout, health, history, registrations};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Regdesk API",
        version = "1.0.0",
        description = "Event registration and check-in REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Registration
        checkout::create_checkout_session,
        registrations::create_registration,
        // Check-in
        registrations::list_registrations,
        checkin::update_checkin,
        history::get_history,
        // Admin
        admin::login,
        admin::debug,
    ),
    components(
        schemas(
            // Registration
            crate::models::registration::Category,
            crate::models::registration::PaymentTier,
            crate::models::registration::VisitOrdinal,
            crate::models::registration::Registration,
            crate::models::registration::RegistrationStatus,
            crate::models::registration::CreateRegistration,
            crate::models::registration::CreateRegistrationResponse,
            crate::models::registration::RegistrationsResponse,
            crate::models::checkout::CreateCheckoutSession,
            crate::models::checkout::CheckoutResponse,
            // Check-in
            crate::models::checkin::CheckinRecord,
            crate::models::checkin::CheckinAction,
            crate::models::checkin::RegistrationSnapshot,
            crate::models::checkin::CheckinRequest,
            crate::models::checkin::CheckinResponse,
            crate::models::checkin::HistoryEntry,
            // History
            crate::models::history::GuestStats,
            crate::models::history::DayStats,
            crate::models::history::DayDetail,
            crate::models::history::DaySummary,
            crate::models::history::HistoryListing,
            crate::models::history::HistoryResponse,
            // Admin
            crate::models::admin::LoginRequest,
            crate::models::admin::TokenResponse,
            crate::models::admin::KeyInventory,
            crate::models::admin::StoredRecord,
            crate::models::admin::StoreDiagnostics,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "registration", description = "Paid checkout and free registration"),
        (name = "checkin", description = "Door check-in and attendance history"),
        (name = "admin", description = "Admin session and diagnostics")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by admin paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
