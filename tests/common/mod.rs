//! Shared helpers for in-process API tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::DateTime;
use serde_json::Value;
use tower::ServiceExt;

use regdesk_server::{
    api,
    config::AppConfig,
    error::{AppError, AppResult},
    models::checkout::{CheckoutSessionRequest, CustomerDetails, PaymentSession},
    periods::FixedClock,
    services::{
        admin::hash_password,
        store::{MemoryStore, SharedStore},
        stripe::PaymentProvider,
        Services,
    },
    AppState,
};

pub const ADMIN_PASSWORD: &str = "door-pass";

/// Wednesday evening, venue at UTC-5
pub const NOW: &str = "2025-02-05T19:00:00-05:00";

/// Payment provider stand-in with canned sessions
#[derive(Default)]
pub struct FakePayments {
    pub sessions: Vec<PaymentSession>,
    pub unavailable: bool,
    pub requests: Mutex<Vec<CheckoutSessionRequest>>,
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> AppResult<String> {
        if self.unavailable {
            return Err(AppError::Payment("No such price".to_string()));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok("https://checkout.stripe.com/c/pay/cs_test_new".to_string())
    }

    async fn list_completed_sessions(&self, _limit: u32) -> AppResult<Vec<PaymentSession>> {
        if self.unavailable {
            return Err(AppError::Payment("provider unreachable".to_string()));
        }
        Ok(self.sessions.clone())
    }
}

/// A completed single-visit session for "Ada Lovelace"
#[allow(dead_code)]
pub fn paid_session(id: &str, created: i64) -> PaymentSession {
    PaymentSession {
        id: id.to_string(),
        created,
        amount_total: Some(2500),
        customer_email: Some("ada@example.com".to_string()),
        customer_details: Some(CustomerDetails {
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
        }),
        metadata: [
            ("customerName".to_string(), "Ada Lovelace".to_string()),
            ("priceType".to_string(), "single".to_string()),
            ("source".to_string(), "main".to_string()),
        ]
        .into_iter()
        .collect(),
    }
}

pub struct TestApp {
    pub router: Router,
    #[allow(dead_code)]
    pub store: SharedStore,
    #[allow(dead_code)]
    pub payments: Arc<FakePayments>,
}

/// Admin login enabled with a private session secret
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.admin.password_hash = hash_password(ADMIN_PASSWORD).unwrap();
    config.admin.jwt_secret = "test-secret".to_string();
    config.stripe.price_single = "price_single".to_string();
    config.stripe.price_monthly = "price_monthly".to_string();
    config
}

/// Router over an in-memory store, fake payments and a frozen clock
pub fn create_test_app(payments: FakePayments) -> TestApp {
    create_test_app_with(payments, test_config())
}

#[allow(dead_code)]
pub fn create_test_app_with(payments: FakePayments, config: AppConfig) -> TestApp {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let payments = Arc::new(payments);
    let clock = Arc::new(FixedClock(DateTime::parse_from_rfc3339(NOW).unwrap()));
    let services = Services::new(&config, store.clone(), payments.clone(), clock);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    TestApp {
        router: api::create_router(state),
        store,
        payments,
    }
}

/// Send a request and decode the JSON body (Null when empty)
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Log in as admin and return the bearer token
pub async fn admin_token(router: &Router) -> String {
    let (status, body) = send(
        router,
        "POST",
        "/api/v1/admin/login",
        None,
        Some(serde_json::json!({ "password": ADMIN_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}
