//! Payment provider client (Stripe Checkout).
//!
//! Handles:
//! - Creating hosted checkout sessions for paid tickets
//! - Listing completed sessions so paid registrations need no local copy

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::StripeConfig,
    error::{AppError, AppResult},
    models::checkout::{CheckoutSessionRequest, PaymentSession},
};

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Open a hosted payment page and return its URL
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> AppResult<String>;

    /// Most recent completed sessions, newest first
    async fn list_completed_sessions(&self, limit: u32) -> AppResult<Vec<PaymentSession>>;
}

pub type SharedPayments = Arc<dyn PaymentProvider>;

/// Stripe REST client
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct CreatedSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionList {
    data: Vec<PaymentSession>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        }
    }

    /// Stripe expects nested parameters in bracket notation
    fn session_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("mode".to_string(), "payment".to_string()),
            ("customer_email".to_string(), request.customer_email.clone()),
            ("line_items[0][price]".to_string(), request.price_id.clone()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];
        form.extend(
            request
                .metadata
                .iter()
                .map(|(key, value)| (format!("metadata[{}]", key), value.clone())),
        );
        form
    }

    async fn check_response_json<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("Stripe returned {}", status));
            return Err(AppError::Payment(message));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Payment(format!("Failed to parse Stripe response: {}", e)))
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> AppResult<String> {
        let response = self
            .http
            .post(format!("{}/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&Self::session_form(request))
            .send()
            .await
            .map_err(|e| AppError::Payment(e.to_string()))?;

        let session: CreatedSession = self.check_response_json(response).await?;
        tracing::info!(session_id = %session.id, "Checkout session created");

        session
            .url
            .ok_or_else(|| AppError::Payment(format!("Session {} has no URL", session.id)))
    }

    async fn list_completed_sessions(&self, limit: u32) -> AppResult<Vec<PaymentSession>> {
        let response = self
            .http
            .get(format!("{}/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .query(&[
                ("limit", limit.min(100).to_string()),
                ("status", "complete".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Payment(e.to_string()))?;

        let list: SessionList = self.check_response_json(response).await?;
        Ok(list.data)
    }
}
