//! Paid checkout models

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::registration::PaymentTier;

/// Paid registration request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCheckoutSession {
    /// `single` or `monthly`
    pub price_type: Option<PaymentTier>,
    #[validate(email(message = "Invalid email format"))]
    pub customer_email: String,
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    pub ltd_id: Option<String>,
    pub upline_platinum: Option<String>,
    pub source: Option<String>,
}

/// Hosted payment page to redirect to
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub url: String,
}

/// What the payment provider needs to open a hosted session
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub price_id: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BTreeMap<String, String>,
}

/// Customer details the provider collected on its page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Completed payment session as reported by the provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentSession {
    pub id: String,
    /// Unix timestamp (seconds)
    pub created: i64,
    /// Amount in the smallest currency unit
    pub amount_total: Option<i64>,
    pub customer_email: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentSession {
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
