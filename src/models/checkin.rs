//! Check-in models

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::registration::{Category, PaymentTier};

/// Value stored under a period-scoped check-in key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckinRecord {
    pub checked_in: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub price_type: PaymentTier,
}

/// Requested change to a check-in flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckinAction {
    Checkin,
    Checkout,
    /// Flip whatever the current state is
    Toggle,
}

impl FromStr for CheckinAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkin" => Ok(CheckinAction::Checkin),
            "checkout" => Ok(CheckinAction::Checkout),
            "toggle" => Ok(CheckinAction::Toggle),
            other => Err(format!("Invalid action: {}", other)),
        }
    }
}

/// Registration fields copied into the day's history on check-in
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationSnapshot {
    pub name: Option<String>,
    #[serde(alias = "type")]
    pub category: Option<Category>,
    pub visit_number: Option<String>,
}

/// Check-in toggle request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckinRequest {
    /// Registration id (payment session id for paid registrations)
    #[serde(alias = "registrationId")]
    pub session_id: Option<String>,
    /// `checkin`, `checkout` or `toggle` (default)
    pub action: Option<String>,
    pub price_type: Option<PaymentTier>,
    pub registration_data: Option<RegistrationSnapshot>,
}

/// Check-in toggle response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckinResponse {
    pub success: bool,
    pub checked_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One check-in as recorded in `history:<day>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub name: String,
    #[serde(alias = "type")]
    pub category: Category,
    #[serde(default)]
    pub price_type: PaymentTier,
    /// `1st`, `2nd`, `3rd`, or empty
    #[serde(default)]
    pub visit_number: String,
    pub timestamp: DateTime<Utc>,
}

/// Entry appended to `checkins:log:<day>` for every applied action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckinEvent {
    pub id: String,
    /// Resolved action, never `toggle`
    pub action: CheckinAction,
    pub price_type: PaymentTier,
    pub timestamp: DateTime<Utc>,
}
