//! Registration model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Attendee category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Paying member (`ibo` in older records)
    #[serde(alias = "ibo")]
    Standard,
    Apprentice,
    Guest,
}

impl Category {
    /// Whether this category registers without going through checkout
    pub fn is_free(&self) -> bool {
        !matches!(self, Category::Standard)
    }
}

/// How the registration was paid for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentTier {
    #[default]
    Single,
    Monthly,
    Free,
}

impl PaymentTier {
    /// Tier recorded in payment session metadata; anything unknown is a single ticket
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value {
            Some("monthly") => PaymentTier::Monthly,
            Some("free") => PaymentTier::Free,
            _ => PaymentTier::Single,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentTier::Single => "single",
            PaymentTier::Monthly => "monthly",
            PaymentTier::Free => "free",
        }
    }
}

/// Which visit this is for an invited guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum VisitOrdinal {
    #[serde(rename = "1st")]
    First,
    #[serde(rename = "2nd")]
    Second,
    #[serde(rename = "3rd")]
    Third,
}

impl VisitOrdinal {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1st" => Some(VisitOrdinal::First),
            "2nd" => Some(VisitOrdinal::Second),
            "3rd" => Some(VisitOrdinal::Third),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisitOrdinal::First => "1st",
            VisitOrdinal::Second => "2nd",
            VisitOrdinal::Third => "3rd",
        }
    }
}

/// Forms send an empty string when no visit was picked
fn visit_from_label<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<VisitOrdinal>, D::Error> {
    let label: Option<String> = Option::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(VisitOrdinal::parse))
}

fn free_tier() -> PaymentTier {
    PaymentTier::Free
}

/// Registration record.
///
/// Paid registrations are built from completed payment sessions; free ones are
/// stored as-is under `registration:<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Payment session id, or `free_<uuid>` for free registrations
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(alias = "type")]
    pub category: Category,
    /// Stored free records may omit the tier
    #[serde(default = "free_tier")]
    pub price_type: PaymentTier,
    /// Member who invited the attendee
    #[serde(default)]
    pub invited_by: Option<String>,
    #[serde(default, deserialize_with = "visit_from_label")]
    pub visit_number: Option<VisitOrdinal>,
    #[serde(default)]
    pub ltd_id: String,
    #[serde(default)]
    pub upline_platinum: String,
    /// Page the registration came from (main, bcs, guest, ...)
    #[serde(default)]
    pub source: String,
    /// Amount paid, in currency units
    #[serde(default)]
    pub amount: Option<f64>,
    /// E-signature as a data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub agreed: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration with its check-in state for the current period
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatus {
    #[serde(flatten)]
    pub registration: Registration,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Free registration request (guests and apprentices)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRegistration {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Full name, used when first/last name are not given
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(alias = "type")]
    pub category: Option<Category>,
    pub invited_by: Option<String>,
    #[serde(deserialize_with = "visit_from_label")]
    pub visit_number: Option<VisitOrdinal>,
    pub ltd_id: Option<String>,
    pub upline_platinum: Option<String>,
    pub source: Option<String>,
    pub signature: Option<String>,
    pub agreed: bool,
}

impl CreateRegistration {
    /// Attendee name from first/last name, falling back to `name`
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if !parts.is_empty() {
            return Some(parts.join(" "));
        }

        self.name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Free registration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRegistrationResponse {
    pub success: bool,
    pub id: String,
}

/// Query parameters for the registration list
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationQuery {
    /// Only return this attendee category
    pub category: Option<Category>,
    /// Only return this payment tier (`filter` is accepted too; `all` means any tier)
    #[serde(default, alias = "filter", deserialize_with = "tier_filter")]
    pub price_type: Option<PaymentTier>,
}

fn tier_filter<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PaymentTier>, D::Error> {
    let label: Option<String> = Option::deserialize(deserializer)?;
    match label.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some("single") => Ok(Some(PaymentTier::Single)),
        Some("monthly") => Ok(Some(PaymentTier::Monthly)),
        Some("free") => Ok(Some(PaymentTier::Free)),
        Some(other) => Err(serde::de::Error::unknown_variant(
            other,
            &["all", "single", "monthly", "free"],
        )),
    }
}

/// Registration list response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationsResponse {
    pub registrations: Vec<RegistrationStatus>,
}
