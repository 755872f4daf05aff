//! Admin session and diagnostics models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JWT claims for an admin session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl AdminClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

/// Admin login request
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub password: String,
}

/// Issued admin session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Keys currently present, grouped by kind
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KeyInventory {
    pub registrations: Vec<String>,
    pub history: Vec<String>,
    pub checkins: Vec<String>,
}

/// Stored free registration, raw
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoredRecord {
    pub key: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

/// Store connectivity report
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreDiagnostics {
    pub store_working: bool,
    pub keys: KeyInventory,
    pub registration_data: Vec<StoredRecord>,
}
