//! Admin authentication and store diagnostics

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AdminConfig,
    error::{AppError, AppResult},
    keys,
    models::admin::{AdminClaims, KeyInventory, StoreDiagnostics, StoredRecord, TokenResponse},
    services::store::{SharedStore, StoreOp},
};

const PING_KEY: &str = "test:ping";

#[derive(Clone)]
pub struct AdminService {
    store: SharedStore,
    config: AdminConfig,
}

impl AdminService {
    pub fn new(store: SharedStore, config: AdminConfig) -> Self {
        Self { store, config }
    }

    /// Check the admin password and issue a session token
    pub fn login(&self, password: &str) -> AppResult<TokenResponse> {
        if self.config.password_hash.is_empty() {
            return Err(AppError::Authentication(
                "Admin login is not configured".to_string(),
            ));
        }

        let secret = self.signing_secret()?;

        if !verify_password(&self.config.password_hash, password)? {
            tracing::warn!("Rejected admin login");
            return Err(AppError::Authentication("Invalid password".to_string()));
        }

        let now = Utc::now().timestamp();
        let expires_in = (self.config.session_hours as i64) * 3600;
        let claims = AdminClaims {
            sub: "admin".to_string(),
            iat: now,
            exp: now + expires_in,
        };
        let token = claims
            .create_token(secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!("Admin session issued");
        Ok(TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in,
        })
    }

    /// Validate a bearer token
    pub fn verify_token(&self, token: &str) -> AppResult<AdminClaims> {
        AdminClaims::from_token(token, self.signing_secret()?)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }

    fn signing_secret(&self) -> AppResult<&str> {
        self.config.signing_secret().ok_or_else(|| {
            AppError::Authentication("Admin session secret is not configured".to_string())
        })
    }

    /// Round-trip a test key and list what the store holds
    pub async fn diagnostics(&self) -> AppResult<StoreDiagnostics> {
        self.store
            .apply(vec![StoreOp::Set {
                key: PING_KEY.to_string(),
                value: "pong".to_string(),
            }])
            .await?;
        let pong = self.store.get(PING_KEY).await?;

        let registrations = self.store.keys_with_prefix(keys::REGISTRATION_PREFIX).await?;
        let history = self.store.keys_with_prefix(keys::HISTORY_PREFIX).await?;
        let checkins = self.store.keys_with_prefix(keys::CHECKIN_PREFIX).await?;

        let mut registration_data = Vec::with_capacity(registrations.len());
        for key in &registrations {
            let data = match self.store.get(key).await? {
                Some(raw) => serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw)),
                None => serde_json::Value::Null,
            };
            registration_data.push(StoredRecord {
                key: key.clone(),
                data,
            });
        }

        Ok(StoreDiagnostics {
            store_working: pong.as_deref() == Some("pong"),
            keys: KeyInventory {
                registrations,
                history,
                checkins,
            },
            registration_data,
        })
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid admin password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn service(password: &str) -> AdminService {
        let config = AdminConfig {
            password_hash: hash_password(password).unwrap(),
            jwt_secret: "test-secret".into(),
            session_hours: 2,
        };
        AdminService::new(Arc::new(MemoryStore::new()), config)
    }

    #[test]
    fn login_issues_verifiable_token() {
        let service = service("letmein");
        let session = service.login("letmein").unwrap();
        assert_eq!(session.token_type, "Bearer");
        assert_eq!(session.expires_in, 7200);
        assert_eq!(service.verify_token(&session.token).unwrap().sub, "admin");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let service = service("letmein");
        assert!(matches!(
            service.login("guess"),
            Err(AppError::Authentication(_))
        ));
        assert!(service.verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn unconfigured_login_is_rejected() {
        let service = AdminService::new(Arc::new(MemoryStore::new()), AdminConfig::default());
        assert!(matches!(
            service.login(""),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn placeholder_secret_disables_sessions() {
        let config = AdminConfig {
            password_hash: hash_password("letmein").unwrap(),
            jwt_secret: "change-this-secret-in-production".into(),
            session_hours: 2,
        };
        let service = AdminService::new(Arc::new(MemoryStore::new()), config);
        assert!(matches!(
            service.login("letmein"),
            Err(AppError::Authentication(_))
        ));

        let now = Utc::now().timestamp();
        let forged = AdminClaims {
            sub: "admin".into(),
            iat: now,
            exp: now + 3600,
        }
        .create_token("change-this-secret-in-production")
        .unwrap();
        assert!(service.verify_token(&forged).is_err());
    }

    #[test]
    fn blank_secret_is_not_a_signing_secret() {
        let mut config = AdminConfig::default();
        assert_eq!(config.signing_secret(), None);
        config.jwt_secret = "   ".into();
        assert_eq!(config.signing_secret(), None);
        config.jwt_secret = "a-private-value".into();
        assert_eq!(config.signing_secret(), Some("a-private-value"));
    }

    #[tokio::test]
    async fn diagnostics_lists_keys() {
        let store = Arc::new(MemoryStore::new());
        store
            .apply(vec![
                StoreOp::Set {
                    key: "registration:free_1".into(),
                    value: r#"{"id":"free_1"}"#.into(),
                },
                StoreOp::SetAdd {
                    key: "history:2025-02-05".into(),
                    member: "{}".into(),
                },
            ])
            .await
            .unwrap();

        let service = AdminService::new(store, AdminConfig::default());
        let report = service.diagnostics().await.unwrap();
        assert!(report.store_working);
        assert_eq!(report.keys.registrations, vec!["registration:free_1"]);
        assert_eq!(report.keys.history, vec!["history:2025-02-05"]);
        assert!(report.keys.checkins.is_empty());
        assert_eq!(report.registration_data[0].data["id"], "free_1");
    }
}
