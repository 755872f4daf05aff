//! Registration service: paid checkout, free sign-up and the merged admin list

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::StripeConfig,
    error::{AppError, AppResult},
    keys,
    models::{
        checkout::{CheckoutSessionRequest, CreateCheckoutSession, PaymentSession},
        registration::{
            Category, CreateRegistration, PaymentTier, Registration, RegistrationQuery,
            RegistrationStatus,
        },
    },
    periods::SharedClock,
    services::{
        checkin::CheckinService,
        store::{get_json, SharedStore, StoreOp},
        stripe::SharedPayments,
    },
};

#[derive(Clone)]
pub struct RegistrationsService {
    store: SharedStore,
    payments: SharedPayments,
    checkin: CheckinService,
    clock: SharedClock,
    stripe: StripeConfig,
    public_url: String,
}

impl RegistrationsService {
    pub fn new(
        store: SharedStore,
        payments: SharedPayments,
        checkin: CheckinService,
        clock: SharedClock,
        stripe: StripeConfig,
        public_url: String,
    ) -> Self {
        Self {
            store,
            payments,
            checkin,
            clock,
            stripe,
            public_url,
        }
    }

    /// Open a hosted payment page for a paid ticket and return its URL
    pub async fn start_checkout(
        &self,
        data: CreateCheckoutSession,
        origin: Option<&str>,
    ) -> AppResult<String> {
        data.validate()?;

        let tier = data.price_type.unwrap_or_default();
        let price_id = match tier {
            PaymentTier::Single => &self.stripe.price_single,
            PaymentTier::Monthly => &self.stripe.price_monthly,
            PaymentTier::Free => {
                return Err(AppError::BadRequest(
                    "Free registrations do not go through checkout".to_string(),
                ))
            }
        };

        let origin = origin
            .filter(|o| !o.is_empty())
            .unwrap_or(self.public_url.as_str())
            .trim_end_matches('/');

        let mut metadata = BTreeMap::new();
        metadata.insert("customerName".to_string(), data.customer_name.trim().to_string());
        metadata.insert("ltdId".to_string(), data.ltd_id.unwrap_or_default());
        metadata.insert("uplinePlatinum".to_string(), data.upline_platinum.unwrap_or_default());
        metadata.insert("priceType".to_string(), tier.as_str().to_string());
        metadata.insert(
            "source".to_string(),
            data.source.unwrap_or_else(|| "main".to_string()),
        );

        let request = CheckoutSessionRequest {
            price_id: price_id.clone(),
            customer_email: data.customer_email,
            success_url: format!("{}?success=true&session_id={{CHECKOUT_SESSION_ID}}", origin),
            cancel_url: format!("{}?canceled=true", origin),
            metadata,
        };

        self.payments.create_checkout_session(&request).await
    }

    /// Store a free (guest or apprentice) registration
    pub async fn create_free(&self, data: CreateRegistration) -> AppResult<Registration> {
        data.validate()?;

        let name = data
            .full_name()
            .ok_or_else(|| AppError::Validation("Name is required".to_string()))?;
        let category = data
            .category
            .ok_or_else(|| AppError::Validation("Attendee type is required".to_string()))?;
        if !category.is_free() {
            return Err(AppError::BadRequest(
                "Paid registrations must go through checkout".to_string(),
            ));
        }

        let invited_by = data
            .invited_by
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if category == Category::Guest && (invited_by.is_none() || data.visit_number.is_none()) {
            return Err(AppError::Validation(
                "Guests must say who invited them and which visit this is".to_string(),
            ));
        }

        let registration = Registration {
            id: format!("free_{}", Uuid::new_v4().simple()),
            name,
            email: data.email.trim().to_string(),
            category,
            price_type: PaymentTier::Free,
            invited_by,
            visit_number: data.visit_number,
            ltd_id: data.ltd_id.unwrap_or_default(),
            upline_platinum: data.upline_platinum.unwrap_or_default(),
            source: data.source.unwrap_or_else(|| "guest".to_string()),
            amount: None,
            signature: data.signature,
            agreed: data.agreed,
            created_at: self.clock.now().with_timezone(&Utc),
        };

        self.store
            .apply(vec![StoreOp::Set {
                key: keys::registration(&registration.id),
                value: serde_json::to_string(&registration)?,
            }])
            .await?;

        tracing::info!(id = %registration.id, category = ?registration.category, "Free registration stored");
        Ok(registration)
    }

    /// Paid and free registrations with current check-in state, newest first.
    ///
    /// A failing source contributes nothing instead of failing the request.
    pub async fn list(&self, query: &RegistrationQuery) -> AppResult<Vec<RegistrationStatus>> {
        let mut registrations = self.paid_registrations().await;
        registrations.extend(self.free_registrations().await);

        registrations.retain(|r| {
            query.category.map_or(true, |c| r.category == c)
                && query.price_type.map_or(true, |t| r.price_type == t)
        });

        let mut listed = Vec::with_capacity(registrations.len());
        for registration in registrations {
            let record = match self.checkin.status(&registration.id, registration.price_type).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(id = %registration.id, error = %e, "Could not read check-in state");
                    None
                }
            };
            listed.push(RegistrationStatus {
                checked_in: record.is_some(),
                checked_in_at: record.map(|r| r.timestamp),
                registration,
            });
        }

        listed.sort_by(|a, b| b.registration.created_at.cmp(&a.registration.created_at));
        Ok(listed)
    }

    async fn paid_registrations(&self) -> Vec<Registration> {
        match self.payments.list_completed_sessions(self.stripe.list_limit).await {
            Ok(sessions) => sessions.iter().map(registration_from_session).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Listing payment sessions failed, showing free registrations only");
                Vec::new()
            }
        }
    }

    async fn free_registrations(&self) -> Vec<Registration> {
        let registration_keys = match self.store.keys_with_prefix(keys::REGISTRATION_PREFIX).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "Scanning free registrations failed");
                return Vec::new();
            }
        };

        let mut registrations = Vec::with_capacity(registration_keys.len());
        for key in registration_keys {
            match get_json::<Registration>(self.store.as_ref(), &key).await {
                Ok(Some(registration)) => registrations.push(registration),
                Ok(None) => {}
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping unreadable registration"),
            }
        }
        registrations
    }
}

/// Paid registration as described by its payment session
fn registration_from_session(session: &PaymentSession) -> Registration {
    let details = session.customer_details.clone().unwrap_or_default();

    let name = session
        .metadata("customerName")
        .map(str::to_string)
        .or(details.name)
        .unwrap_or_else(|| "Unknown".to_string());
    let email = details
        .email
        .or_else(|| session.customer_email.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    Registration {
        id: session.id.clone(),
        name,
        email,
        category: Category::Standard,
        price_type: PaymentTier::from_metadata(session.metadata("priceType")),
        invited_by: None,
        visit_number: None,
        ltd_id: session.metadata("ltdId").unwrap_or_default().to_string(),
        upline_platinum: session.metadata("uplinePlatinum").unwrap_or_default().to_string(),
        source: session.metadata("source").unwrap_or("main").to_string(),
        amount: session.amount_total.map(|cents| cents as f64 / 100.0),
        signature: None,
        agreed: true,
        created_at: DateTime::from_timestamp(session.created, 0).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{checkin::CheckinRequest, checkout::CustomerDetails},
        periods::FixedClock,
        services::{
            store::{KeyValueStore, MemoryStore},
            stripe::PaymentProvider,
        },
    };
    use async_trait::async_trait;
    use chrono::DateTime;
    use mockall::mock;
    use std::{collections::HashMap, sync::Arc};

    mock! {
        pub Payments {}

        #[async_trait]
        impl PaymentProvider for Payments {
            async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> AppResult<String>;
            async fn list_completed_sessions(&self, limit: u32) -> AppResult<Vec<PaymentSession>>;
        }
    }

    fn session(id: &str, created: i64, tier: &str) -> PaymentSession {
        let mut metadata = HashMap::new();
        metadata.insert("customerName".to_string(), format!("Member {}", id));
        metadata.insert("priceType".to_string(), tier.to_string());
        PaymentSession {
            id: id.to_string(),
            created,
            amount_total: Some(2500),
            customer_email: None,
            customer_details: Some(CustomerDetails {
                name: Some("Card Holder".into()),
                email: Some(format!("{}@example.com", id)),
            }),
            metadata,
        }
    }

    fn service(payments: MockPayments) -> (RegistrationsService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock: SharedClock = Arc::new(FixedClock(
            DateTime::parse_from_rfc3339("2025-02-05T19:00:00-05:00").unwrap(),
        ));
        let checkin = CheckinService::new(store.clone(), clock.clone(), 365);
        let stripe = StripeConfig {
            price_single: "price_single".into(),
            price_monthly: "price_monthly".into(),
            ..Default::default()
        };
        let service = RegistrationsService::new(
            store.clone(),
            Arc::new(payments),
            checkin,
            clock,
            stripe,
            "https://example.org".into(),
        );
        (service, store)
    }

    fn guest() -> CreateRegistration {
        CreateRegistration {
            first_name: Some("Gail".into()),
            last_name: Some("Guest".into()),
            email: "gail@example.com".into(),
            category: Some(Category::Guest),
            invited_by: Some("Sam Doe".into()),
            visit_number: Some(crate::models::VisitOrdinal::First),
            source: Some("guest".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn checkout_picks_price_and_builds_redirects() {
        let mut payments = MockPayments::new();
        payments
            .expect_create_checkout_session()
            .withf(|req| {
                req.price_id == "price_monthly"
                    && req.success_url
                        == "https://site.test?success=true&session_id={CHECKOUT_SESSION_ID}"
                    && req.cancel_url == "https://site.test?canceled=true"
                    && req.metadata.get("priceType").map(String::as_str) == Some("monthly")
                    && req.metadata.get("source").map(String::as_str) == Some("bcs")
            })
            .returning(|_| Ok("https://checkout.stripe.test/pay/cs_1".to_string()));

        let (service, _) = service(payments);
        let url = service
            .start_checkout(
                CreateCheckoutSession {
                    price_type: Some(PaymentTier::Monthly),
                    customer_email: "sam@example.com".into(),
                    customer_name: "Sam Doe".into(),
                    source: Some("bcs".into()),
                    ..Default::default()
                },
                Some("https://site.test/"),
            )
            .await
            .unwrap();
        assert_eq!(url, "https://checkout.stripe.test/pay/cs_1");
    }

    #[tokio::test]
    async fn checkout_falls_back_to_public_url() {
        let mut payments = MockPayments::new();
        payments
            .expect_create_checkout_session()
            .withf(|req| req.cancel_url == "https://example.org?canceled=true" && req.price_id == "price_single")
            .returning(|_| Ok("https://pay".to_string()));

        let (service, _) = service(payments);
        let data = CreateCheckoutSession {
            customer_email: "sam@example.com".into(),
            customer_name: "Sam".into(),
            ..Default::default()
        };
        assert!(service.start_checkout(data, None).await.is_ok());
    }

    #[tokio::test]
    async fn checkout_rejects_bad_input() {
        let (service, _) = service(MockPayments::new());

        let bad_email = CreateCheckoutSession {
            customer_email: "not-an-email".into(),
            customer_name: "Sam".into(),
            ..Default::default()
        };
        assert!(matches!(
            service.start_checkout(bad_email, None).await,
            Err(AppError::Validation(_))
        ));

        let free = CreateCheckoutSession {
            price_type: Some(PaymentTier::Free),
            customer_email: "sam@example.com".into(),
            customer_name: "Sam".into(),
            ..Default::default()
        };
        assert!(matches!(
            service.start_checkout(free, None).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn free_registration_is_stored() {
        let (service, store) = service(MockPayments::new());
        let registration = service.create_free(guest()).await.unwrap();

        assert!(registration.id.starts_with("free_"));
        assert_eq!(registration.name, "Gail Guest");
        assert_eq!(registration.price_type, PaymentTier::Free);

        let stored: Registration = get_json(store.as_ref(), &keys::registration(&registration.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, registration);
    }

    #[tokio::test]
    async fn free_registration_validation() {
        let (service, _) = service(MockPayments::new());

        let mut no_email = guest();
        no_email.email = String::new();
        assert!(matches!(service.create_free(no_email).await, Err(AppError::Validation(_))));

        let mut no_inviter = guest();
        no_inviter.invited_by = Some("  ".into());
        assert!(matches!(service.create_free(no_inviter).await, Err(AppError::Validation(_))));

        let mut paid = guest();
        paid.category = Some(Category::Standard);
        assert!(matches!(service.create_free(paid).await, Err(AppError::BadRequest(_))));

        let mut apprentice = guest();
        apprentice.category = Some(Category::Apprentice);
        apprentice.invited_by = None;
        apprentice.visit_number = None;
        assert!(service.create_free(apprentice).await.is_ok());
    }

    #[tokio::test]
    async fn list_merges_sources_with_checkin_state() {
        let mut payments = MockPayments::new();
        payments
            .expect_list_completed_sessions()
            .with(mockall::predicate::eq(100))
            .returning(|_| {
                Ok(vec![
                    session("cs_old", 1_700_000_000, "single"),
                    session("cs_new", 1_800_000_000, "monthly"),
                ])
            });

        let (service, _) = service(payments);
        let free = service.create_free(guest()).await.unwrap();

        service
            .checkin
            .update(CheckinRequest {
                session_id: Some("cs_new".into()),
                action: Some("checkin".into()),
                price_type: Some(PaymentTier::Monthly),
                registration_data: None,
            })
            .await
            .unwrap();

        let listed = service.list(&RegistrationQuery::default()).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.registration.id.as_str()).collect();
        assert_eq!(ids, vec!["cs_new", free.id.as_str(), "cs_old"]);

        let paid = &listed[0];
        assert!(paid.checked_in);
        assert!(paid.checked_in_at.is_some());
        assert_eq!(paid.registration.name, "Member cs_new");
        assert_eq!(paid.registration.email, "cs_new@example.com");
        assert_eq!(paid.registration.amount, Some(25.0));
        assert_eq!(paid.registration.source, "main");
        assert!(!listed[1].checked_in);
    }

    #[tokio::test]
    async fn list_filters_by_category_and_tier() {
        let mut payments = MockPayments::new();
        payments
            .expect_list_completed_sessions()
            .returning(|_| Ok(vec![session("cs_1", 1_700_000_000, "monthly")]));

        let (service, _) = service(payments);
        service.create_free(guest()).await.unwrap();

        let guests = service
            .list(&RegistrationQuery {
                category: Some(Category::Guest),
                price_type: None,
            })
            .await
            .unwrap();
        assert_eq!(guests.len(), 1);
        assert_eq!(guests[0].registration.category, Category::Guest);

        let monthly = service
            .list(&RegistrationQuery {
                category: None,
                price_type: Some(PaymentTier::Monthly),
            })
            .await
            .unwrap();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].registration.id, "cs_1");
    }

    #[tokio::test]
    async fn provider_failure_still_lists_free_registrations() {
        let mut payments = MockPayments::new();
        payments
            .expect_list_completed_sessions()
            .returning(|_| Err(AppError::Payment("Invalid API Key provided".into())));

        let (service, store) = service(payments);
        service.create_free(guest()).await.unwrap();
        store
            .apply(vec![StoreOp::Set {
                key: keys::registration("broken"),
                value: "{oops".into(),
            }])
            .await
            .unwrap();

        let listed = service.list(&RegistrationQuery::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].registration.category, Category::Guest);
    }

    #[test]
    fn session_mapping_falls_back_to_provider_details() {
        let mut bare = session("cs_1", 1_700_000_000, "weird");
        bare.metadata.remove("customerName");
        bare.customer_details = None;
        bare.customer_email = Some("fallback@example.com".into());

        let registration = registration_from_session(&bare);
        assert_eq!(registration.name, "Unknown");
        assert_eq!(registration.email, "fallback@example.com");
        assert_eq!(registration.price_type, PaymentTier::Single);
        assert_eq!(registration.created_at.timestamp(), 1_700_000_000);
    }
}
