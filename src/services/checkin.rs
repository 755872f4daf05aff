//! Check-in service: period flags, daily history and the check-in event log

use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    error::{AppError, AppResult},
    keys,
    models::{
        checkin::{
            CheckinAction, CheckinEvent, CheckinRecord, CheckinRequest, CheckinResponse,
            HistoryEntry, RegistrationSnapshot,
        },
        registration::{Category, PaymentTier},
    },
    periods::{self, PeriodScope, SharedClock},
    services::store::{get_json, SharedStore, StoreOp},
};

#[derive(Clone)]
pub struct CheckinService {
    store: SharedStore,
    clock: SharedClock,
    history_ttl_seconds: u64,
}

impl CheckinService {
    pub fn new(store: SharedStore, clock: SharedClock, retention_days: u64) -> Self {
        Self {
            store,
            clock,
            history_ttl_seconds: retention_days * 24 * 3600,
        }
    }

    /// Key of the current period's flag for a registration
    fn flag_key(&self, registration_id: &str, tier: PaymentTier, now: DateTime<FixedOffset>) -> String {
        let scope = PeriodScope::for_tier(tier);
        keys::checkin(scope, &scope.key(now.naive_local()), registration_id)
    }

    /// Current-period check-in record, if the registration is checked in
    pub async fn status(&self, registration_id: &str, tier: PaymentTier) -> AppResult<Option<CheckinRecord>> {
        let key = self.flag_key(registration_id, tier, self.clock.now());
        let record: Option<CheckinRecord> = get_json(self.store.as_ref(), &key).await?;
        Ok(record.filter(|r| r.checked_in))
    }

    /// Apply a check-in, check-out or toggle request
    pub async fn update(&self, request: CheckinRequest) -> AppResult<CheckinResponse> {
        let registration_id = request
            .session_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("Session ID is required".to_string()))?
            .to_string();

        let action = match request.action.as_deref() {
            Some(action) => action.parse::<CheckinAction>().map_err(AppError::BadRequest)?,
            None => CheckinAction::Toggle,
        };
        let tier = request.price_type.unwrap_or_default();

        let action = match action {
            CheckinAction::Toggle => match self.status(&registration_id, tier).await? {
                Some(_) => CheckinAction::Checkout,
                None => CheckinAction::Checkin,
            },
            resolved => resolved,
        };

        match action {
            CheckinAction::Checkout => self.check_out(&registration_id, tier).await,
            _ => {
                self.check_in(&registration_id, tier, request.registration_data.as_ref())
                    .await
            }
        }
    }

    async fn check_in(
        &self,
        registration_id: &str,
        tier: PaymentTier,
        snapshot: Option<&RegistrationSnapshot>,
    ) -> AppResult<CheckinResponse> {
        let now = self.clock.now();
        let timestamp = now.with_timezone(&Utc);
        let scope = PeriodScope::for_tier(tier);
        let day = periods::day_key(now.date_naive());

        let record = CheckinRecord {
            checked_in: true,
            timestamp,
            price_type: tier,
        };

        let mut ops = vec![StoreOp::SetEx {
            key: self.flag_key(registration_id, tier, now),
            value: serde_json::to_string(&record)?,
            ttl_seconds: scope.seconds_remaining(now.naive_local()),
        }];

        if let Some(snapshot) = snapshot {
            let history_key = keys::history(&day);

            // A repeat check-in replaces the earlier entry for the day
            for stale in self.entries_for(&history_key, registration_id).await? {
                ops.push(StoreOp::SetRemove {
                    key: history_key.clone(),
                    member: stale,
                });
            }

            let entry = HistoryEntry {
                id: registration_id.to_string(),
                name: snapshot
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
                category: snapshot.category.unwrap_or(Category::Standard),
                price_type: tier,
                visit_number: snapshot.visit_number.clone().unwrap_or_default(),
                timestamp,
            };
            ops.push(StoreOp::SetAdd {
                key: history_key.clone(),
                member: serde_json::to_string(&entry)?,
            });
            ops.push(StoreOp::Expire {
                key: history_key,
                ttl_seconds: self.history_ttl_seconds,
            });
        }

        ops.extend(self.log_ops(&day, registration_id, CheckinAction::Checkin, tier, timestamp)?);
        self.store.apply(ops).await?;

        tracing::info!(
            registration_id,
            price_type = tier.as_str(),
            scope = scope.as_str(),
            "Checked in"
        );

        Ok(CheckinResponse {
            success: true,
            checked_in: true,
            timestamp: Some(timestamp),
        })
    }

    async fn check_out(&self, registration_id: &str, tier: PaymentTier) -> AppResult<CheckinResponse> {
        let now = self.clock.now();
        let timestamp = now.with_timezone(&Utc);
        let day = periods::day_key(now.date_naive());
        let history_key = keys::history(&day);

        let mut ops = vec![StoreOp::Delete {
            key: self.flag_key(registration_id, tier, now),
        }];

        // Only today's history is retracted; earlier days keep their entries
        match self.entries_for(&history_key, registration_id).await {
            Ok(stale) => ops.extend(stale.into_iter().map(|member| StoreOp::SetRemove {
                key: history_key.clone(),
                member,
            })),
            Err(e) => {
                tracing::warn!(registration_id, error = %e, "Could not read today's history on check-out");
            }
        }

        ops.extend(self.log_ops(&day, registration_id, CheckinAction::Checkout, tier, timestamp)?);
        self.store.apply(ops).await?;

        tracing::info!(registration_id, price_type = tier.as_str(), "Checked out");

        Ok(CheckinResponse {
            success: true,
            checked_in: false,
            timestamp: None,
        })
    }

    /// Raw members of a history set that belong to `registration_id`
    async fn entries_for(&self, history_key: &str, registration_id: &str) -> AppResult<Vec<String>> {
        let members = self.store.members(history_key).await?;
        Ok(members
            .into_iter()
            .filter(|raw| {
                serde_json::from_str::<serde_json::Value>(raw)
                    .ok()
                    .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(|id| id == registration_id))
                    .unwrap_or(false)
            })
            .collect())
    }

    fn log_ops(
        &self,
        day: &str,
        registration_id: &str,
        action: CheckinAction,
        tier: PaymentTier,
        timestamp: DateTime<Utc>,
    ) -> AppResult<Vec<StoreOp>> {
        let event = CheckinEvent {
            id: registration_id.to_string(),
            action,
            price_type: tier,
            timestamp,
        };
        let key = keys::checkin_log(day);
        Ok(vec![
            StoreOp::ListPush {
                key: key.clone(),
                value: serde_json::to_string(&event)?,
            },
            StoreOp::Expire {
                key,
                ttl_seconds: self.history_ttl_seconds,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        periods::FixedClock,
        services::store::{KeyValueStore, MemoryStore},
    };
    use chrono::DateTime;
    use std::sync::Arc;

    // Wednesday 2025-02-05, 19:00 local (UTC-5)
    const NOW: &str = "2025-02-05T19:00:00-05:00";

    fn service() -> (CheckinService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock(DateTime::parse_from_rfc3339(NOW).unwrap()));
        (CheckinService::new(store.clone(), clock, 365), store)
    }

    async fn logged(store: &MemoryStore, day: &str) -> Vec<CheckinEvent> {
        store
            .list(&keys::checkin_log(day))
            .await
            .unwrap()
            .iter()
            .map(|raw| serde_json::from_str(raw).unwrap())
            .collect()
    }

    fn request(id: &str, action: &str, tier: PaymentTier) -> CheckinRequest {
        CheckinRequest {
            session_id: Some(id.to_string()),
            action: Some(action.to_string()),
            price_type: Some(tier),
            registration_data: Some(RegistrationSnapshot {
                name: Some("Sam Doe".into()),
                category: Some(Category::Standard),
                visit_number: None,
            }),
        }
    }

    #[tokio::test]
    async fn check_in_writes_flag_history_and_event() {
        let (service, store) = service();
        let response = service
            .update(request("cs_1", "checkin", PaymentTier::Single))
            .await
            .unwrap();

        assert!(response.checked_in);
        assert!(response.timestamp.is_some());

        let flag = store.get("checkin:week:2025-02-03:cs_1").await.unwrap();
        assert!(flag.is_some());

        // Local day, not the UTC day (which is already 2025-02-06)
        let history = store.members("history:2025-02-05").await.unwrap();
        assert_eq!(history.len(), 1);
        let entry: HistoryEntry = serde_json::from_str(&history[0]).unwrap();
        assert_eq!(entry.id, "cs_1");
        assert_eq!(entry.name, "Sam Doe");

        let events = logged(&store, "2025-02-05").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, CheckinAction::Checkin);
    }

    #[tokio::test]
    async fn weekly_flag_expires_at_end_of_week() {
        let (service, store) = service();
        service
            .update(request("cs_1", "checkin", PaymentTier::Single))
            .await
            .unwrap();

        let ttl = store.ttl("checkin:week:2025-02-03:cs_1").await.unwrap().unwrap();
        // Wednesday 19:00 to Sunday 23:59:59
        let expected = 4 * 24 * 3600 + 4 * 3600 + 59 * 60 + 59;
        assert!(ttl <= expected && ttl > expected - 10);
        assert!(ttl <= 7 * 24 * 3600);
    }

    #[tokio::test]
    async fn monthly_flag_uses_month_key() {
        let (service, store) = service();
        service
            .update(request("cs_2", "checkin", PaymentTier::Monthly))
            .await
            .unwrap();

        let ttl = store.ttl("checkin:month:2025-02:cs_2").await.unwrap().unwrap();
        assert!(ttl > 0 && ttl <= 35 * 24 * 3600);
        assert!(service.status("cs_2", PaymentTier::Monthly).await.unwrap().is_some());
        assert!(service.status("cs_2", PaymentTier::Single).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn check_out_clears_flag_and_todays_history() {
        let (service, store) = service();
        service
            .update(request("cs_1", "checkin", PaymentTier::Single))
            .await
            .unwrap();
        service
            .update(request("cs_other", "checkin", PaymentTier::Single))
            .await
            .unwrap();

        let response = service
            .update(request("cs_1", "checkout", PaymentTier::Single))
            .await
            .unwrap();
        assert!(!response.checked_in);
        assert!(response.timestamp.is_none());

        assert!(service.status("cs_1", PaymentTier::Single).await.unwrap().is_none());
        let history = store.members("history:2025-02-05").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].contains("\"cs_1\""));
        assert_eq!(logged(&store, "2025-02-05").await.len(), 3);
    }

    #[tokio::test]
    async fn toggle_flips_current_state() {
        let (service, _) = service();
        let mut toggle = request("cs_1", "toggle", PaymentTier::Single);
        toggle.action = None;

        assert!(service.update(toggle.clone()).await.unwrap().checked_in);
        assert!(!service.update(toggle.clone()).await.unwrap().checked_in);
        assert!(service.update(toggle).await.unwrap().checked_in);
    }

    #[tokio::test]
    async fn repeat_check_in_keeps_one_history_entry() {
        let (service, store) = service();
        for _ in 0..2 {
            service
                .update(request("cs_1", "checkin", PaymentTier::Single))
                .await
                .unwrap();
        }
        assert_eq!(store.members("history:2025-02-05").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn check_in_without_snapshot_skips_history() {
        let (service, store) = service();
        let mut bare = request("cs_1", "checkin", PaymentTier::Single);
        bare.registration_data = None;
        service.update(bare).await.unwrap();

        assert!(store.members("history:2025-02-05").await.unwrap().is_empty());
        assert!(service.status("cs_1", PaymentTier::Single).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn snapshot_defaults_fill_missing_fields() {
        let (service, store) = service();
        let mut sparse = request("cs_1", "checkin", PaymentTier::Single);
        sparse.registration_data = Some(RegistrationSnapshot::default());
        service.update(sparse).await.unwrap();

        let history = store.members("history:2025-02-05").await.unwrap();
        let entry: HistoryEntry = serde_json::from_str(&history[0]).unwrap();
        assert_eq!(entry.name, "Unknown");
        assert_eq!(entry.category, Category::Standard);
        assert_eq!(entry.visit_number, "");
    }

    #[tokio::test]
    async fn missing_id_is_a_validation_error() {
        let (service, _) = service();
        let mut missing = request("", "checkin", PaymentTier::Single);
        let result = service.update(missing.clone()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        missing.session_id = None;
        let result = service.update(missing).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let (service, _) = service();
        let result = service
            .update(request("cs_1", "undo", PaymentTier::Single))
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
