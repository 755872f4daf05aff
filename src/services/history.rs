//! Attendance history service

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    keys,
    models::{
        checkin::{CheckinEvent, HistoryEntry},
        history::{DayDetail, DayStats, DaySummary, HistoryListing},
    },
    periods,
    services::store::SharedStore,
};

#[derive(Clone)]
pub struct HistoryService {
    store: SharedStore,
    max_days: usize,
}

impl HistoryService {
    pub fn new(store: SharedStore, max_days: usize) -> Self {
        Self { store, max_days }
    }

    /// One day's check-ins, oldest first, with counts and the day's event log
    pub async fn day(&self, date: NaiveDate) -> AppResult<DayDetail> {
        let day = periods::day_key(date);
        let members = self.store.members(&keys::history(&day)).await?;

        let mut checkins = parse_entries(&members);
        checkins.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        let stats = DayStats::from_entries(&checkins);

        let logged = self.store.list(&keys::checkin_log(&day)).await?;

        Ok(DayDetail {
            date,
            checkins,
            stats,
            events: parse_events(&logged),
        })
    }

    /// Most recent days with at least one check-in, newest first
    pub async fn listing(&self) -> AppResult<HistoryListing> {
        let history_keys = self.store.keys_with_prefix(keys::HISTORY_PREFIX).await?;
        let days_found = history_keys.len();

        let mut dates: Vec<NaiveDate> = history_keys
            .iter()
            .filter_map(|k| keys::history_date(k))
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();

        let mut history = Vec::new();
        for date in dates.into_iter().take(self.max_days) {
            let key = keys::history(&periods::day_key(date));
            let members = match self.store.members(&key).await {
                Ok(members) => members,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping unreadable history day");
                    continue;
                }
            };

            let entries = parse_entries(&members);
            if entries.is_empty() {
                continue;
            }

            history.push(DaySummary {
                date,
                stats: DayStats::from_entries(&entries),
            });
        }

        Ok(HistoryListing {
            history,
            days_found,
        })
    }
}

/// Decode stored entries, skipping anything malformed
fn parse_entries(members: &[String]) -> Vec<HistoryEntry> {
    members
        .iter()
        .filter_map(|raw| match serde_json::from_str::<HistoryEntry>(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed history entry");
                None
            }
        })
        .collect()
}

fn parse_events(items: &[String]) -> Vec<CheckinEvent> {
    items
        .iter()
        .filter_map(|raw| match serde_json::from_str::<CheckinEvent>(raw) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed check-in event");
                None
            }
        })
        .collect()
}
