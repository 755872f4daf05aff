//! Attendance history models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{
    checkin::{CheckinEvent, HistoryEntry},
    registration::{Category, VisitOrdinal},
};

/// Guests broken down by visit ordinal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GuestStats {
    pub total: usize,
    pub first: usize,
    pub second: usize,
    pub third: usize,
}

/// Aggregate counts for one day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DayStats {
    pub total: usize,
    pub standard: usize,
    pub apprentices: usize,
    pub guests: GuestStats,
}

impl DayStats {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut stats = DayStats {
            total: entries.len(),
            ..Default::default()
        };

        for entry in entries {
            match entry.category {
                Category::Standard => stats.standard += 1,
                Category::Apprentice => stats.apprentices += 1,
                Category::Guest => {
                    stats.guests.total += 1;
                    match VisitOrdinal::parse(&entry.visit_number) {
                        Some(VisitOrdinal::First) => stats.guests.first += 1,
                        Some(VisitOrdinal::Second) => stats.guests.second += 1,
                        Some(VisitOrdinal::Third) => stats.guests.third += 1,
                        None => {}
                    }
                }
            }
        }

        stats
    }
}

/// One day's check-ins with derived counts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DayDetail {
    pub date: NaiveDate,
    pub checkins: Vec<HistoryEntry>,
    pub stats: DayStats,
    /// Every check-in and check-out applied that day, oldest first
    pub events: Vec<CheckinEvent>,
}

/// Counts for one day in the history listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DaySummary {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub stats: DayStats,
}

/// Days with check-ins, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryListing {
    pub history: Vec<DaySummary>,
    /// Number of history keys present in the store
    pub days_found: usize,
}

/// Either a single day or the listing, depending on the query
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum HistoryResponse {
    Day(DayDetail),
    Listing(HistoryListing),
}

/// Query parameters for the history endpoint
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Day to return (YYYY-MM-DD); omit for the listing
    pub date: Option<String>,
}
