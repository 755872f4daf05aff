//! Attendance periods: which week or month a check-in belongs to, and how long it lives.
//!
//! Everything here is a pure function of a wall-clock reading. Handlers take the
//! reading from a [`Clock`] so tests can pin "now".

use std::sync::Arc;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, Utc,
};

use crate::models::registration::PaymentTier;

/// Source of the current time, in the venue's local offset
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

pub type SharedClock = Arc<dyn Clock>;

/// Wall clock shifted to a fixed UTC offset
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                tracing::warn!(utc_offset_minutes, "Invalid UTC offset, falling back to UTC");
                Utc.fix()
            });
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock frozen at a given instant
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Monday of the week containing `date`, as `YYYY-MM-DD`. Sunday closes the week.
pub fn week_key(date: NaiveDate) -> String {
    week_start(date).format("%Y-%m-%d").to_string()
}

/// `YYYY-MM` of the month containing `date`
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// `YYYY-MM-DD`
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Seconds from `now` until 23:59:59 on the Sunday closing the week (at least 1)
pub fn seconds_until_end_of_week(now: NaiveDateTime) -> u64 {
    let sunday = week_start(now.date()) + Duration::days(6);
    seconds_until(now, end_of_day(sunday))
}

/// Seconds from `now` until 23:59:59 on the last day of the month (at least 1)
pub fn seconds_until_end_of_month(now: NaiveDateTime) -> u64 {
    let date = now.date();
    let last_day = date
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_first| next_first.pred_opt())
        .unwrap_or(date);
    seconds_until(now, end_of_day(last_day))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| date.and_time(NaiveTime::default()))
}

fn seconds_until(now: NaiveDateTime, end: NaiveDateTime) -> u64 {
    (end - now).num_seconds().max(1) as u64
}

/// Scope of a check-in flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodScope {
    Week,
    Month,
}

impl PeriodScope {
    /// Monthly passes are tracked per month, everything else per week
    pub fn for_tier(tier: PaymentTier) -> Self {
        match tier {
            PaymentTier::Monthly => PeriodScope::Month,
            PaymentTier::Single | PaymentTier::Free => PeriodScope::Week,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodScope::Week => "week",
            PeriodScope::Month => "month",
        }
    }

    /// Key of the period containing `now`
    pub fn key(&self, now: NaiveDateTime) -> String {
        match self {
            PeriodScope::Week => week_key(now.date()),
            PeriodScope::Month => month_key(now.date()),
        }
    }

    /// Seconds left in the period containing `now`
    pub fn seconds_remaining(&self, now: NaiveDateTime) -> u64 {
        match self {
            PeriodScope::Week => seconds_until_end_of_week(now),
            PeriodScope::Month => seconds_until_end_of_month(now),
        }
    }
}
