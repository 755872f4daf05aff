//! Key layout in the key-value store

use chrono::NaiveDate;

use crate::periods::PeriodScope;

pub const CHECKIN_PREFIX: &str = "checkin:";
pub const HISTORY_PREFIX: &str = "history:";
pub const REGISTRATION_PREFIX: &str = "registration:";
pub const CHECKIN_LOG_PREFIX: &str = "checkins:log:";

/// `checkin:week:<monday>:<id>` or `checkin:month:<YYYY-MM>:<id>`
pub fn checkin(scope: PeriodScope, period_key: &str, registration_id: &str) -> String {
    format!("{}{}:{}:{}", CHECKIN_PREFIX, scope.as_str(), period_key, registration_id)
}

/// `history:<YYYY-MM-DD>`, a set of JSON-encoded check-ins for that day
pub fn history(day: &str) -> String {
    format!("{}{}", HISTORY_PREFIX, day)
}

/// `registration:<id>`, a free registration record
pub fn registration(id: &str) -> String {
    format!("{}{}", REGISTRATION_PREFIX, id)
}

/// `checkins:log:<YYYY-MM-DD>`, the append-only list of check-in events for that day
pub fn checkin_log(day: &str) -> String {
    format!("{}{}", CHECKIN_LOG_PREFIX, day)
}

/// Date encoded in a history key, if the key is well formed
pub fn history_date(key: &str) -> Option<NaiveDate> {
    key.strip_prefix(HISTORY_PREFIX)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}
