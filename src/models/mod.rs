//! Data models for Regdesk

pub mod admin;
pub mod checkin;
pub mod checkout;
pub mod history;
pub mod registration;

// Re-export commonly used types
pub use checkin::{CheckinAction, CheckinRecord, HistoryEntry};
pub use history::{DayStats, GuestStats};
pub use registration::{Category, PaymentTier, Registration, VisitOrdinal};
