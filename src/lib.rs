//! Regdesk event registration server
//!
//! Takes paid (Stripe checkout) and free (guest, apprentice) registrations,
//! records door check-ins per week or month, and keeps a per-day attendance
//! history, all behind a REST JSON API backed by a key-value store.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod periods;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
