//! Business logic services

pub mod admin;
pub mod checkin;
pub mod history;
pub mod redis;
pub mod registrations;
pub mod store;
pub mod stripe;

use crate::{
    config::AppConfig,
    periods::SharedClock,
    services::{store::SharedStore, stripe::SharedPayments},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub store: SharedStore,
    pub checkin: checkin::CheckinService,
    pub registrations: registrations::RegistrationsService,
    pub history: history::HistoryService,
    pub admin: admin::AdminService,
}

impl Services {
    /// Wire all services around the given store, payment provider and clock
    pub fn new(
        config: &AppConfig,
        store: SharedStore,
        payments: SharedPayments,
        clock: SharedClock,
    ) -> Self {
        let checkin = checkin::CheckinService::new(
            store.clone(),
            clock.clone(),
            config.history.retention_days,
        );

        Self {
            registrations: registrations::RegistrationsService::new(
                store.clone(),
                payments,
                checkin.clone(),
                clock,
                config.stripe.clone(),
                config.server.public_url.clone(),
            ),
            history: history::HistoryService::new(store.clone(), config.history.max_days),
            admin: admin::AdminService::new(store.clone(), config.admin.clone()),
            checkin,
            store,
        }
    }
}
