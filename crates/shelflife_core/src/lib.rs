//! Core domain logic for ShelfLife.
//! This crate is the single source of truth for item and expiry invariants.

pub mod config;
pub mod db;
pub mod expiry;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::CoreConfig;
pub use expiry::{classify, days_until, is_expired_at, ExpiryStatus};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{Category, Item, ItemChanges, ItemDraft, ItemId, ItemValidationError};
pub use repo::item_repo::ItemRepository;
pub use service::entitlement::EntitlementService;
pub use service::maintenance::{ExpiryMaintenanceJob, MaintenanceReport};
pub use service::reminder::{
    NotificationSink, ReminderScheduler, ReminderTrigger, RescheduleReport,
    DEFAULT_LEAD_WINDOW_DAYS,
};
pub use service::runtime::CoreRuntime;
pub use store::selector::{BackendKind, BackendSelector, StoreHandle};
pub use store::{ItemStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
