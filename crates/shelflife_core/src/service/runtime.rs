//! Startup orchestration.
//!
//! # Responsibility
//! - Resolve the backend (schema included) before any repository access.
//! - Run the expiry maintenance job once, before the first query.
//! - Hand out the repository and services bound to the selected backend.
//!
//! # Invariants
//! - Maintenance runs exactly once per `start`; it is not rescheduled.

use crate::repo::item_repo::ItemRepository;
use crate::service::entitlement::EntitlementService;
use crate::service::maintenance::{ExpiryMaintenanceJob, MaintenanceReport};
use crate::service::reminder::ReminderScheduler;
use crate::store::selector::{BackendKind, BackendSelector};
use chrono::{DateTime, Utc};
use log::info;

pub struct CoreRuntime {
    backend: BackendKind,
    repo: ItemRepository,
    startup_maintenance: MaintenanceReport,
}

impl CoreRuntime {
    pub fn start(selector: &BackendSelector) -> Self {
        Self::start_at(selector, Utc::now())
    }

    pub fn start_at(selector: &BackendSelector, now: DateTime<Utc>) -> Self {
        let backend = selector.backend_kind();
        let repo = ItemRepository::new(selector.item_store());
        let startup_maintenance = ExpiryMaintenanceJob::new(repo.clone()).run_at(now);

        info!(
            "event=core_runtime_start module=service status=ok backend={} expired_flags_updated={}",
            backend.as_str(),
            startup_maintenance.updated
        );

        Self {
            backend,
            repo,
            startup_maintenance,
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn repository(&self) -> &ItemRepository {
        &self.repo
    }

    pub fn startup_maintenance(&self) -> MaintenanceReport {
        self.startup_maintenance
    }

    pub fn maintenance(&self) -> ExpiryMaintenanceJob {
        ExpiryMaintenanceJob::new(self.repo.clone())
    }

    pub fn reminders(&self) -> ReminderScheduler {
        ReminderScheduler::new(self.repo.clone())
    }

    pub fn entitlements(&self) -> EntitlementService {
        EntitlementService::new(self.repo.clone())
    }
}
