//! Expiry maintenance job.
//!
//! # Responsibility
//! - Refresh the cached `is_expired` flag in one pass over stored items.
//!
//! # Invariants
//! - Only unflagged records whose expiry day has passed are changed.
//! - A second consecutive run changes nothing.
//! - Failures are logged and reported, never raised.

use crate::repo::item_repo::ItemRepository;
use chrono::{DateTime, Utc};
use log::{error, info};
use std::time::Instant;

/// Result of one maintenance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaintenanceReport {
    /// Records whose flag was flipped to expired.
    pub updated: usize,
    /// `false` when the pass failed; `updated` is then 0.
    pub ok: bool,
}

/// Batch pass correcting stale expiry flags.
pub struct ExpiryMaintenanceJob {
    repo: ItemRepository,
}

impl ExpiryMaintenanceJob {
    pub fn new(repo: ItemRepository) -> Self {
        Self { repo }
    }

    pub fn run(&self) -> MaintenanceReport {
        self.run_at(Utc::now())
    }

    pub fn run_at(&self, now: DateTime<Utc>) -> MaintenanceReport {
        let started_at = Instant::now();
        match self.repo.store().refresh_expired_flags(now) {
            Ok(updated) => {
                info!(
                    "event=expiry_maintenance module=service status=ok updated={} duration_ms={}",
                    updated,
                    started_at.elapsed().as_millis()
                );
                MaintenanceReport { updated, ok: true }
            }
            Err(err) => {
                error!(
                    "event=expiry_maintenance module=service status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                MaintenanceReport {
                    updated: 0,
                    ok: false,
                }
            }
        }
    }
}
