//! Persisted premium entitlement flag.
//!
//! The purchase flow lives outside the core; this service only stores and
//! reads the flag. Nothing in the core gates behavior on it.

use crate::repo::item_repo::ItemRepository;
use log::error;

pub const PREMIUM_PREFERENCE_KEY: &str = "premium";

pub struct EntitlementService {
    repo: ItemRepository,
}

impl EntitlementService {
    pub fn new(repo: ItemRepository) -> Self {
        Self { repo }
    }

    /// Returns `false` when unset or unreadable.
    pub fn is_premium(&self) -> bool {
        match self.repo.store().read_preference(PREMIUM_PREFERENCE_KEY) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(err) => {
                error!(
                    "event=entitlement_read module=service status=error error={}",
                    err
                );
                false
            }
        }
    }

    /// Persists the flag; returns whether it was saved.
    pub fn set_premium(&self, enabled: bool) -> bool {
        let value = if enabled { "true" } else { "false" };
        match self
            .repo
            .store()
            .write_preference(PREMIUM_PREFERENCE_KEY, value)
        {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "event=entitlement_write module=service status=error error={}",
                    err
                );
                false
            }
        }
    }
}
