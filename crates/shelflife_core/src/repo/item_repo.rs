//! Item repository with sentinel failure semantics.
//!
//! # Responsibility
//! - Provide add/get/list/update/delete over whichever backend was selected.
//! - Fill draft defaults and validate input before persistence.
//!
//! # Invariants
//! - `add` returns `None` on validation or storage failure.
//! - Read operations return an empty list (or `None`) on storage failure.
//! - `update` returns 0 and `delete` returns `false` for unknown ids and on
//!   storage failure.
//! - Every absorbed failure emits one log event with an `error_code`.

use crate::model::item::{Item, ItemChanges, ItemDraft, ItemId};
use crate::store::{ItemStore, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use log::{error, warn};
use std::sync::Arc;

/// Backend-agnostic item repository.
#[derive(Clone)]
pub struct ItemRepository {
    store: Arc<dyn ItemStore>,
}

impl ItemRepository {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &dyn ItemStore {
        self.store.as_ref()
    }

    /// Adds an item; returns its generated id, or `None` when not saved.
    pub fn add(&self, draft: ItemDraft) -> Option<ItemId> {
        self.add_at(draft, Utc::now())
    }

    /// Adds an item using `now` as the default `added_date`.
    pub fn add_at(&self, draft: ItemDraft, now: DateTime<Utc>) -> Option<ItemId> {
        let item = match draft.into_new_item(now) {
            Ok(item) => item,
            Err(err) => {
                absorb::<()>("item_add", Err(StoreError::Validation(err)));
                return None;
            }
        };
        absorb("item_add", self.store.add(&item))
    }

    pub fn get(&self, id: ItemId) -> Option<Item> {
        absorb("item_get", self.store.get(id)).flatten()
    }

    /// Every record, ascending by id.
    pub fn get_all(&self) -> Vec<Item> {
        absorb("item_list_all", self.store.get_all()).unwrap_or_default()
    }

    /// Unexpired items expiring within `days` from today, soonest first.
    pub fn get_expiring(&self, days: u32) -> Vec<Item> {
        self.get_expiring_at(days, Utc::now())
    }

    pub fn get_expiring_at(&self, days: u32, now: DateTime<Utc>) -> Vec<Item> {
        absorb("item_list_expiring", self.store.get_expiring(days, now)).unwrap_or_default()
    }

    /// Items flagged expired, most recently expired first.
    pub fn get_expired(&self) -> Vec<Item> {
        absorb("item_list_expired", self.store.get_expired()).unwrap_or_default()
    }

    /// Overwrites every mutable field; returns the number of changed records.
    pub fn update(&self, id: ItemId, changes: ItemChanges) -> usize {
        let changes = match changes.validated() {
            Ok(changes) => changes,
            Err(err) => {
                absorb::<()>("item_update", Err(StoreError::Validation(err)));
                return 0;
            }
        };
        absorb("item_update", self.store.update(id, &changes)).unwrap_or(0)
    }

    /// Removes a record; returns whether one existed.
    pub fn delete(&self, id: ItemId) -> bool {
        absorb("item_delete", self.store.delete(id)).unwrap_or(false)
    }
}

/// Converts a store result into an optional value, logging the failure.
fn absorb<T>(event: &str, result: StoreResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(StoreError::Validation(err)) => {
            warn!(
                "event={} module=repo status=rejected error_code=validation_failed error={}",
                event, err
            );
            None
        }
        Err(err) => {
            error!(
                "event={} module=repo status=error error_code={} error={}",
                event,
                error_code(&err),
                err
            );
            None
        }
    }
}

fn error_code(err: &StoreError) -> &'static str {
    match err {
        StoreError::Validation(_) => "validation_failed",
        StoreError::Db(_) => "db_failed",
        StoreError::Io(_) => "io_failed",
        StoreError::Serialization(_) => "serialization_failed",
        StoreError::InvalidData(_) => "invalid_data",
        StoreError::LockPoisoned => "lock_poisoned",
    }
}
