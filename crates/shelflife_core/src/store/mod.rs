//! Item store capability and its concrete backends.
//!
//! # Responsibility
//! - Define the `ItemStore` contract implemented by every backend.
//! - Own the range/ordering rules both backends must apply identically.
//!
//! # Invariants
//! - `get_all` returns records in ascending `id` (insertion) order.
//! - `get_expiring` returns unexpired records inside the inclusive window,
//!   ascending by expiry date, ties by `id`.
//! - `get_expired` returns flagged records, descending by expiry date, ties by
//!   `id`, unparsable dates last.
//! - Unparsable expiry text never matches a date filter.

use crate::db::DbError;
use crate::expiry::{parse_expiry, within_window};
use crate::model::item::{Item, ItemChanges, ItemId, ItemValidationError, NewItem};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod document_store;
pub mod selector;
pub mod sqlite_store;

pub use document_store::DocumentItemStore;
pub use sqlite_store::SqliteItemStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer error. Absorbed into sentinels at the repository boundary.
#[derive(Debug)]
pub enum StoreError {
    Validation(ItemValidationError),
    Db(DbError),
    Io(std::io::Error),
    Serialization(serde_json::Error),
    InvalidData(String),
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "document io failed: {err}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
            Self::LockPoisoned => write!(f, "store connection lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<ItemValidationError> for StoreError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Persistence contract shared by the structured and fallback backends.
pub trait ItemStore: Send + Sync {
    /// Inserts a resolved item and returns its generated id.
    fn add(&self, item: &NewItem) -> StoreResult<ItemId>;
    fn get(&self, id: ItemId) -> StoreResult<Option<Item>>;
    fn get_all(&self) -> StoreResult<Vec<Item>>;
    fn get_expiring(&self, days: u32, now: DateTime<Utc>) -> StoreResult<Vec<Item>>;
    fn get_expired(&self) -> StoreResult<Vec<Item>>;
    /// Overwrites mutable fields. Returns the number of changed records (0 or 1).
    fn update(&self, id: ItemId, changes: &ItemChanges) -> StoreResult<usize>;
    /// Returns whether a record existed and was removed.
    fn delete(&self, id: ItemId) -> StoreResult<bool>;
    /// Sets `is_expired` on unflagged records whose expiry day has passed.
    ///
    /// Returns the number of records changed.
    fn refresh_expired_flags(&self, now: DateTime<Utc>) -> StoreResult<usize>;
    fn read_preference(&self, key: &str) -> StoreResult<Option<String>>;
    fn write_preference(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// Keeps unexpired records inside the window and orders them soonest first.
pub(crate) fn select_expiring(items: Vec<Item>, days: u32, now: DateTime<Utc>) -> Vec<Item> {
    let mut selected = items
        .into_iter()
        .filter(|item| !item.is_expired && within_window(&item.expiry_date, now, days))
        .collect::<Vec<_>>();
    selected.sort_by(|a, b| {
        parse_expiry(&a.expiry_date)
            .cmp(&parse_expiry(&b.expiry_date))
            .then(a.id.cmp(&b.id))
    });
    selected
}

/// Keeps flagged records and orders them most recently expired first.
pub(crate) fn select_expired(items: Vec<Item>) -> Vec<Item> {
    let mut selected = items
        .into_iter()
        .filter(|item| item.is_expired)
        .collect::<Vec<_>>();
    selected.sort_by(|a, b| {
        let by_date = match (parse_expiry(&a.expiry_date), parse_expiry(&b.expiry_date)) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then(a.id.cmp(&b.id))
    });
    selected
}

#[cfg(test)]
mod tests {
    use super::{select_expired, select_expiring};
    use crate::model::item::{Category, Item};
    use chrono::{TimeZone, Utc};

    fn item(id: i64, expiry: &str, is_expired: bool) -> Item {
        Item {
            id,
            name: format!("item-{id}"),
            expiry_date: expiry.to_string(),
            category: Category::Other,
            quantity: 1,
            notes: None,
            added_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            is_expired,
            reminder_days: 3,
        }
    }

    #[test]
    fn expiring_selection_filters_and_orders() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap();
        let items = vec![
            item(1, "2026-10-22", false),
            item(2, "2026-10-18", false),
            item(3, "2026-10-18", true),
            item(4, "garbage", false),
            item(5, "2026-11-30", false),
            item(6, "2026-10-18", false),
        ];

        let ids = select_expiring(items, 7, now)
            .into_iter()
            .map(|item| item.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 6, 1]);
    }

    #[test]
    fn expired_selection_orders_most_recent_first_with_unparsable_last() {
        let items = vec![
            item(1, "2026-01-05", true),
            item(2, "???", true),
            item(3, "2026-03-01", true),
            item(4, "2026-02-01", false),
        ];

        let ids = select_expired(items)
            .into_iter()
            .map(|item| item.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
