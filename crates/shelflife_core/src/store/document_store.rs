//! Flat JSON document store used when SQLite is unavailable.
//!
//! # Responsibility
//! - Keep the whole item collection in one named JSON blob.
//! - Keep preferences in a second named blob.
//!
//! # Invariants
//! - Every write is a read-modify-write of the whole collection; concurrent
//!   writers race with last-writer-wins.
//! - A missing blob reads as empty; a corrupt blob is an error, so a failed
//!   read never leads to overwriting stored items.
//! - Operations that change nothing perform no write.
//! - Ids are strictly increasing for the lifetime of a store instance and seeded
//!   from the wall clock, so restarts do not reuse ids.

use super::{select_expired, select_expiring, ItemStore, StoreResult};
use crate::expiry::is_expired_at_str;
use crate::model::item::{Item, ItemChanges, ItemId, NewItem};
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

/// Fixed storage key holding the item collection.
pub const ITEMS_STORAGE_KEY: &str = "@expiry_items_v1";
/// Fixed storage key holding preference flags.
pub const PREFERENCES_STORAGE_KEY: &str = "@expiry_prefs_v1";

/// Fallback backend rooted at a data directory.
pub struct DocumentItemStore {
    dir: PathBuf,
    last_issued_id: AtomicI64,
}

impl DocumentItemStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_issued_id: AtomicI64::new(0),
        }
    }

    /// File backing a storage key, e.g. `@expiry_items_v1` -> `expiry_items_v1.json`.
    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", key.trim_start_matches('@')))
    }

    fn load_items(&self) -> StoreResult<Vec<Item>> {
        match read_blob(&self.blob_path(ITEMS_STORAGE_KEY))? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_items(&self, items: &[Item]) -> StoreResult<()> {
        let raw = serde_json::to_string(items)?;
        write_blob(&self.blob_path(ITEMS_STORAGE_KEY), &raw)
    }

    fn load_preferences(&self) -> StoreResult<BTreeMap<String, String>> {
        match read_blob(&self.blob_path(PREFERENCES_STORAGE_KEY))? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(BTreeMap::new()),
        }
    }

    fn next_id(&self, items: &[Item], now: DateTime<Utc>) -> ItemId {
        let floor = items
            .iter()
            .map(|item| item.id)
            .max()
            .unwrap_or(0)
            .max(now.timestamp_millis() - 1);
        let previous = match self.last_issued_id.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |last| Some(last.max(floor) + 1),
        ) {
            Ok(value) | Err(value) => value,
        };
        previous.max(floor) + 1
    }
}

impl ItemStore for DocumentItemStore {
    fn add(&self, item: &NewItem) -> StoreResult<ItemId> {
        let mut items = self.load_items()?;
        let id = self.next_id(&items, Utc::now());
        items.push(item.clone().into_item(id));
        self.save_items(&items)?;
        debug!(
            "event=item_add module=store backend=document status=ok item_id={}",
            id
        );
        Ok(id)
    }

    fn get(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.load_items()?.into_iter().find(|item| item.id == id))
    }

    fn get_all(&self) -> StoreResult<Vec<Item>> {
        let mut items = self.load_items()?;
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    fn get_expiring(&self, days: u32, now: DateTime<Utc>) -> StoreResult<Vec<Item>> {
        Ok(select_expiring(self.load_items()?, days, now))
    }

    fn get_expired(&self) -> StoreResult<Vec<Item>> {
        Ok(select_expired(self.load_items()?))
    }

    fn update(&self, id: ItemId, changes: &ItemChanges) -> StoreResult<usize> {
        let mut items = self.load_items()?;
        let Some(target) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(0);
        };
        changes.apply_to(target);
        self.save_items(&items)?;
        Ok(1)
    }

    fn delete(&self, id: ItemId) -> StoreResult<bool> {
        let mut items = self.load_items()?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.save_items(&items)?;
        Ok(true)
    }

    fn refresh_expired_flags(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut items = self.load_items()?;
        let mut updated = 0;
        for item in items.iter_mut().filter(|item| !item.is_expired) {
            if is_expired_at_str(&item.expiry_date, now) == Some(true) {
                item.is_expired = true;
                updated += 1;
            }
        }
        if updated > 0 {
            self.save_items(&items)?;
        }

        debug!(
            "event=expired_flags_refresh module=store backend=document status=ok updated={}",
            updated
        );
        Ok(updated)
    }

    fn read_preference(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.load_preferences()?.remove(key))
    }

    fn write_preference(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut preferences = self.load_preferences()?;
        preferences.insert(key.to_string(), value.to_string());
        let raw = serde_json::to_string(&preferences)?;
        write_blob(&self.blob_path(PREFERENCES_STORAGE_KEY), &raw)
    }
}

fn read_blob(path: &Path) -> StoreResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

// Write-then-rename so a crash mid-write never leaves a truncated blob.
fn write_blob(path: &Path, raw: &str) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, raw)?;
    fs::rename(&staging, path)?;
    Ok(())
}
