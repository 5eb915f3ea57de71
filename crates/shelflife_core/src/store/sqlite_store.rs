//! SQLite-backed item store.
//!
//! # Responsibility
//! - Persist items in the `items` table and preferences in `preferences`.
//! - Keep SQL details inside the structured backend.
//!
//! # Invariants
//! - The owned connection has the item schema in place before first use.
//! - One malformed row never fails a whole query: out-of-range `quantity` and
//!   `reminderDays` read as their defaults, unknown categories read as
//!   `Other`, and rows that still cannot be decoded are skipped with a warning.
//! - A NULL `isExpired` reads as unexpired in every query and in maintenance.
//! - Date-range filtering happens in Rust via the shared selection helpers so
//!   both backends classify expiry text identically.

use super::{select_expired, select_expiring, ItemStore, StoreError, StoreResult};
use crate::db::{ensure_schema, open_db, open_db_in_memory, DbResult};
use crate::expiry::is_expired_at_str;
use crate::model::item::{
    Category, Item, ItemChanges, ItemId, NewItem, DEFAULT_QUANTITY, DEFAULT_REMINDER_DAYS,
};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    expiryDate,
    category,
    quantity,
    notes,
    addedDate,
    isExpired,
    reminderDays
FROM items";

/// Structured backend owning one SQLite connection.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
}

impl SqliteItemStore {
    /// Opens (or creates) the database file and ensures the schema.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::wrap(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::wrap(open_db_in_memory()?))
    }

    /// Adopts an existing connection, ensuring the schema first.
    pub fn from_connection(conn: Connection) -> DbResult<Self> {
        ensure_schema(&conn)?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn query_items(&self, filter_sql: &str) -> StoreResult<Vec<Item>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} {filter_sql} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            if let Some(item) = decode_or_skip(row) {
                items.push(item);
            }
        }
        Ok(items)
    }
}

impl ItemStore for SqliteItemStore {
    fn add(&self, item: &NewItem) -> StoreResult<ItemId> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO items (
                name,
                expiryDate,
                category,
                quantity,
                notes,
                addedDate,
                isExpired,
                reminderDays
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7);",
            params![
                item.name.as_str(),
                item.expiry_date.as_str(),
                item.category.label(),
                item.quantity,
                item.notes.as_deref(),
                format_timestamp(item.added_date),
                item.reminder_days,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get(&self, id: ItemId) -> StoreResult<Option<Item>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        let item = match rows.next()? {
            Some(row) => decode_or_skip(row),
            None => None,
        };
        Ok(item)
    }

    fn get_all(&self) -> StoreResult<Vec<Item>> {
        self.query_items("")
    }

    fn get_expiring(&self, days: u32, now: DateTime<Utc>) -> StoreResult<Vec<Item>> {
        let candidates = self.query_items("WHERE COALESCE(isExpired, 0) = 0")?;
        Ok(select_expiring(candidates, days, now))
    }

    fn get_expired(&self) -> StoreResult<Vec<Item>> {
        let candidates = self.query_items("WHERE COALESCE(isExpired, 0) <> 0")?;
        Ok(select_expired(candidates))
    }

    fn update(&self, id: ItemId, changes: &ItemChanges) -> StoreResult<usize> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE items
             SET
                name = ?1,
                expiryDate = ?2,
                category = ?3,
                quantity = ?4,
                notes = ?5,
                reminderDays = ?6,
                isExpired = ?7
             WHERE id = ?8;",
            params![
                changes.name.as_str(),
                changes.expiry_date.as_str(),
                changes.category.label(),
                changes.quantity,
                changes.notes.as_deref(),
                changes.reminder_days,
                bool_to_int(changes.is_expired),
                id,
            ],
        )?;
        Ok(changed)
    }

    fn delete(&self, id: ItemId) -> StoreResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM items WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn refresh_expired_flags(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let stale_ids = {
            let mut stmt = tx.prepare(
                "SELECT id, expiryDate FROM items WHERE COALESCE(isExpired, 0) = 0;",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, ItemId>(0)?,
                    row.get::<_, Option<String>>(1).ok().flatten(),
                ))
            })?;
            let mut ids = Vec::new();
            for row in rows {
                let (id, expiry) = row?;
                let expired = expiry
                    .as_deref()
                    .and_then(|value| is_expired_at_str(value, now))
                    .unwrap_or(false);
                if expired {
                    ids.push(id);
                }
            }
            ids
        };

        let mut updated = 0;
        for id in &stale_ids {
            updated += tx.execute(
                "UPDATE items SET isExpired = 1 WHERE id = ?1 AND COALESCE(isExpired, 0) = 0;",
                [id],
            )?;
        }
        tx.commit()?;

        debug!(
            "event=expired_flags_refresh module=store backend=sqlite status=ok updated={}",
            updated
        );
        Ok(updated)
    }

    fn read_preference(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_preference(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }
}

fn decode_or_skip(row: &Row<'_>) -> Option<Item> {
    match parse_item_row(row) {
        Ok(item) => Some(item),
        Err(err) => {
            warn!(
                "event=item_row_decode module=store backend=sqlite status=skipped item_id={} error={}",
                row.get::<_, ItemId>("id")
                    .map(|id| id.to_string())
                    .unwrap_or_else(|_| "unknown".to_string()),
                err
            );
            None
        }
    }
}

fn parse_item_row(row: &Row<'_>) -> StoreResult<Item> {
    let id: ItemId = row.get("id")?;

    let quantity = row
        .get::<_, Option<i64>>("quantity")?
        .map(|value| {
            u32::try_from(value)
                .ok()
                .filter(|quantity| *quantity > 0)
                .unwrap_or_else(|| {
                    warn!(
                        "event=item_row_decode module=store backend=sqlite status=defaulted item_id={} field=quantity value={}",
                        id, value
                    );
                    DEFAULT_QUANTITY
                })
        })
        .unwrap_or(DEFAULT_QUANTITY);

    let reminder_days = row
        .get::<_, Option<i64>>("reminderDays")?
        .map(|value| {
            u32::try_from(value).unwrap_or_else(|_| {
                warn!(
                    "event=item_row_decode module=store backend=sqlite status=defaulted item_id={} field=reminderDays value={}",
                    id, value
                );
                DEFAULT_REMINDER_DAYS
            })
        })
        .unwrap_or(DEFAULT_REMINDER_DAYS);

    let is_expired = row
        .get::<_, Option<i64>>("isExpired")?
        .is_some_and(|value| value != 0);

    let added_text: Option<String> = row.get("addedDate")?;
    let added_date = added_text
        .as_deref()
        .and_then(parse_timestamp)
        .ok_or_else(|| {
            StoreError::InvalidData(format!(
                "invalid addedDate `{}` in items.addedDate for id {id}",
                added_text.as_deref().unwrap_or("NULL")
            ))
        })?;

    Ok(Item {
        id,
        name: row.get("name")?,
        expiry_date: row.get("expiryDate")?,
        category: row
            .get::<_, Option<String>>("category")?
            .map(|label| Category::from_label(&label))
            .unwrap_or_default(),
        quantity,
        notes: row.get("notes")?,
        added_date,
        is_expired,
        reminder_days,
    })
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// Column default `datetime('now')` writes `YYYY-MM-DD HH:MM:SS` in UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|timestamp| timestamp.and_utc())
        })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
