//! Item record, draft input and update contracts.
//!
//! # Responsibility
//! - Define the persisted item shape and its JSON field naming.
//! - Fill defaults for omitted draft fields.
//! - Validate and canonicalize caller input before it reaches storage.
//!
//! # Invariants
//! - `name` is non-empty on every write path. Trimming is left to callers.
//! - `expiry_date` is written in canonical `YYYY-MM-DD` form.
//! - `quantity` is positive on every write path.
//! - `is_expired` is a cache refreshed by the maintenance job, not ground truth.

use crate::expiry::canonical_expiry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier generated by the active backend on insert.
pub type ItemId = i64;

pub const DEFAULT_QUANTITY: u32 = 1;
pub const DEFAULT_REMINDER_DAYS: u32 = 3;

/// Fixed category label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    PackedFood,
    Meat,
    Vegetable,
    Fruit,
    Drinks,
    Medicine,
    Dairy,
    #[default]
    Other,
}

impl Category {
    /// Every known category in display order.
    pub const ALL: [Category; 8] = [
        Category::PackedFood,
        Category::Meat,
        Category::Vegetable,
        Category::Fruit,
        Category::Drinks,
        Category::Medicine,
        Category::Dairy,
        Category::Other,
    ];

    /// Returns the persisted label.
    pub fn label(self) -> &'static str {
        match self {
            Self::PackedFood => "Packed Food",
            Self::Meat => "Meat",
            Self::Vegetable => "Vegetable",
            Self::Fruit => "Fruit",
            Self::Drinks => "Drinks",
            Self::Medicine => "Medicine",
            Self::Dairy => "Dairy",
            Self::Other => "Other",
        }
    }

    /// Resolves free text to a category.
    ///
    /// Exact label first, then case-insensitive; unknown text maps to `Other`.
    pub fn from_label(value: &str) -> Self {
        let trimmed = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.label() == trimmed)
            .or_else(|| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|category| category.label().eq_ignore_ascii_case(trimmed))
            })
            .unwrap_or(Self::Other)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.label().to_string()
    }
}

/// Persisted item record.
///
/// Field names serialize in camelCase to match the fallback document layout
/// and the `items` table columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Canonical `YYYY-MM-DD` on write; tolerated as arbitrary text on read.
    pub expiry_date: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub notes: Option<String>,
    pub added_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_expired: bool,
    #[serde(default = "default_reminder_days")]
    pub reminder_days: u32,
}

/// Fully resolved insert payload. The backend assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub expiry_date: String,
    pub category: Category,
    pub quantity: u32,
    pub notes: Option<String>,
    pub added_date: DateTime<Utc>,
    pub reminder_days: u32,
}

impl NewItem {
    /// Attaches the backend-generated id. New records start unexpired.
    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            name: self.name,
            expiry_date: self.expiry_date,
            category: self.category,
            quantity: self.quantity,
            notes: self.notes,
            added_date: self.added_date,
            is_expired: false,
            reminder_days: self.reminder_days,
        }
    }
}

/// Caller input for add/scan flows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub expiry_date: String,
    pub category: Option<Category>,
    /// `None` or `Some(0)` take the default quantity.
    pub quantity: Option<u32>,
    pub notes: Option<String>,
    /// `None` takes the default; `Some(0)` means a reminder on the expiry day.
    pub reminder_days: Option<u32>,
    /// Defaults to the insert time.
    pub added_date: Option<DateTime<Utc>>,
}

impl ItemDraft {
    pub fn new(name: impl Into<String>, expiry_date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expiry_date: expiry_date.into(),
            ..Self::default()
        }
    }

    /// Validates required fields and fills defaults.
    ///
    /// # Errors
    /// - `EmptyName` when `name` is empty.
    /// - `InvalidExpiryDate` when `expiry_date` does not parse to a date.
    pub fn into_new_item(self, now: DateTime<Utc>) -> Result<NewItem, ItemValidationError> {
        validate_name(&self.name)?;
        let expiry_date = validate_expiry(&self.expiry_date)?;

        Ok(NewItem {
            name: self.name,
            expiry_date,
            category: self.category.unwrap_or_default(),
            quantity: match self.quantity {
                None | Some(0) => DEFAULT_QUANTITY,
                Some(value) => value,
            },
            notes: normalize_notes(self.notes),
            added_date: self.added_date.unwrap_or(now),
            reminder_days: self.reminder_days.unwrap_or(DEFAULT_REMINDER_DAYS),
        })
    }
}

/// Full replacement of every mutable item field.
///
/// `id` and `added_date` are not part of the contract and never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: String,
    pub expiry_date: String,
    pub category: Category,
    pub quantity: u32,
    pub notes: Option<String>,
    pub reminder_days: u32,
    pub is_expired: bool,
}

impl ItemChanges {
    /// Starts an edit from the current state of a record.
    pub fn from_item(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            expiry_date: item.expiry_date.clone(),
            category: item.category,
            quantity: item.quantity,
            notes: item.notes.clone(),
            reminder_days: item.reminder_days,
            is_expired: item.is_expired,
        }
    }

    /// Validates the edit and returns it with a canonical expiry date.
    pub fn validated(self) -> Result<Self, ItemValidationError> {
        validate_name(&self.name)?;
        let expiry_date = validate_expiry(&self.expiry_date)?;
        if self.quantity == 0 {
            return Err(ItemValidationError::ZeroQuantity);
        }

        Ok(Self {
            expiry_date,
            notes: normalize_notes(self.notes),
            ..self
        })
    }

    /// Applies this edit onto an existing record in place.
    pub fn apply_to(&self, item: &mut Item) {
        item.name = self.name.clone();
        item.expiry_date = self.expiry_date.clone();
        item.category = self.category;
        item.quantity = self.quantity;
        item.notes = self.notes.clone();
        item.reminder_days = self.reminder_days;
        item.is_expired = self.is_expired;
    }
}

/// Domain validation error for item writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    EmptyName,
    InvalidExpiryDate(String),
    ZeroQuantity,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "item name must not be empty"),
            Self::InvalidExpiryDate(value) => {
                write!(f, "expiry date `{value}` is not a valid calendar date")
            }
            Self::ZeroQuantity => write!(f, "quantity must be a positive integer"),
        }
    }
}

impl Error for ItemValidationError {}

fn validate_name(name: &str) -> Result<(), ItemValidationError> {
    if name.is_empty() {
        return Err(ItemValidationError::EmptyName);
    }
    Ok(())
}

fn validate_expiry(value: &str) -> Result<String, ItemValidationError> {
    canonical_expiry(value).ok_or_else(|| ItemValidationError::InvalidExpiryDate(value.to_string()))
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|value| !value.is_empty())
}

fn default_quantity() -> u32 {
    DEFAULT_QUANTITY
}

fn default_reminder_days() -> u32 {
    DEFAULT_REMINDER_DAYS
}

// Older documents stored the flag as 0/1.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    })
}
