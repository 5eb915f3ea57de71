//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical item record shared by every storage backend.
//! - Define the draft and full-replace update contracts used by callers.
//!
//! # Invariants
//! - Every record is identified by a stable `ItemId` generated on insert.
//! - `category` always resolves to a known label.

pub mod item;
