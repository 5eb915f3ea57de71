//! Repository layer over the active item store.
//!
//! # Responsibility
//! - Expose the backend-agnostic item CRUD/query surface to callers.
//! - Convert every storage failure into a sentinel result plus a log event.
//!
//! # Invariants
//! - Nothing raised by a store crosses the repository's public surface.
//! - Drafts and edits are validated before they reach storage.

pub mod item_repo;
