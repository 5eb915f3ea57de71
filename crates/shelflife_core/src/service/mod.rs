//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into startup, maintenance and reminder flows.
//! - Keep delivery/UI collaborators decoupled from storage details.

pub mod entitlement;
pub mod maintenance;
pub mod reminder;
pub mod runtime;
