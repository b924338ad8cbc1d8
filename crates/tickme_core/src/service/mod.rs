//! Planner use-case services.
//!
//! # Responsibility
//! - Own the three task stores over one shared storage backend.
//! - Keep presentation layers decoupled from storage keys and layouts.

pub mod overview;
pub mod planner;
