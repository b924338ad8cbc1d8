//! Domain model shared by every planner granularity.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Completion state and completion timestamp change together.

pub mod task;
