//! Persistence layer for the practice backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - Query metrics
//!
//! SQL migrations live in `src/migrations` and are embedded by the API
//! binary with `sqlx::migrate!`.

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
