//! Blog domain model: posts and the tags/categories attached to them.
//!
//! # Responsibility
//! - Define the canonical data structures used by persistence and services.
//! - Keep association lists as in-memory views, never as columns.
//!
//! # Invariants
//! - Every persisted object is identified by a positive integer id.
//! - Deletion is represented by a `deleted_at` tombstone, not hard delete.

pub mod post;
pub mod slug;
pub mod taxonomy;
