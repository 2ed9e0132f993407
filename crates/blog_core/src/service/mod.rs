//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Hand callers classified [`crate::error::AppError`] values only.

pub mod post_service;
pub mod taxonomy_service;
