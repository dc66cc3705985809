//! Shared utilities and common types for the Trackzilla backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cursor-based pagination helpers
//! - Common validation logic

pub mod pagination;
pub mod validation;
