//! Domain layer for the Trackzilla backend.
//!
//! This crate contains:
//! - Domain models (Resource, User, Org, Team, history journal)
//! - Business logic services (change-history engine, resource lifecycle)
//! - Domain error types

pub mod models;
pub mod services;
