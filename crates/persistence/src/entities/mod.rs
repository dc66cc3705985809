//! Database row mappings.

pub mod organization;
pub mod resource;
pub mod team;
pub mod user;
