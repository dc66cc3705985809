//! HTTP route handlers.

pub mod health;
pub mod organizations;
pub mod resources;
pub mod teams;
pub mod users;
