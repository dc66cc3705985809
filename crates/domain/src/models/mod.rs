//! Domain models for Trackzilla.

pub mod history;
pub mod organization;
pub mod resource;
pub mod team;
pub mod user;

pub use history::{FieldChange, HistoryLog, JournalEntry};
pub use organization::Org;
pub use resource::{Resource, ResourceStatus, UserRef};
pub use team::Team;
pub use user::User;
