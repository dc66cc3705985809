//! Repository implementations.

pub mod organization;
pub mod resource;
pub mod team;
pub mod user;

pub use organization::OrgRepository;
pub use resource::ResourceRepository;
pub use team::TeamRepository;
pub use user::UserRepository;
