//! Application services.

pub mod notification;

pub use notification::Notifier;
