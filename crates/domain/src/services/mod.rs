//! Business logic services.

pub mod history;
pub mod lifecycle;
pub mod notification;

pub use history::{Audited, ChangeTracker, HistoryPolicy};
pub use lifecycle::{
    acknowledge, authorize_delete, dispute, ensure_same_org, reassign, LifecycleError,
    RequestContext, Transition,
};
pub use notification::NotificationRequest;
