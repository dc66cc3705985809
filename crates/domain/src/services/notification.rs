//! Notification request construction.
//!
//! The lifecycle layer only builds structured notification requests; an
//! external sink renders and delivers them. Link fields hold relative action
//! paths which the sink resolves against its configured base URL.

use serde::Serialize;

/// A notification the lifecycle layer wants delivered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationRequest {
    /// Sent to the new owner when a resource is reassigned.
    Assignment {
        to: String,
        cur_user: String,
        prev_user: Option<String>,
        device_name: String,
        ack_path: String,
        deny_path: String,
    },
    /// Sent to the current user, device admin and previous user (if any)
    /// when a resource enters dispute.
    Dispute {
        to: Vec<String>,
        cur_user: String,
        prev_user: Option<String>,
        device_admin: String,
        device_name: String,
        device_path: String,
    },
}

impl NotificationRequest {
    /// All recipient addresses for this notification.
    pub fn recipients(&self) -> Vec<&str> {
        match self {
            NotificationRequest::Assignment { to, .. } => vec![to.as_str()],
            NotificationRequest::Dispute { to, .. } => to.iter().map(String::as_str).collect(),
        }
    }
}
