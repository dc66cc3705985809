//! Notification delivery for resource lifecycle events.
//!
//! Renders assignment and dispute notifications and hands them to the
//! configured provider. The `console` provider logs the rendered message,
//! which is the default for development.

use domain::services::NotificationRequest;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::NotificationConfig;
use crate::middleware::metrics::record_notification_sent;

/// Errors that can occur during notification delivery.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Notification service not configured")]
    NotConfigured,

    #[error("Failed to send notification: {0}")]
    SendFailed(String),
}

/// Rendered notification message.
#[derive(Debug, Clone)]
struct Message {
    to: Vec<String>,
    subject: String,
    body: String,
}

/// Notification service for lifecycle events.
#[derive(Clone)]
pub struct Notifier {
    config: Arc<NotificationConfig>,
}

impl Notifier {
    /// Creates a new notifier with the given configuration.
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Deliver every notification produced by a lifecycle transition.
    ///
    /// Delivery is best-effort: failures are logged and never fail the
    /// request that triggered them.
    pub async fn deliver_all(&self, requests: &[NotificationRequest]) {
        for request in requests {
            if let Err(e) = self.send(request).await {
                error!(error = %e, "Failed to deliver notification");
            }
        }
    }

    /// Send a single notification.
    pub async fn send(&self, request: &NotificationRequest) -> Result<(), NotifierError> {
        if !self.config.enabled {
            debug!("Notification service disabled, skipping send");
            return Ok(());
        }

        let (kind, message) = match request {
            NotificationRequest::Assignment { .. } => ("assignment", self.render_assignment(request)),
            NotificationRequest::Dispute { .. } => ("dispute", self.render_dispute(request)),
        };

        let message = match message {
            Some(m) => m,
            None => return Ok(()),
        };

        match self.config.provider.as_str() {
            "console" => {
                self.send_console(&message);
                record_notification_sent(kind);
                Ok(())
            }
            provider => {
                error!(provider = %provider, "Unknown notification provider");
                Err(NotifierError::NotConfigured)
            }
        }
    }

    fn send_console(&self, message: &Message) {
        info!(
            to = ?message.to,
            subject = %message.subject,
            from = %format!("{} <{}>", self.config.sender_name, self.config.sender_email),
            body = %message.body,
            "Notification (console provider)"
        );
    }

    /// Join an action path onto the configured base URL.
    fn link(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn render_assignment(&self, request: &NotificationRequest) -> Option<Message> {
        let NotificationRequest::Assignment {
            to,
            cur_user,
            prev_user,
            device_name,
            ack_path,
            deny_path,
        } = request
        else {
            return None;
        };

        let subject = format!("Device assigned to you: {}", device_name);
        let handover = match prev_user {
            Some(prev) => format!("It was previously held by {}.", prev),
            None => "It was previously unassigned.".to_string(),
        };

        let body = format!(
            r#"Hi {cur_user},

The device "{device_name}" has been assigned to you. {handover}

Please confirm that you have it:

  Acknowledge: {ack}
  Not mine:    {deny}

Best regards,
The {sender} Team"#,
            cur_user = cur_user,
            device_name = device_name,
            handover = handover,
            ack = self.link(ack_path),
            deny = self.link(deny_path),
            sender = self.config.sender_name,
        );

        Some(Message {
            to: vec![to.clone()],
            subject,
            body,
        })
    }

    fn render_dispute(&self, request: &NotificationRequest) -> Option<Message> {
        let NotificationRequest::Dispute {
            to,
            cur_user,
            prev_user,
            device_admin,
            device_name,
            device_path,
        } = request
        else {
            return None;
        };

        let subject = format!("Assignment disputed: {}", device_name);
        let prev = match prev_user {
            Some(prev) => format!("Previous holder: {}.", prev),
            None => "No previous holder on record.".to_string(),
        };

        let body = format!(
            r#"The assignment of "{device_name}" to {cur_user} has been disputed.

{prev}
Device admin: {device_admin}.

Review the device here: {link}

Best regards,
The {sender} Team"#,
            device_name = device_name,
            cur_user = cur_user,
            prev = prev,
            device_admin = device_admin,
            link = self.link(device_path),
            sender = self.config.sender_name,
        );

        Some(Message {
            to: to.clone(),
            subject,
            body,
        })
    }
}
