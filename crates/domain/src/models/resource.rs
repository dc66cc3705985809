//! Resource domain models.
//!
//! A resource is a trackable physical asset (laptop, phone, monitor) owned by
//! a user inside one organization, moving between users through the
//! assign/acknowledge/dispute workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::history::StoredHistory;

/// Lifecycle status of a resource.
///
/// Persisted as short string tokens; external callers must treat these as a
/// closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Not assigned to any user.
    Unassigned,
    /// Assigned to a user who has not yet acknowledged it.
    Assigned,
    /// The assigned user confirmed the resource is with them.
    Acknowledged,
    /// The nominal current owner denies possessing the resource.
    Disputed,
}

impl ResourceStatus {
    /// The token stored in the database and exposed in journal entries.
    pub fn as_token(&self) -> &'static str {
        match self {
            ResourceStatus::Unassigned => "R_UASS",
            ResourceStatus::Assigned => "R_ASS",
            ResourceStatus::Acknowledged => "R_ACK",
            ResourceStatus::Disputed => "R_DISP",
        }
    }
}

impl FromStr for ResourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R_UASS" => Ok(ResourceStatus::Unassigned),
            "R_ASS" => Ok(ResourceStatus::Assigned),
            "R_ACK" => Ok(ResourceStatus::Acknowledged),
            "R_DISP" => Ok(ResourceStatus::Disputed),
            _ => Err(format!("Unknown resource status token: {}", s)),
        }
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

/// Hydrated reference to a user owning or administering a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Resource domain model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub serial_num: String,
    pub current_user: UserRef,
    pub previous_user: Option<UserRef>,
    pub device_admin: UserRef,
    pub status: ResourceStatus,
    pub description: String,
    pub org_id: Uuid,
    #[serde(skip)]
    pub history: StoredHistory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Relative acknowledge action path, embedded into assignment mails.
    pub fn acknowledge_path(&self) -> String {
        format!("/api/v1/resources/{}/acknowledge", self.id)
    }

    /// Relative deny action path, embedded into assignment mails.
    pub fn deny_path(&self) -> String {
        format!("/api/v1/resources/{}/deny", self.id)
    }

    /// Relative detail path, embedded into dispute mails.
    pub fn detail_path(&self) -> String {
        format!("/api/v1/resources/{}", self.id)
    }
}

/// Request body for creating a resource.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,
    #[validate(custom(function = "shared::validation::validate_serial_num"))]
    pub serial_num: String,
    pub current_user_id: Uuid,
    pub device_admin_id: Uuid,
    /// Only Unassigned or Assigned are accepted at creation; defaults to
    /// Unassigned.
    pub status: Option<ResourceStatus>,
    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_description"))]
    pub description: String,
}

/// Request body for updating a resource.
///
/// A changed `current_user_id` drives the reassignment transition; the other
/// fields are plain edits.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: Option<String>,
    #[validate(custom(function = "shared::validation::validate_serial_num"))]
    pub serial_num: Option<String>,
    pub current_user_id: Option<Uuid>,
    pub device_admin_id: Option<Uuid>,
    #[validate(custom(function = "shared::validation::validate_description"))]
    pub description: Option<String>,
}

/// Query parameters for listing resources.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesQuery {
    pub status: Option<ResourceStatus>,
    pub current_user_id: Option<Uuid>,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// Response for resource listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesResponse {
    pub data: Vec<Resource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Query parameters for resource search.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQueryParams {
    pub q: String,
    pub limit: Option<i64>,
}

/// Query parameters for name autocomplete.
#[derive(Debug, Clone, Deserialize)]
pub struct AutocompleteParams {
    pub query: String,
}

/// Response for name autocomplete, a plain object rather than a bare list.
#[derive(Debug, Clone, Serialize)]
pub struct AutocompleteResponse {
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_token_roundtrip() {
        for status in [
            ResourceStatus::Unassigned,
            ResourceStatus::Assigned,
            ResourceStatus::Acknowledged,
            ResourceStatus::Disputed,
        ] {
            assert_eq!(ResourceStatus::from_str(status.as_token()).unwrap(), status);
        }
    }

    #[test]
    fn test_status_tokens_are_stable() {
        assert_eq!(ResourceStatus::Unassigned.to_string(), "R_UASS");
        assert_eq!(ResourceStatus::Assigned.to_string(), "R_ASS");
        assert_eq!(ResourceStatus::Acknowledged.to_string(), "R_ACK");
        assert_eq!(ResourceStatus::Disputed.to_string(), "R_DISP");
    }

    #[test]
    fn test_status_rejects_unknown_token() {
        assert!(ResourceStatus::from_str("R_LOST").is_err());
    }

    #[test]
    fn test_action_paths_embed_id() {
        let id = Uuid::new_v4();
        let resource = Resource {
            id,
            name: "Laptop-12".into(),
            serial_num: "SN-1".into(),
            current_user: UserRef {
                id: Uuid::new_v4(),
                name: "Alice".into(),
                email: "alice@example.com".into(),
            },
            previous_user: None,
            device_admin: UserRef {
                id: Uuid::new_v4(),
                name: "Root".into(),
                email: "root@example.com".into(),
            },
            status: ResourceStatus::Assigned,
            description: String::new(),
            org_id: Uuid::new_v4(),
            history: StoredHistory::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(
            resource.acknowledge_path(),
            format!("/api/v1/resources/{}/acknowledge", id)
        );
        assert_eq!(resource.deny_path(), format!("/api/v1/resources/{}/deny", id));
    }
}
