//! Resource entity (database row mapping).
//!
//! Resource rows are always selected joined against the users table three
//! times so the owner, previous owner and device admin come back hydrated.

use chrono::{DateTime, Utc};
use domain::models::history::StoredHistory;
use domain::models::{Resource, ResourceStatus, UserRef};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the resources table, joined with its users.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceRowEntity {
    pub id: Uuid,
    pub name: String,
    pub serial_num: String,
    pub status: String,
    pub description: String,
    pub org_id: Uuid,
    pub history: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_user_id: Uuid,
    pub current_user_name: String,
    pub current_user_email: String,
    pub previous_user_id: Option<Uuid>,
    pub previous_user_name: Option<String>,
    pub previous_user_email: Option<String>,
    pub device_admin_id: Uuid,
    pub device_admin_name: String,
    pub device_admin_email: String,
}

/// Column list shared by every hydrating resource SELECT.
pub const RESOURCE_SELECT_COLUMNS: &str = r#"
    r.id, r.name, r.serial_num, r.status, r.description, r.org_id, r.history,
    r.created_at, r.updated_at,
    cu.id AS current_user_id, cu.name AS current_user_name, cu.email AS current_user_email,
    pu.id AS previous_user_id, pu.name AS previous_user_name, pu.email AS previous_user_email,
    da.id AS device_admin_id, da.name AS device_admin_name, da.email AS device_admin_email
"#;

/// Join clause pairing the column list above.
pub const RESOURCE_SELECT_JOINS: &str = r#"
    FROM resources r
    INNER JOIN users cu ON cu.id = r.current_user_id
    LEFT JOIN users pu ON pu.id = r.previous_user_id
    INNER JOIN users da ON da.id = r.device_admin_id
"#;

impl TryFrom<ResourceRowEntity> for Resource {
    type Error = sqlx::Error;

    fn try_from(entity: ResourceRowEntity) -> Result<Self, Self::Error> {
        let status =
            ResourceStatus::from_str(&entity.status).map_err(|e| sqlx::Error::Decode(e.into()))?;

        let previous_user = match (
            entity.previous_user_id,
            entity.previous_user_name,
            entity.previous_user_email,
        ) {
            (Some(id), Some(name), Some(email)) => Some(UserRef { id, name, email }),
            _ => None,
        };

        Ok(Self {
            id: entity.id,
            name: entity.name,
            serial_num: entity.serial_num,
            current_user: UserRef {
                id: entity.current_user_id,
                name: entity.current_user_name,
                email: entity.current_user_email,
            },
            previous_user,
            device_admin: UserRef {
                id: entity.device_admin_id,
                name: entity.device_admin_name,
                email: entity.device_admin_email,
            },
            status,
            description: entity.description,
            org_id: entity.org_id,
            history: StoredHistory::decode(&entity.history),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, history: &str) -> ResourceRowEntity {
        ResourceRowEntity {
            id: Uuid::new_v4(),
            name: "Laptop-12".into(),
            serial_num: "SN-12".into(),
            status: status.into(),
            description: String::new(),
            org_id: Uuid::new_v4(),
            history: history.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            current_user_id: Uuid::new_v4(),
            current_user_name: "Alice".into(),
            current_user_email: "alice@example.com".into(),
            previous_user_id: None,
            previous_user_name: None,
            previous_user_email: None,
            device_admin_id: Uuid::new_v4(),
            device_admin_name: "Root".into(),
            device_admin_email: "root@example.com".into(),
        }
    }

    #[test]
    fn test_row_conversion_parses_status_and_history() {
        let resource = Resource::try_from(row("R_ASS", "[]")).unwrap();
        assert_eq!(resource.status, ResourceStatus::Assigned);
        assert!(resource.history.journal().unwrap().is_empty());
        assert!(resource.previous_user.is_none());
    }

    #[test]
    fn test_row_conversion_rejects_unknown_status() {
        assert!(Resource::try_from(row("R_BOGUS", "[]")).is_err());
    }

    #[test]
    fn test_row_conversion_keeps_corrupt_history() {
        let resource = Resource::try_from(row("R_ACK", "{\"oops\":1}")).unwrap();
        assert!(resource.history.is_corrupt());
    }
}
