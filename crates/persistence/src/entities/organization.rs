//! Organization entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the organizations table.
#[derive(Debug, Clone, FromRow)]
pub struct OrgEntity {
    pub id: Uuid,
    pub name: String,
    pub admin_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrgEntity> for domain::models::Org {
    fn from(entity: OrgEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            admin_id: entity.admin_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
