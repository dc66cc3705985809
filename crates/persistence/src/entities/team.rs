//! Team entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::team::TeamRole;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the teams table.
#[derive(Debug, Clone, FromRow)]
pub struct TeamEntity {
    pub id: Uuid,
    pub name: String,
    pub org_id: Uuid,
    pub parent_team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TeamEntity> for domain::models::Team {
    fn from(entity: TeamEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            org_id: entity.org_id,
            parent_team_id: entity.parent_team_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the team_members table.
#[derive(Debug, Clone, FromRow)]
pub struct TeamMemberEntity {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
}

impl TryFrom<TeamMemberEntity> for domain::models::team::TeamMember {
    type Error = sqlx::Error;

    fn try_from(entity: TeamMemberEntity) -> Result<Self, Self::Error> {
        let role = TeamRole::from_str(&entity.role).map_err(|e| sqlx::Error::Decode(e.into()))?;
        Ok(Self {
            team_id: entity.team_id,
            user_id: entity.user_id,
            role,
        })
    }
}
