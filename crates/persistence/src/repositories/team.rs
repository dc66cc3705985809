//! Team repository for database operations.

use domain::models::team::{Team, TeamMember, TeamRole};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::team::{TeamEntity, TeamMemberEntity};
use crate::metrics::QueryTimer;

const TEAM_COLUMNS: &str = "id, name, org_id, parent_team_id, created_at, updated_at";

/// Repository for team database operations.
#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new team inside an org.
    pub async fn create(
        &self,
        name: &str,
        org_id: Uuid,
        parent_team_id: Option<Uuid>,
    ) -> Result<Team, sqlx::Error> {
        let timer = QueryTimer::new("create_team");
        let query = format!(
            "INSERT INTO teams (name, org_id, parent_team_id) VALUES ($1, $2, $3) RETURNING {}",
            TEAM_COLUMNS
        );
        let entity = sqlx::query_as::<_, TeamEntity>(&query)
            .bind(name)
            .bind(org_id)
            .bind(parent_team_id)
            .fetch_one(&self.pool)
            .await?;
        timer.record();

        Ok(entity.into())
    }

    /// Find a team by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, sqlx::Error> {
        let timer = QueryTimer::new("find_team_by_id");
        let query = format!("SELECT {} FROM teams WHERE id = $1", TEAM_COLUMNS);
        let entity = sqlx::query_as::<_, TeamEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();

        Ok(entity.map(Into::into))
    }

    /// List the teams of one org, alphabetically.
    pub async fn list_by_org(&self, org_id: Uuid) -> Result<Vec<Team>, sqlx::Error> {
        let timer = QueryTimer::new("list_teams_by_org");
        let query = format!(
            "SELECT {} FROM teams WHERE org_id = $1 ORDER BY name ASC",
            TEAM_COLUMNS
        );
        let entities = sqlx::query_as::<_, TeamEntity>(&query)
            .bind(org_id)
            .fetch_all(&self.pool)
            .await?;
        timer.record();

        Ok(entities.into_iter().map(Into::into).collect())
    }

    /// Update a team's mutable fields.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        parent_team_id: Option<Uuid>,
    ) -> Result<Option<Team>, sqlx::Error> {
        let timer = QueryTimer::new("update_team");
        let query = format!(
            r#"
            UPDATE teams
            SET
                name = COALESCE($2, name),
                parent_team_id = COALESCE($3, parent_team_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TEAM_COLUMNS
        );
        let entity = sqlx::query_as::<_, TeamEntity>(&query)
            .bind(id)
            .bind(name)
            .bind(parent_team_id)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();

        Ok(entity.map(Into::into))
    }

    /// Delete a team. Membership rows cascade.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_team");
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();

        Ok(result.rows_affected() > 0)
    }

    /// Add (or re-role) a member of a team.
    pub async fn add_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<TeamMember, sqlx::Error> {
        let timer = QueryTimer::new("add_team_member");
        let entity = sqlx::query_as::<_, TeamMemberEntity>(
            r#"
            INSERT INTO team_members (team_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (team_id, user_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING team_id, user_id, role
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(role.to_string())
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        entity.try_into()
    }

    /// Remove a member from a team.
    pub async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("remove_team_member");
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        timer.record();

        Ok(result.rows_affected() > 0)
    }

    /// List the members of a team.
    pub async fn list_members(&self, team_id: Uuid) -> Result<Vec<TeamMember>, sqlx::Error> {
        let timer = QueryTimer::new("list_team_members");
        let entities = sqlx::query_as::<_, TeamMemberEntity>(
            "SELECT team_id, user_id, role FROM team_members WHERE team_id = $1",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        timer.record();

        entities.into_iter().map(TryInto::try_into).collect()
    }
}
