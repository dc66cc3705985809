//! Organization repository for database operations.

use domain::models::Org;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::organization::OrgEntity;
use crate::metrics::QueryTimer;

const ORG_COLUMNS: &str = "id, name, admin_id, created_at, updated_at";

/// Repository for organization database operations.
#[derive(Clone)]
pub struct OrgRepository {
    pool: PgPool,
}

impl OrgRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new organization.
    pub async fn create(&self, name: &str, admin_id: Option<Uuid>) -> Result<Org, sqlx::Error> {
        let timer = QueryTimer::new("create_org");
        let query = format!(
            "INSERT INTO organizations (name, admin_id) VALUES ($1, $2) RETURNING {}",
            ORG_COLUMNS
        );
        let entity = sqlx::query_as::<_, OrgEntity>(&query)
            .bind(name)
            .bind(admin_id)
            .fetch_one(&self.pool)
            .await?;
        timer.record();

        Ok(entity.into())
    }

    /// Find an organization by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Org>, sqlx::Error> {
        let timer = QueryTimer::new("find_org_by_id");
        let query = format!("SELECT {} FROM organizations WHERE id = $1", ORG_COLUMNS);
        let entity = sqlx::query_as::<_, OrgEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();

        Ok(entity.map(Into::into))
    }

    /// Update an organization's mutable fields.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        admin_id: Option<Uuid>,
    ) -> Result<Option<Org>, sqlx::Error> {
        let timer = QueryTimer::new("update_org");
        let query = format!(
            r#"
            UPDATE organizations
            SET
                name = COALESCE($2, name),
                admin_id = COALESCE($3, admin_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ORG_COLUMNS
        );
        let entity = sqlx::query_as::<_, OrgEntity>(&query)
            .bind(id)
            .bind(name)
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();

        Ok(entity.map(Into::into))
    }

    /// Delete an organization.
    ///
    /// Fails with a foreign-key violation while users, teams or resources
    /// still belong to the org.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_org");
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();

        Ok(result.rows_affected() > 0)
    }
}
