//! User repository for database operations.

use domain::models::User;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::user::UserEntity;
use crate::metrics::QueryTimer;

const USER_COLUMNS: &str = "id, email, name, is_active, org_id, created_at, updated_at";

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user inside an org.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        org_id: Option<Uuid>,
    ) -> Result<User, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let query = format!(
            "INSERT INTO users (email, name, org_id) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let entity = sqlx::query_as::<_, UserEntity>(&query)
            .bind(email)
            .bind(name)
            .bind(org_id)
            .fetch_one(&self.pool)
            .await?;
        timer.record();

        Ok(entity.into())
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let entity = sqlx::query_as::<_, UserEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();

        Ok(entity.map(Into::into))
    }

    /// List the users of one org, alphabetically.
    pub async fn list_by_org(&self, org_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
        let timer = QueryTimer::new("list_users_by_org");
        let query = format!(
            "SELECT {} FROM users WHERE org_id = $1 ORDER BY name ASC",
            USER_COLUMNS
        );
        let entities = sqlx::query_as::<_, UserEntity>(&query)
            .bind(org_id)
            .fetch_all(&self.pool)
            .await?;
        timer.record();

        Ok(entities.into_iter().map(Into::into).collect())
    }

    /// Update a user's mutable fields.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, sqlx::Error> {
        let timer = QueryTimer::new("update_user");
        let query = format!(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let entity = sqlx::query_as::<_, UserEntity>(&query)
            .bind(id)
            .bind(name)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();

        Ok(entity.map(Into::into))
    }

    /// Delete a user.
    ///
    /// Fails with a foreign-key violation while the user still has resources
    /// in their name; those must be reassigned or exited first.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_user");
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();

        Ok(result.rows_affected() > 0)
    }
}
