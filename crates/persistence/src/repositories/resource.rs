//! Resource repository for database operations.

use domain::models::resource::{ListResourcesQuery, Resource, ResourceStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::resource::{
    ResourceRowEntity, RESOURCE_SELECT_COLUMNS, RESOURCE_SELECT_JOINS,
};
use crate::metrics::QueryTimer;

/// Maximum rows returned per resource listing page.
const MAX_PAGE_SIZE: i64 = 100;

/// Default rows per resource listing page.
const DEFAULT_PAGE_SIZE: i64 = 50;

/// Maximum suggestions returned by autocomplete.
const AUTOCOMPLETE_LIMIT: i64 = 5;

/// Repository for resource database operations.
#[derive(Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new resource.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: &str,
        serial_num: &str,
        current_user_id: Uuid,
        device_admin_id: Uuid,
        status: ResourceStatus,
        description: &str,
        org_id: Uuid,
        history: &str,
    ) -> Result<Resource, sqlx::Error> {
        let timer = QueryTimer::new("create_resource");
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO resources (name, serial_num, current_user_id, device_admin_id, status, description, org_id, history)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(serial_num)
        .bind(current_user_id)
        .bind(device_admin_id)
        .bind(status.as_token())
        .bind(description)
        .bind(org_id)
        .bind(history)
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        // Re-select hydrated with owner names/emails
        self.find_by_id(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Find a resource by ID with its users hydrated.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>, sqlx::Error> {
        let timer = QueryTimer::new("find_resource_by_id");
        let query = format!(
            "SELECT {} {} WHERE r.id = $1",
            RESOURCE_SELECT_COLUMNS, RESOURCE_SELECT_JOINS
        );

        let entity = sqlx::query_as::<_, ResourceRowEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();

        entity.map(Resource::try_from).transpose()
    }

    /// Persist the full mutable state of a resource, including its journal.
    ///
    /// Every lifecycle transition ends in exactly one call here, so the
    /// journal entry lands in the same write as the field changes.
    pub async fn save(&self, resource: &Resource) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("save_resource");
        let result = sqlx::query(
            r#"
            UPDATE resources
            SET
                name = $2,
                serial_num = $3,
                current_user_id = $4,
                previous_user_id = $5,
                device_admin_id = $6,
                status = $7,
                description = $8,
                history = $9,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(resource.id)
        .bind(&resource.name)
        .bind(&resource.serial_num)
        .bind(resource.current_user.id)
        .bind(resource.previous_user.as_ref().map(|u| u.id))
        .bind(resource.device_admin.id)
        .bind(resource.status.as_token())
        .bind(&resource.description)
        .bind(resource.history.to_stored())
        .execute(&self.pool)
        .await?;
        timer.record();

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    /// Delete a resource.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_resource");
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();

        Ok(result.rows_affected() > 0)
    }

    /// List resources of one org with keyset pagination, newest-updated first.
    ///
    /// Returns the page plus the cursor for the next one, if any.
    pub async fn list(
        &self,
        org_id: Uuid,
        query: &ListResourcesQuery,
    ) -> Result<(Vec<Resource>, Option<String>), sqlx::Error> {
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let mut conditions = vec![format!("r.org_id = '{}'", org_id)];

        if let Some(status) = query.status {
            conditions.push(format!("r.status = '{}'", status.as_token()));
        }

        if let Some(user_id) = query.current_user_id {
            conditions.push(format!("r.current_user_id = '{}'", user_id));
        }

        if let Some(ref cursor) = query.cursor {
            let (ts, id) = shared::pagination::decode_cursor(cursor)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            conditions.push(format!(
                "(r.updated_at, r.id) < ('{}', '{}')",
                ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
                id
            ));
        }

        let sql = format!(
            "SELECT {} {} WHERE {} ORDER BY r.updated_at DESC, r.id DESC LIMIT $1",
            RESOURCE_SELECT_COLUMNS,
            RESOURCE_SELECT_JOINS,
            conditions.join(" AND ")
        );

        let timer = QueryTimer::new("list_resources");
        let entities = sqlx::query_as::<_, ResourceRowEntity>(&sql)
            // Fetch one extra row to know whether another page exists
            .bind(limit + 1)
            .fetch_all(&self.pool)
            .await?;
        timer.record();

        let mut resources = entities
            .into_iter()
            .map(Resource::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let next_cursor = if resources.len() as i64 > limit {
            resources.truncate(limit as usize);
            resources
                .last()
                .map(|r| shared::pagination::encode_cursor(r.updated_at, r.id))
        } else {
            None
        };

        Ok((resources, next_cursor))
    }

    /// Full-text-ish search over name, serial number and description.
    pub async fn search(
        &self,
        org_id: Uuid,
        term: &str,
        limit: i64,
    ) -> Result<Vec<Resource>, sqlx::Error> {
        let pattern = format!("%{}%", escape_like(term));
        let sql = format!(
            r#"SELECT {} {} WHERE r.org_id = $1
               AND (r.name ILIKE $2 OR r.serial_num ILIKE $2 OR r.description ILIKE $2)
               ORDER BY r.name ASC LIMIT $3"#,
            RESOURCE_SELECT_COLUMNS, RESOURCE_SELECT_JOINS
        );

        let timer = QueryTimer::new("search_resources");
        let entities = sqlx::query_as::<_, ResourceRowEntity>(&sql)
            .bind(org_id)
            .bind(pattern)
            .bind(limit.clamp(1, MAX_PAGE_SIZE))
            .fetch_all(&self.pool)
            .await?;
        timer.record();

        entities.into_iter().map(Resource::try_from).collect()
    }

    /// Name suggestions for search autocomplete.
    pub async fn autocomplete(&self, org_id: Uuid, prefix: &str) -> Result<Vec<String>, sqlx::Error> {
        let pattern = format!("{}%", escape_like(prefix));

        let timer = QueryTimer::new("autocomplete_resources");
        let names = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT name FROM resources WHERE org_id = $1 AND name ILIKE $2 ORDER BY name ASC LIMIT $3",
        )
            .bind(org_id)
            .bind(pattern)
            .bind(AUTOCOMPLETE_LIMIT)
            .fetch_all(&self.pool)
            .await?;
        timer.record();

        Ok(names)
    }

    /// Number of resources held (as owner or device admin) by a user.
    pub async fn count_in_name_of(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_resources_in_name");
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM resources WHERE current_user_id = $1 OR device_admin_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok(count)
    }
}

/// Escape LIKE metacharacters so a user-supplied term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
