//! Organization (tenant) domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Tenant boundary: resources and users belong to exactly one org at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Org {
    pub id: Uuid,
    pub name: String,
    /// Admin for the org, generally its creator. Set to null if the admin
    /// user row is removed.
    pub admin_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating an organization.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrgRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,
    pub admin_id: Option<Uuid>,
}

/// Request body for updating an organization.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrgRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: Option<String>,
    pub admin_id: Option<Uuid>,
}
