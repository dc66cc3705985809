//! Organization API routes.
//!
//! The actor only ever sees their own org; foreign org IDs read as 404.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::models::organization::{CreateOrgRequest, UpdateOrgRequest};
use domain::services::RequestContext;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use persistence::repositories::OrgRepository;

/// POST /api/v1/organizations
///
/// Creates a fresh org with the actor as its admin unless another admin is
/// named. The actor's own tenancy does not change.
pub async fn create_organization(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateOrgRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = OrgRepository::new(state.pool.clone());
    let admin_id = request.admin_id.unwrap_or(ctx.actor.id);
    let org = repo.create(&request.name, Some(admin_id)).await?;

    info!(
        actor = %ctx.actor.email,
        org_id = %org.id,
        name = %org.name,
        "Created organization"
    );

    Ok((StatusCode::CREATED, Json(org)))
}

/// GET /api/v1/organizations
///
/// Listing is scoped to the actor's own org.
pub async fn list_organizations(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = OrgRepository::new(state.pool.clone());
    let org = repo
        .find_by_id(ctx.org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".into()))?;
    Ok(Json(vec![org]))
}

/// GET /api/v1/organizations/:org_id
pub async fn get_organization(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(org_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if org_id != ctx.org_id {
        return Err(ApiError::NotFound(format!(
            "Organization {} not found",
            org_id
        )));
    }

    let repo = OrgRepository::new(state.pool.clone());
    let org = repo
        .find_by_id(org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Organization {} not found", org_id)))?;

    Ok(Json(org))
}

/// PUT /api/v1/organizations/:org_id
pub async fn update_organization(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(org_id): Path<Uuid>,
    Json(request): Json<UpdateOrgRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    if org_id != ctx.org_id {
        return Err(ApiError::NotFound(format!(
            "Organization {} not found",
            org_id
        )));
    }

    let repo = OrgRepository::new(state.pool.clone());
    let org = repo
        .update(org_id, request.name.as_deref(), request.admin_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Organization {} not found", org_id)))?;

    info!(actor = %ctx.actor.email, org_id = %org.id, "Updated organization");

    Ok(Json(org))
}

/// DELETE /api/v1/organizations/:org_id
///
/// Refused with 409 while users, teams or resources still belong to the
/// org (RESTRICT constraints).
pub async fn delete_organization(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(org_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if org_id != ctx.org_id {
        return Err(ApiError::NotFound(format!(
            "Organization {} not found",
            org_id
        )));
    }

    let repo = OrgRepository::new(state.pool.clone());
    let deleted = repo.delete(org_id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!(
            "Organization {} not found",
            org_id
        )));
    }

    info!(actor = %ctx.actor.email, org_id = %org_id, "Deleted organization");

    Ok(StatusCode::NO_CONTENT)
}
