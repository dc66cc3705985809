//! User API routes.
//!
//! Users are tenant-scoped: every operation sees only the actor's org.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::models::user::{CreateUserRequest, UpdateUserRequest};
use domain::models::User;
use domain::services::RequestContext;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use persistence::repositories::{ResourceRepository, UserRepository};

/// Load a user and hide them from foreign orgs.
async fn fetch_scoped(
    repo: &UserRepository,
    user_id: Uuid,
    ctx: &RequestContext,
) -> Result<User, ApiError> {
    repo.find_by_id(user_id)
        .await?
        .filter(|u| u.org_id == Some(ctx.org_id))
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .create(&request.email, &request.name, Some(ctx.org_id))
        .await?;

    info!(
        actor = %ctx.actor.email,
        user_id = %user.id,
        email = %user.email,
        "Created user"
    );

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let users = repo.list_by_org(ctx.org_id).await?;
    Ok(Json(users))
}

/// GET /api/v1/users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user = fetch_scoped(&repo, user_id, &ctx).await?;
    Ok(Json(user))
}

/// PUT /api/v1/users/:user_id
pub async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = UserRepository::new(state.pool.clone());
    fetch_scoped(&repo, user_id, &ctx).await?;

    let user = repo
        .update(user_id, request.name.as_deref(), request.is_active)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))?;

    info!(actor = %ctx.actor.email, user_id = %user.id, "Updated user");

    Ok(Json(user))
}

/// DELETE /api/v1/users/:user_id
///
/// Refused with 409 while resources are still in the user's name; the
/// database RESTRICT constraint backstops the same rule.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    fetch_scoped(&repo, user_id, &ctx).await?;

    let resource_repo = ResourceRepository::new(state.pool.clone());
    let held = resource_repo.count_in_name_of(user_id).await?;
    if held > 0 {
        return Err(ApiError::Conflict(format!(
            "User still has {} resources in their name",
            held
        )));
    }

    repo.delete(user_id).await?;

    info!(actor = %ctx.actor.email, user_id = %user_id, "Deleted user");

    Ok(StatusCode::NO_CONTENT)
}
