//! Team API routes.
//!
//! Teams live inside one org and may nest through a parent team. Membership
//! rows carry a member/admin role.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::models::team::{AddTeamMemberRequest, CreateTeamRequest, Team, TeamRole, UpdateTeamRequest};
use domain::services::RequestContext;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use persistence::repositories::{TeamRepository, UserRepository};

/// Team detail with its member list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetailResponse {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<domain::models::team::TeamMember>,
}

/// Load a team and hide it from foreign orgs.
async fn fetch_scoped(
    repo: &TeamRepository,
    team_id: Uuid,
    ctx: &RequestContext,
) -> Result<Team, ApiError> {
    repo.find_by_id(team_id)
        .await?
        .filter(|t| t.org_id == ctx.org_id)
        .ok_or_else(|| ApiError::NotFound(format!("Team {} not found", team_id)))
}

/// POST /api/v1/teams
pub async fn create_team(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateTeamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = TeamRepository::new(state.pool.clone());

    // A parent team must exist in the same org
    if let Some(parent_id) = request.parent_team_id {
        fetch_scoped(&repo, parent_id, &ctx).await.map_err(|_| {
            ApiError::Validation(format!("Parent team {} is not in your organization", parent_id))
        })?;
    }

    let team = repo
        .create(&request.name, ctx.org_id, request.parent_team_id)
        .await?;

    info!(
        actor = %ctx.actor.email,
        team_id = %team.id,
        name = %team.name,
        "Created team"
    );

    Ok((StatusCode::CREATED, Json(team)))
}

/// GET /api/v1/teams
pub async fn list_teams(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = TeamRepository::new(state.pool.clone());
    let teams = repo.list_by_org(ctx.org_id).await?;
    Ok(Json(teams))
}

/// GET /api/v1/teams/:team_id
pub async fn get_team(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(team_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = TeamRepository::new(state.pool.clone());
    let team = fetch_scoped(&repo, team_id, &ctx).await?;
    let members = repo.list_members(team_id).await?;

    Ok(Json(TeamDetailResponse { team, members }))
}

/// PUT /api/v1/teams/:team_id
pub async fn update_team(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(team_id): Path<Uuid>,
    Json(request): Json<UpdateTeamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = TeamRepository::new(state.pool.clone());
    fetch_scoped(&repo, team_id, &ctx).await?;

    if let Some(parent_id) = request.parent_team_id {
        if parent_id == team_id {
            return Err(ApiError::Validation("A team cannot be its own parent".into()));
        }
        fetch_scoped(&repo, parent_id, &ctx).await.map_err(|_| {
            ApiError::Validation(format!("Parent team {} is not in your organization", parent_id))
        })?;
    }

    let team = repo
        .update(team_id, request.name.as_deref(), request.parent_team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Team {} not found", team_id)))?;

    info!(actor = %ctx.actor.email, team_id = %team.id, "Updated team");

    Ok(Json(team))
}

/// DELETE /api/v1/teams/:team_id
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(team_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = TeamRepository::new(state.pool.clone());
    fetch_scoped(&repo, team_id, &ctx).await?;

    repo.delete(team_id).await?;

    info!(actor = %ctx.actor.email, team_id = %team_id, "Deleted team");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/teams/:team_id/members/:user_id
pub async fn add_team_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AddTeamMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = TeamRepository::new(state.pool.clone());
    fetch_scoped(&repo, team_id, &ctx).await?;

    // The member must belong to the same org
    let user_repo = UserRepository::new(state.pool.clone());
    user_repo
        .find_by_id(user_id)
        .await?
        .filter(|u| u.org_id == Some(ctx.org_id))
        .ok_or_else(|| {
            ApiError::Validation(format!("User {} is not in your organization", user_id))
        })?;

    let role = request.role.unwrap_or(TeamRole::Member);
    let member = repo.add_member(team_id, user_id, role).await?;

    info!(
        actor = %ctx.actor.email,
        team_id = %team_id,
        user_id = %user_id,
        role = %role,
        "Added team member"
    );

    Ok((StatusCode::CREATED, Json(member)))
}

/// DELETE /api/v1/teams/:team_id/members/:user_id
pub async fn remove_team_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = TeamRepository::new(state.pool.clone());
    fetch_scoped(&repo, team_id, &ctx).await?;

    let removed = repo.remove_member(team_id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound(format!(
            "User {} is not a member of team {}",
            user_id, team_id
        )));
    }

    info!(
        actor = %ctx.actor.email,
        team_id = %team_id,
        user_id = %user_id,
        "Removed team member"
    );

    Ok(StatusCode::NO_CONTENT)
}
