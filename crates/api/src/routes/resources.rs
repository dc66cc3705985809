//! Resource API routes.
//!
//! CRUD plus the lifecycle surface: reassignment through PUT, acknowledge
//! and deny actions, the change journal, and search/autocomplete.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::models::resource::{
    AutocompleteParams, AutocompleteResponse, CreateResourceRequest, ListResourcesQuery,
    ListResourcesResponse, SearchQueryParams, UpdateResourceRequest,
};
use domain::models::{HistoryLog, JournalEntry, Resource, ResourceStatus, UserRef};
use domain::services::{
    acknowledge, authorize_delete, dispute, ensure_same_org, reassign, ChangeTracker,
    RequestContext, Transition,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_corrupt_journal, record_resource_transition};
use persistence::repositories::{ResourceRepository, UserRepository};

/// Default result count for search when the client sends none.
const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Response body for GET /resources/:id/history.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HistoryResponse {
    Journal { data: Vec<JournalEntry> },
    Corrupt { corrupt: bool, raw: String },
}

/// Load a resource and hide it from foreign orgs.
async fn fetch_scoped(
    repo: &ResourceRepository,
    resource_id: Uuid,
    ctx: &RequestContext,
) -> Result<Resource, ApiError> {
    let resource = repo
        .find_by_id(resource_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Resource {} not found", resource_id)))?;
    ensure_same_org(&resource, ctx)?;
    Ok(resource)
}

/// Load a user and require them to be a member of the actor's org.
async fn fetch_org_member(
    repo: &UserRepository,
    user_id: Uuid,
    ctx: &RequestContext,
) -> Result<UserRef, ApiError> {
    let user = repo
        .find_by_id(user_id)
        .await?
        .filter(|u| u.org_id == Some(ctx.org_id))
        .ok_or_else(|| {
            ApiError::Validation(format!("User {} is not in your organization", user_id))
        })?;
    Ok(user.as_ref())
}

/// Journal the pending changes of a resource against its baseline.
fn record_journal(
    tracker: &mut ChangeTracker,
    resource: &mut Resource,
    ctx: &RequestContext,
) {
    let mut history = std::mem::take(&mut resource.history);
    tracker.record_stored(resource, &mut history, Some(&ctx.actor.email));
    if history.is_corrupt() {
        record_corrupt_journal();
    }
    resource.history = history;
}

/// POST /api/v1/resources
///
/// Create a resource in the actor's org. Only Unassigned and Assigned are
/// accepted as initial statuses.
pub async fn create_resource(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateResourceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let status = request.status.unwrap_or(ResourceStatus::Unassigned);
    if !matches!(status, ResourceStatus::Unassigned | ResourceStatus::Assigned) {
        return Err(ApiError::Validation(
            "A new resource can only be Unassigned or Assigned".into(),
        ));
    }

    let user_repo = UserRepository::new(state.pool.clone());
    let current_user = fetch_org_member(&user_repo, request.current_user_id, &ctx).await?;
    let device_admin = fetch_org_member(&user_repo, request.device_admin_id, &ctx).await?;

    let repo = ResourceRepository::new(state.pool.clone());
    let resource = repo
        .create(
            &request.name,
            &request.serial_num,
            current_user.id,
            device_admin.id,
            status,
            &request.description,
            ctx.org_id,
            &HistoryLog::default().to_stored(),
        )
        .await?;

    info!(
        actor = %ctx.actor.email,
        resource_id = %resource.id,
        name = %resource.name,
        status = %resource.status,
        "Created resource"
    );

    Ok((StatusCode::CREATED, Json(resource)))
}

/// GET /api/v1/resources
///
/// List the org's resources, newest-updated first, with keyset pagination.
pub async fn list_resources(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListResourcesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // Reject malformed cursors up front with a client error
    if let Some(ref cursor) = query.cursor {
        shared::pagination::decode_cursor(cursor)
            .map_err(|e| ApiError::Validation(format!("Invalid cursor: {}", e)))?;
    }

    let repo = ResourceRepository::new(state.pool.clone());
    let (data, next_cursor) = repo.list(ctx.org_id, &query).await?;

    Ok(Json(ListResourcesResponse { data, next_cursor }))
}

/// GET /api/v1/resources/:resource_id
pub async fn get_resource(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(resource_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ResourceRepository::new(state.pool.clone());
    let resource = fetch_scoped(&repo, resource_id, &ctx).await?;
    Ok(Json(resource))
}

/// PUT /api/v1/resources/:resource_id
///
/// Update a resource. A changed `current_user_id` drives the reassignment
/// transition and notifies the new owner; everything else is a plain edit.
/// All changes land in one save together with their journal entry.
pub async fn update_resource(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(resource_id): Path<Uuid>,
    Json(request): Json<UpdateResourceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let repo = ResourceRepository::new(state.pool.clone());
    let user_repo = UserRepository::new(state.pool.clone());

    let mut resource = fetch_scoped(&repo, resource_id, &ctx).await?;
    let mut tracker = ChangeTracker::new(&resource, state.config.history.policy());

    if let Some(name) = request.name {
        resource.name = name;
    }
    if let Some(serial_num) = request.serial_num {
        resource.serial_num = serial_num;
    }
    if let Some(description) = request.description {
        resource.description = description;
    }
    if let Some(device_admin_id) = request.device_admin_id {
        if device_admin_id != resource.device_admin.id {
            resource.device_admin = fetch_org_member(&user_repo, device_admin_id, &ctx).await?;
        }
    }

    let mut notifications = Vec::new();
    if let Some(new_owner_id) = request.current_user_id {
        if new_owner_id != resource.current_user.id {
            let new_owner = fetch_org_member(&user_repo, new_owner_id, &ctx).await?;
            if let Transition::Applied {
                notifications: requests,
            } = reassign(&mut resource, new_owner)
            {
                notifications = requests;
                record_resource_transition("assign");
            }
        }
    }

    record_journal(&mut tracker, &mut resource, &ctx);
    repo.save(&resource).await?;

    state.notifier.deliver_all(&notifications).await;

    info!(
        actor = %ctx.actor.email,
        resource_id = %resource.id,
        status = %resource.status,
        "Updated resource"
    );

    Ok(Json(resource))
}

/// DELETE /api/v1/resources/:resource_id
///
/// Only the device admin may delete.
pub async fn delete_resource(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(resource_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ResourceRepository::new(state.pool.clone());
    let resource = fetch_scoped(&repo, resource_id, &ctx).await?;

    authorize_delete(&resource, &ctx)?;

    repo.delete(resource_id).await?;

    info!(
        actor = %ctx.actor.email,
        resource_id = %resource_id,
        "Deleted resource"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resources/:resource_id/acknowledge
///
/// The current owner confirms possession. Idempotent.
pub async fn acknowledge_resource(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(resource_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ResourceRepository::new(state.pool.clone());
    let mut resource = fetch_scoped(&repo, resource_id, &ctx).await?;
    let mut tracker = ChangeTracker::new(&resource, state.config.history.policy());

    match acknowledge(&mut resource, &ctx)? {
        Transition::Applied { notifications } => {
            record_journal(&mut tracker, &mut resource, &ctx);
            repo.save(&resource).await?;
            record_resource_transition("acknowledge");
            state.notifier.deliver_all(&notifications).await;
        }
        Transition::NoOp => {}
    }

    Ok(Json(resource))
}

/// POST /api/v1/resources/:resource_id/deny
///
/// The current owner denies possession, placing the resource in dispute
/// and notifying the interested parties. Idempotent.
pub async fn deny_resource(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(resource_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ResourceRepository::new(state.pool.clone());
    let mut resource = fetch_scoped(&repo, resource_id, &ctx).await?;
    let mut tracker = ChangeTracker::new(&resource, state.config.history.policy());

    match dispute(&mut resource, &ctx)? {
        Transition::Applied { notifications } => {
            record_journal(&mut tracker, &mut resource, &ctx);
            repo.save(&resource).await?;
            record_resource_transition("deny");
            state.notifier.deliver_all(&notifications).await;
        }
        Transition::NoOp => {}
    }

    Ok(Json(resource))
}

/// GET /api/v1/resources/:resource_id/history
///
/// The change journal, most recent entry first. A blob that failed to
/// decode is returned verbatim so nothing is lost.
pub async fn get_resource_history(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(resource_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ResourceRepository::new(state.pool.clone());
    let resource = fetch_scoped(&repo, resource_id, &ctx).await?;

    let response = match resource.history.journal() {
        Some(log) => HistoryResponse::Journal {
            data: log.0.clone(),
        },
        None => {
            warn!(resource_id = %resource_id, "Serving corrupt history blob verbatim");
            HistoryResponse::Corrupt {
                corrupt: true,
                raw: resource.history.to_stored(),
            }
        }
    };

    Ok(Json(response))
}

/// GET /api/v1/resources/search?q=
///
/// Case-insensitive match over name, serial number and description.
pub async fn search_resources(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<SearchQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let term = params.q.trim();
    if term.is_empty() {
        return Err(ApiError::Validation("Search term cannot be empty".into()));
    }

    let repo = ResourceRepository::new(state.pool.clone());
    let data = repo
        .search(ctx.org_id, term, params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
        .await?;

    Ok(Json(ListResourcesResponse {
        data,
        next_cursor: None,
    }))
}

/// GET /api/v1/resources/autocomplete?query=
///
/// Name prefix suggestions for the search box.
pub async fn autocomplete_resources(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<AutocompleteParams>,
) -> Result<impl IntoResponse, ApiError> {
    let prefix = params.query.trim();
    if prefix.is_empty() {
        return Ok(Json(AutocompleteResponse {
            suggestions: Vec::new(),
        }));
    }

    let repo = ResourceRepository::new(state.pool.clone());
    let suggestions = repo.autocomplete(ctx.org_id, prefix).await?;

    Ok(Json(AutocompleteResponse { suggestions }))
}
