//! Request identity middleware.
//!
//! Resolves the acting user from the `X-User-Id` header set by the
//! authenticating reverse proxy, and builds the request context every
//! handler and lifecycle operation works with.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::services::RequestContext;
use persistence::repositories::UserRepository;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Middleware that requires an authenticated user with an org membership.
///
/// On success a [`RequestContext`] is inserted into request extensions.
/// Missing or unknown identity yields 401; a user without an org (or
/// deactivated) cannot act on anything and yields 403.
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user_id = match req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        Some(id) => id,
        None => {
            return ApiError::Unauthorized("Missing or invalid X-User-Id header".into())
                .into_response()
        }
    };

    let repo = UserRepository::new(state.pool.clone());
    let user = match repo.find_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return ApiError::Unauthorized("Unknown user".into()).into_response();
        }
        Err(e) => {
            return ApiError::from(e).into_response();
        }
    };

    if !user.is_active {
        return ApiError::Forbidden("User account is deactivated".into()).into_response();
    }

    let org_id = match user.org_id {
        Some(org_id) => org_id,
        None => {
            return ApiError::Forbidden("User does not belong to an organization".into())
                .into_response();
        }
    };

    let ctx = RequestContext {
        actor: user.as_ref(),
        org_id,
    };

    req.extensions_mut().insert(ctx);
    next.run(req).await
}
