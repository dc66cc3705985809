use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_identity,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{health, organizations, resources, teams, users};
use crate::services::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub notifier: Notifier,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    // Rate limiting is enabled when rate_limit_per_minute > 0
    let rate_limiter = if config.security.rate_limit_per_minute > 0 {
        Some(Arc::new(RateLimiterState::new(
            config.security.rate_limit_per_minute,
        )))
    } else {
        None
    };

    let notifier = Notifier::new(config.notifications.clone());

    let state = AppState {
        pool,
        config: config.clone(),
        notifier,
        rate_limiter,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Tenant-scoped routes (require a resolved identity)
    // Middleware order: identity resolution first, then rate limiting
    let protected_routes = Router::new()
        // Resource routes
        .route("/api/v1/resources", post(resources::create_resource))
        .route("/api/v1/resources", get(resources::list_resources))
        .route("/api/v1/resources/search", get(resources::search_resources))
        .route(
            "/api/v1/resources/autocomplete",
            get(resources::autocomplete_resources),
        )
        .route("/api/v1/resources/:resource_id", get(resources::get_resource))
        .route(
            "/api/v1/resources/:resource_id",
            put(resources::update_resource),
        )
        .route(
            "/api/v1/resources/:resource_id",
            delete(resources::delete_resource),
        )
        .route(
            "/api/v1/resources/:resource_id/acknowledge",
            post(resources::acknowledge_resource),
        )
        .route(
            "/api/v1/resources/:resource_id/deny",
            post(resources::deny_resource),
        )
        .route(
            "/api/v1/resources/:resource_id/history",
            get(resources::get_resource_history),
        )
        // User routes
        .route("/api/v1/users", post(users::create_user))
        .route("/api/v1/users", get(users::list_users))
        .route("/api/v1/users/:user_id", get(users::get_user))
        .route("/api/v1/users/:user_id", put(users::update_user))
        .route("/api/v1/users/:user_id", delete(users::delete_user))
        // Organization routes
        .route(
            "/api/v1/organizations",
            post(organizations::create_organization),
        )
        .route(
            "/api/v1/organizations",
            get(organizations::list_organizations),
        )
        .route(
            "/api/v1/organizations/:org_id",
            get(organizations::get_organization),
        )
        .route(
            "/api/v1/organizations/:org_id",
            put(organizations::update_organization),
        )
        .route(
            "/api/v1/organizations/:org_id",
            delete(organizations::delete_organization),
        )
        // Team routes
        .route("/api/v1/teams", post(teams::create_team))
        .route("/api/v1/teams", get(teams::list_teams))
        .route("/api/v1/teams/:team_id", get(teams::get_team))
        .route("/api/v1/teams/:team_id", put(teams::update_team))
        .route("/api/v1/teams/:team_id", delete(teams::delete_team))
        .route(
            "/api/v1/teams/:team_id/members/:user_id",
            post(teams::add_team_member),
        )
        .route(
            "/api/v1/teams/:team_id/members/:user_id",
            delete(teams::remove_team_member),
        )
        // Rate limiting runs after identity (needs the actor ID)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        // Identity runs first (outermost layer = runs first)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    // Public routes (no identity required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
