use std::sync::Arc;

use axum::http::Method;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{auth, events, health, invites, members, organizations};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let state = AppState::new(pool, jwt_config);

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/password/recover", post(auth::request_password_recover))
        .route("/password/reset", post(auth::reset_password));

    let organization_routes = Router::new()
        .route("/", get(organizations::list_organizations))
        .route("/", post(organizations::create_organization))
        .route("/:slug", get(organizations::get_organization))
        .route("/:slug", put(organizations::update_organization))
        .route("/:slug", delete(organizations::shutdown_organization))
        .route("/:slug/membership", get(organizations::get_membership))
        .route("/:slug/owner", patch(organizations::transfer_ownership))
        .route("/:slug/members", get(members::list_members))
        .route("/:slug/members/:member_id", put(members::update_member_role))
        .route("/:slug/members/:member_id", delete(members::remove_member))
        .route("/:slug/member-invites", get(invites::list_invites))
        .route("/:slug/member-invites", post(invites::create_invite))
        .route("/:slug/member-invites/:invite_id", delete(invites::revoke_invite));

    let invite_routes = Router::new()
        .route("/:invite_id", get(invites::get_invite))
        .route("/:invite_id/accept", post(invites::accept_invite))
        .route("/:invite_id/reject", post(invites::reject_invite));

    let event_routes = Router::new()
        .route("/", get(events::list_events))
        .route("/", post(events::create_event))
        .route("/:slug", get(events::get_event));

    let router = Router::new()
        .route("/api/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/organizations", organization_routes)
        .nest("/member-invites", invite_routes)
        .route("/pending-member-invites", get(invites::list_pending_invites))
        .nest("/events", event_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
