use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{InviteLifecycleService, SpectatorInviteStore};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, spectator_invites};

#[derive(Clone)]
pub struct AppState {
    pub invites: Arc<InviteLifecycleService>,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    /// Present when invites are stored in PostgreSQL.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn SpectatorInviteStore>,
        pool: Option<PgPool>,
    ) -> Result<Self, JwtError> {
        let jwt = JwtConfig::with_leeway(
            &config.jwt.secret,
            config.jwt.access_token_expiry_secs,
            config.jwt.leeway_secs,
        )?;
        let invites = InviteLifecycleService::new(store).with_expiration_limits(
            config.invites.default_expiration_minutes,
            config.invites.max_expiration_minutes,
        );

        Ok(Self {
            invites: Arc::new(invites),
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            pool,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.server.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Authenticated through the AuthUser extractor in each handler.
    let invite_routes = Router::new()
        .route(
            "/api/v1/spectator-invites",
            post(spectator_invites::create_invite),
        )
        .route(
            "/api/v1/spectator-invites/:invite_id",
            get(spectator_invites::get_invite),
        )
        .route(
            "/api/v1/spectator-invites/:invite_id/join",
            post(spectator_invites::join_invite),
        )
        .route(
            "/api/v1/spectator-invites/:invite_id/start",
            post(spectator_invites::start_session),
        )
        .route(
            "/api/v1/spectator-invites/:invite_id/complete",
            post(spectator_invites::complete_invite),
        )
        .route(
            "/api/v1/spectator-invites/:invite_id/cancel",
            post(spectator_invites::cancel_invite),
        )
        .route(
            "/api/v1/conversations/:conversation_id/spectator-invites",
            get(spectator_invites::list_conversation_invites),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(invite_routes)
        // Global middleware (order matters: bottom layers run first)
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
