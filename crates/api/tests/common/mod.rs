//! Common test utilities for integration tests.
//!
//! Most tests run against the in-memory invite store. The PostgreSQL tests
//! need `TEST_DATABASE_URL` and are skipped without it.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::services::{InMemoryInviteStore, SpectatorInviteStore};
use fake::faker::name::en::Name;
use fake::Fake;
use persistence::repositories::SpectatorInviteRepository;
use shared::jwt::{JwtConfig, TokenSubject};
use sqlx::{postgres::PgPoolOptions, PgPool};
use spectate_api::{
    app::{create_app, AppState},
    config::{
        Config, DatabaseConfig, InvitesConfig, JwtAuthConfig, LoggingConfig, ServerConfig,
    },
};

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_jwt_testing_12345";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            cors_origins: vec![],
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        jwt: JwtAuthConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_secs: 3600,
            leeway_secs: 30,
        },
        invites: InvitesConfig {
            default_expiration_minutes: 30,
            max_expiration_minutes: 1440,
            expiry_sweep_interval_secs: 60,
        },
    }
}

/// App state backed by a fresh in-memory store.
pub fn test_state() -> AppState {
    AppState::new(test_config(), Arc::new(InMemoryInviteStore::new()), None)
        .expect("Failed to build app state")
}

/// Connect to the database named by `TEST_DATABASE_URL` and apply migrations.
///
/// Returns `None` when the variable is unset so Postgres tests can be skipped
/// on machines without a database.
pub async fn create_test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    persistence::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// App state backed by the PostgreSQL repository.
pub fn postgres_state(pool: PgPool) -> AppState {
    let store: Arc<dyn SpectatorInviteStore> =
        Arc::new(SpectatorInviteRepository::new(pool.clone()));
    AppState::new(test_config(), store, Some(pool)).expect("Failed to build app state")
}

/// A random display name.
pub fn fake_name() -> String {
    Name().fake()
}

pub fn create_test_app(state: AppState) -> Router {
    create_app(state)
}

/// Bearer token for `uid`, signed with the test secret.
pub fn token_for(uid: &str, display_name: &str) -> String {
    let jwt = JwtConfig::new(TEST_JWT_SECRET, 3600).expect("Failed to build JWT config");
    let (token, _) = jwt
        .generate_access_token(&TokenSubject {
            uid: uid.to_string(),
            display_name: display_name.to_string(),
            email: None,
        })
        .expect("Failed to sign token");
    token
}

/// Build a JSON request with authentication.
pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request with authentication.
pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
