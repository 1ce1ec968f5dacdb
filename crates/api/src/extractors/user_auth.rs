//! Bearer token extractors.
//!
//! Resolve the calling user from the `Authorization: Bearer <jwt>` header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::AuthenticatedUser;
use shared::jwt::{JwtConfig, JwtError};
use shared::validation::{validate_display_name, validate_user_id};

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller. Rejects the request with 401 when absent.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(header) = parts.headers.get("Authorization") else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;
    header
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

/// Validate `token` and build the caller's identity from its claims.
pub fn authenticate(jwt: &JwtConfig, token: &str) -> Result<AuthenticatedUser, ApiError> {
    let claims = jwt.validate_token(token).map_err(|e| match e {
        JwtError::TokenExpired => ApiError::Unauthorized("Token expired".to_string()),
        _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
    })?;

    // Same limits as ids and names in request bodies.
    validate_user_id(&claims.sub)
        .and_then(|_| validate_display_name(&claims.name))
        .map_err(|_| ApiError::Unauthorized("Token identity is invalid".to_string()))?;

    let user = AuthenticatedUser::new(claims.sub, claims.name);
    Ok(match claims.email {
        Some(email) => user.with_email(email),
        None => user,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        Ok(AuthUser(authenticate(&state.jwt, token)?))
    }
}
