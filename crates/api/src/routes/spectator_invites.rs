//! Spectator invite routes.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{
    CreateSpectatorInviteRequest, JoinInviteResponse, JoinSpectatorInviteRequest,
    ListSpectatorInvitesResponse, SpectatorInvite, StartSessionRequest,
};
use domain::services::{InviteView, SpectatorInviteService};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::metrics::{
    record_invite_created, record_invite_join, record_invite_transition,
};

/// An invite together with how it looks to the caller.
#[derive(Debug, Serialize)]
pub struct InviteDetailResponse {
    pub invite: SpectatorInvite,
    pub view: InviteView,
}

/// Create a spectator invite hosted by the caller.
///
/// POST /api/v1/spectator-invites
pub async fn create_invite(
    State(state): State<AppState>,
    AuthUser(host): AuthUser,
    Json(request): Json<CreateSpectatorInviteRequest>,
) -> Result<(StatusCode, Json<SpectatorInvite>), ApiError> {
    let invite = state.invites.create_invite(&host, request).await?;
    record_invite_created(invite.game_type.as_str(), invite.context.as_str());
    Ok((StatusCode::CREATED, Json(invite)))
}

/// Fetch an invite and the caller's view of it.
///
/// GET /api/v1/spectator-invites/:invite_id
pub async fn get_invite(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(invite_id): Path<Uuid>,
) -> Result<Json<InviteDetailResponse>, ApiError> {
    let invite = state.invites.get_invite(invite_id).await?;
    let view = InviteView::derive(&invite, Some(&viewer.uid), Utc::now());
    Ok(Json(InviteDetailResponse { invite, view }))
}

/// Join an invite as a spectator.
///
/// POST /api/v1/spectator-invites/:invite_id/join
///
/// The body is optional. Ineligibility is a 200 with `success: false`.
pub async fn join_invite(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(invite_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<JoinInviteResponse>, ApiError> {
    let request: JoinSpectatorInviteRequest = if body.is_empty() {
        JoinSpectatorInviteRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?
    };
    request.validate()?;
    let avatar_url = request.avatar_url.or(viewer.avatar_url);

    let response = state
        .invites
        .join_spectator_invite(
            invite_id,
            &viewer.uid,
            &viewer.display_name,
            avatar_url.as_deref(),
        )
        .await?;

    let outcome = match (response.success, response.live_session_id.is_some()) {
        (true, true) => "live",
        (true, false) => "waiting",
        (false, _) => "rejected",
    };
    record_invite_join(outcome);

    Ok(Json(response))
}

/// Host starts the live session.
///
/// POST /api/v1/spectator-invites/:invite_id/start
pub async fn start_session(
    State(state): State<AppState>,
    AuthUser(host): AuthUser,
    Path(invite_id): Path<Uuid>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<SpectatorInvite>, ApiError> {
    request.validate()?;
    let invite = state
        .invites
        .start_session(invite_id, &host.uid, request.live_session_id)
        .await?;
    record_invite_transition(invite.status.as_str());
    Ok(Json(invite))
}

/// Host marks the game finished.
///
/// POST /api/v1/spectator-invites/:invite_id/complete
pub async fn complete_invite(
    State(state): State<AppState>,
    AuthUser(host): AuthUser,
    Path(invite_id): Path<Uuid>,
) -> Result<Json<SpectatorInvite>, ApiError> {
    let invite = state.invites.complete(invite_id, &host.uid).await?;
    record_invite_transition(invite.status.as_str());
    Ok(Json(invite))
}

/// Host withdraws the invite.
///
/// POST /api/v1/spectator-invites/:invite_id/cancel
pub async fn cancel_invite(
    State(state): State<AppState>,
    AuthUser(host): AuthUser,
    Path(invite_id): Path<Uuid>,
) -> Result<Json<SpectatorInvite>, ApiError> {
    let invite = state.invites.cancel(invite_id, &host.uid).await?;
    record_invite_transition(invite.status.as_str());
    Ok(Json(invite))
}

/// List the conversation's invites the caller hosts or was invited to.
///
/// GET /api/v1/conversations/:conversation_id/spectator-invites
pub async fn list_conversation_invites(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<ListSpectatorInvitesResponse>, ApiError> {
    let data: Vec<SpectatorInvite> = state
        .invites
        .list_for_conversation(&conversation_id)
        .await?
        .into_iter()
        .filter(|invite| invite.is_host(&viewer.uid) || invite.is_eligible_user(&viewer.uid))
        .collect();

    info!(
        conversation_id = %conversation_id,
        count = data.len(),
        "Listed spectator invites"
    );

    Ok(Json(ListSpectatorInvitesResponse { data }))
}
