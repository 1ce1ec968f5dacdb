//! Server-side invite lifecycle.
//!
//! Owns invite records through a [`SpectatorInviteStore`] and enforces the
//! forward-only status machine, host-only controls and join eligibility.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use shared::validation::{validate_display_name, validate_user_id};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    AuthenticatedUser, CreateSpectatorInviteRequest, InviteStatus, JoinInviteResponse, Spectator,
    SpectatorInvite, DEFAULT_EXPIRATION_MINUTES, MAX_EXPIRATION_MINUTES,
};

use super::eligibility::{compute_eligibility, Eligibility, NOT_AVAILABLE_LABEL};
use super::invite_service::{InviteError, SendSpectatorInviteParams, SpectatorInviteService};
use super::store::{AddSpectatorOutcome, SpectatorInviteStore};

/// Message returned when a host tries to join their own game.
pub const HOST_CANNOT_JOIN: &str = "Hosts cannot watch their own game";

/// Invite service backed by a store.
#[derive(Clone)]
pub struct InviteLifecycleService {
    store: Arc<dyn SpectatorInviteStore>,
    default_expiration_minutes: u32,
    max_expiration_minutes: u32,
}

impl InviteLifecycleService {
    pub fn new(store: Arc<dyn SpectatorInviteStore>) -> Self {
        Self {
            store,
            default_expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            max_expiration_minutes: MAX_EXPIRATION_MINUTES,
        }
    }

    /// Override the lifetime used when a request omits one, and the longest
    /// lifetime a request may ask for.
    pub fn with_expiration_limits(mut self, default_minutes: u32, max_minutes: u32) -> Self {
        self.default_expiration_minutes = default_minutes;
        self.max_expiration_minutes = max_minutes;
        self
    }

    /// Create a pending invite for `host`, expiring `expiration_minutes` from `now`.
    pub async fn create_invite_at(
        &self,
        host: &AuthenticatedUser,
        request: CreateSpectatorInviteRequest,
        now: DateTime<Utc>,
    ) -> Result<SpectatorInvite, InviteError> {
        check_identity(&host.uid, &host.display_name)?;
        request.validate()?;
        let audience = request.resolve_audience().map_err(InviteError::Validation)?;
        let minutes = request.expiration_minutes_or(self.default_expiration_minutes);
        if minutes > self.max_expiration_minutes {
            return Err(InviteError::Validation(format!(
                "expiration_minutes cannot exceed {}",
                self.max_expiration_minutes
            )));
        }

        let invite = SpectatorInvite {
            id: Uuid::new_v4(),
            host_id: host.uid.clone(),
            host_name: host.display_name.clone(),
            game_type: request.game_type,
            context: audience.context(),
            conversation_id: request.conversation_id.clone(),
            conversation_name: request.conversation_name.clone(),
            recipient_id: audience.recipient_id().map(str::to_string),
            eligible_user_ids: audience.eligible_user_ids(),
            max_spectators: request.max_spectators.map(u32::from),
            spectators: Vec::new(),
            status: InviteStatus::Pending,
            live_session_id: None,
            expires_at: now + Duration::minutes(i64::from(minutes)),
            created_at: now,
        };

        let invite = self.store.insert(invite).await?;

        info!(
            invite_id = %invite.id,
            host_id = %invite.host_id,
            game_type = %invite.game_type,
            context = %invite.context,
            eligible_count = invite.eligible_user_ids.len(),
            "Spectator invite created"
        );

        Ok(invite)
    }

    pub async fn create_invite(
        &self,
        host: &AuthenticatedUser,
        request: CreateSpectatorInviteRequest,
    ) -> Result<SpectatorInvite, InviteError> {
        self.create_invite_at(host, request, Utc::now()).await
    }

    pub async fn get_invite(&self, id: Uuid) -> Result<SpectatorInvite, InviteError> {
        self.store.find_by_id(id).await?.ok_or(InviteError::NotFound)
    }

    pub async fn list_for_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<SpectatorInvite>, InviteError> {
        Ok(self.store.list_by_conversation(conversation_id).await?)
    }

    /// Record `viewer` as a spectator of `invite_id`, evaluated at `now`.
    pub async fn join_at(
        &self,
        invite_id: Uuid,
        viewer: Spectator,
        now: DateTime<Utc>,
    ) -> Result<JoinInviteResponse, InviteError> {
        let invite = self.get_invite(invite_id).await?;

        match compute_eligibility(&invite, Some(&viewer.user_id), now) {
            Eligibility::SignedOut => Err(InviteError::Unauthenticated),
            Eligibility::Host => Ok(JoinInviteResponse::rejected(HOST_CANNOT_JOIN)),
            Eligibility::Ineligible(reason) => {
                debug!(
                    invite_id = %invite_id,
                    user_id = %viewer.user_id,
                    reason = ?reason,
                    "Join rejected"
                );
                Ok(JoinInviteResponse::rejected(reason.message()))
            }
            Eligibility::AlreadyJoined => Ok(Self::join_response(&invite)),
            Eligibility::Eligible => {
                let user_id = viewer.user_id.clone();
                match self.store.add_spectator(invite_id, viewer).await? {
                    AddSpectatorOutcome::Added(invite) => {
                        info!(
                            invite_id = %invite_id,
                            user_id = %user_id,
                            spectator_count = invite.spectators.len(),
                            "Spectator joined"
                        );
                        Ok(Self::join_response(&invite))
                    }
                    AddSpectatorOutcome::AlreadyPresent(invite) => Ok(Self::join_response(&invite)),
                    AddSpectatorOutcome::CapacityReached => Ok(JoinInviteResponse::rejected(
                        super::eligibility::CAPACITY_REACHED_LABEL,
                    )),
                    AddSpectatorOutcome::Closed(_) => {
                        Ok(JoinInviteResponse::rejected(NOT_AVAILABLE_LABEL))
                    }
                }
            }
        }
    }

    /// Response for a viewer who is recorded as a spectator.
    fn join_response(invite: &SpectatorInvite) -> JoinInviteResponse {
        if invite.status.is_ended() {
            return JoinInviteResponse::rejected(invite.status.label());
        }
        match (&invite.status, &invite.live_session_id) {
            (InviteStatus::Active, Some(session)) => JoinInviteResponse::live(session.clone()),
            _ => JoinInviteResponse::not_started(),
        }
    }

    /// Host starts the live session: `pending -> active`.
    ///
    /// A session id is generated when the caller does not supply one.
    pub async fn start_session(
        &self,
        invite_id: Uuid,
        host_id: &str,
        live_session_id: Option<String>,
    ) -> Result<SpectatorInvite, InviteError> {
        let session = live_session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let invite = self
            .host_transition(invite_id, host_id, InviteStatus::Active, Some(session))
            .await?;

        info!(
            invite_id = %invite_id,
            live_session_id = ?invite.live_session_id,
            "Spectator session started"
        );
        Ok(invite)
    }

    /// Host finishes the game: `active -> completed`.
    pub async fn complete(
        &self,
        invite_id: Uuid,
        host_id: &str,
    ) -> Result<SpectatorInvite, InviteError> {
        let invite = self
            .host_transition(invite_id, host_id, InviteStatus::Completed, None)
            .await?;
        info!(invite_id = %invite_id, "Spectator session completed");
        Ok(invite)
    }

    /// Host withdraws the invite: `pending|active -> cancelled`.
    pub async fn cancel(
        &self,
        invite_id: Uuid,
        host_id: &str,
    ) -> Result<SpectatorInvite, InviteError> {
        let invite = self
            .host_transition(invite_id, host_id, InviteStatus::Cancelled, None)
            .await?;
        info!(invite_id = %invite_id, "Spectator invite cancelled");
        Ok(invite)
    }

    /// Expire every open invite past its expiry. Returns the count.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, InviteError> {
        Ok(self.store.expire_overdue(now).await?)
    }

    async fn host_transition(
        &self,
        invite_id: Uuid,
        host_id: &str,
        to: InviteStatus,
        live_session_id: Option<String>,
    ) -> Result<SpectatorInvite, InviteError> {
        let invite = self.get_invite(invite_id).await?;
        if !invite.is_host(host_id) {
            return Err(InviteError::Forbidden(
                "Only the host can change this invite".to_string(),
            ));
        }
        if !invite.status.can_transition_to(to) {
            return Err(InviteError::InvalidTransition {
                from: invite.status,
                to,
            });
        }

        let sources = InviteStatus::sources_of(to);
        match self
            .store
            .transition_status(invite_id, &sources, to, live_session_id)
            .await?
        {
            Some(updated) => Ok(updated),
            None => {
                // Lost a race with another transition; report what it moved to.
                let current = self.get_invite(invite_id).await?;
                Err(InviteError::InvalidTransition {
                    from: current.status,
                    to,
                })
            }
        }
    }
}

/// The acting user's id and name are stored on the invite.
fn check_identity(user_id: &str, display_name: &str) -> Result<(), InviteError> {
    if user_id.is_empty() {
        return Err(InviteError::Unauthenticated);
    }
    let field_error = |field: &str, err: validator::ValidationError| {
        let message = err.message.map(|m| m.to_string()).unwrap_or_else(|| err.code.to_string());
        InviteError::Validation(format!("{}: {}", field, message))
    };
    validate_user_id(user_id).map_err(|e| field_error("user_id", e))?;
    validate_display_name(display_name).map_err(|e| field_error("display_name", e))?;
    Ok(())
}

#[async_trait::async_trait]
impl SpectatorInviteService for InviteLifecycleService {
    async fn send_spectator_invite(
        &self,
        params: SendSpectatorInviteParams,
    ) -> Result<SpectatorInvite, InviteError> {
        let host = AuthenticatedUser::new(params.host_id, params.host_name);
        self.create_invite(&host, params.invite).await
    }

    async fn join_spectator_invite(
        &self,
        invite_id: Uuid,
        user_id: &str,
        display_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<JoinInviteResponse, InviteError> {
        check_identity(user_id, display_name)?;
        let now = Utc::now();
        let viewer = Spectator {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            avatar_url: avatar_url.map(str::to_string),
            joined_at: now,
        };
        self.join_at(invite_id, viewer, now).await
    }
}
