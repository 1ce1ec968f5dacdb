//! Invite creator.
//!
//! Offered to a host before a single-player game: either send a spectator
//! invite to the current conversation or dismiss and play alone.

use std::sync::{Arc, Mutex};

use domain::models::{
    CreateSpectatorInviteRequest, GameType, InviteAudience, MaxSpectators, SpectatorInvite,
};
use domain::services::{SendSpectatorInviteParams, SpectatorInviteService};
use tracing::{info, warn};
use uuid::Uuid;

use crate::identity::IdentityProvider;

/// Message used when a failure carries no text of its own.
pub const DEFAULT_SEND_ERROR: &str = "Failed to send spectator invite";

/// Message returned when no user is signed in.
pub const SIGNED_OUT_ERROR: &str = "You must be signed in to invite spectators";

/// Why the creator closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    InviteCreated(Uuid),
    PlayAlone,
}

/// Lifecycle of a creator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatorState {
    Idle,
    Submitting,
    Closed(CloseReason),
}

/// Result of [`InviteCreator::submit_invite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(SpectatorInvite),
    /// The request failed; the creator is idle again and may be resubmitted.
    Failed(String),
    /// A submission is already in flight.
    Busy,
    /// The creator has already closed.
    Closed,
}

/// What the host is inviting spectators to.
#[derive(Debug, Clone)]
pub struct InviteDraft {
    pub game_type: GameType,
    pub conversation_id: String,
    pub conversation_name: Option<String>,
    pub expiration_minutes: Option<u32>,
}

impl InviteDraft {
    pub fn new(game_type: GameType, conversation_id: impl Into<String>) -> Self {
        Self {
            game_type,
            conversation_id: conversation_id.into(),
            conversation_name: None,
            expiration_minutes: None,
        }
    }

    pub fn with_conversation_name(mut self, name: impl Into<String>) -> Self {
        self.conversation_name = Some(name.into());
        self
    }

    pub fn with_expiration_minutes(mut self, minutes: u32) -> Self {
        self.expiration_minutes = Some(minutes);
        self
    }
}

#[derive(Debug)]
struct CreatorInner {
    state: CreatorState,
    max_spectators: MaxSpectators,
}

/// Sends one spectator invite, or closes to play alone.
pub struct InviteCreator {
    service: Arc<dyn SpectatorInviteService>,
    identity: Arc<dyn IdentityProvider>,
    draft: InviteDraft,
    inner: Mutex<CreatorInner>,
}

impl InviteCreator {
    pub fn new(
        service: Arc<dyn SpectatorInviteService>,
        identity: Arc<dyn IdentityProvider>,
        draft: InviteDraft,
    ) -> Self {
        Self {
            service,
            identity,
            draft,
            inner: Mutex::new(CreatorInner {
                state: CreatorState::Idle,
                max_spectators: MaxSpectators::default(),
            }),
        }
    }

    pub fn state(&self) -> CreatorState {
        self.lock().state
    }

    pub fn max_spectators(&self) -> MaxSpectators {
        self.lock().max_spectators
    }

    /// Set the spectator cap. Only 5, 10, 20 and 50 are accepted.
    pub fn configure_max_spectators(&self, value: u32) -> Result<MaxSpectators, String> {
        let cap = MaxSpectators::try_from(value)?;
        self.lock().max_spectators = cap;
        Ok(cap)
    }

    /// Create the invite for `audience`.
    ///
    /// Failures are reported as [`SubmitOutcome::Failed`] and leave the
    /// creator idle. There is no automatic retry.
    pub async fn submit_invite(&self, audience: InviteAudience) -> SubmitOutcome {
        let max_spectators = {
            let mut inner = self.lock();
            match inner.state {
                CreatorState::Closed(_) => return SubmitOutcome::Closed,
                CreatorState::Submitting => return SubmitOutcome::Busy,
                CreatorState::Idle => {}
            }
            inner.state = CreatorState::Submitting;
            inner.max_spectators
        };

        let Some(host) = self.identity.current_user() else {
            self.lock().state = CreatorState::Idle;
            return SubmitOutcome::Failed(SIGNED_OUT_ERROR.to_string());
        };

        let request = CreateSpectatorInviteRequest {
            game_type: self.draft.game_type,
            context: audience.context(),
            conversation_id: self.draft.conversation_id.clone(),
            conversation_name: self.draft.conversation_name.clone(),
            recipient_id: audience.recipient_id().map(str::to_string),
            eligible_user_ids: match &audience {
                InviteAudience::Group { eligible_user_ids } => Some(eligible_user_ids.clone()),
                InviteAudience::Direct { .. } => None,
            },
            max_spectators: Some(max_spectators),
            expiration_minutes: self.draft.expiration_minutes,
        };

        let result = self
            .service
            .send_spectator_invite(SendSpectatorInviteParams::new(&host, request))
            .await;

        let mut inner = self.lock();
        match result {
            Ok(invite) => {
                info!(invite_id = %invite.id, game_type = %invite.game_type, "Spectator invite sent");
                inner.state = CreatorState::Closed(CloseReason::InviteCreated(invite.id));
                SubmitOutcome::Created(invite)
            }
            Err(e) => {
                warn!(error = %e, "Failed to send spectator invite");
                inner.state = CreatorState::Idle;
                let message = e.to_string();
                if message.is_empty() {
                    SubmitOutcome::Failed(DEFAULT_SEND_ERROR.to_string())
                } else {
                    SubmitOutcome::Failed(message)
                }
            }
        }
    }

    /// Dismiss without inviting anyone. Rejected while a submission is in flight.
    pub fn play_alone(&self) -> CreatorState {
        let mut inner = self.lock();
        if inner.state == CreatorState::Idle {
            inner.state = CreatorState::Closed(CloseReason::PlayAlone);
        }
        inner.state
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CreatorInner> {
        // State is plain data, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
