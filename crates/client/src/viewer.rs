//! Invite viewer.
//!
//! Renders an invite card's view model for the signed-in user and drives the
//! join action.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use domain::models::SpectatorInvite;
use domain::services::{
    Eligibility, IneligibleReason, InviteAction, InviteView, SpectatorInviteService,
};
use tracing::{debug, warn};

use crate::identity::IdentityProvider;

/// Informational message shown when the host has not started yet.
pub const WAITING_FOR_HOST_MESSAGE: &str =
    "The host hasn't started the game yet. You'll be able to watch once it begins.";

/// Message used when a failure carries no text of its own.
pub const DEFAULT_JOIN_ERROR: &str = "Failed to join game";

/// Result of [`InviteViewer::join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Hand off to the live-viewing flow.
    Watching { live_session_id: String },
    /// Joined, but the host has not started. Not an error.
    WaitingForHost { message: String },
    Failed { message: String },
    /// The viewer may not join this invite; no request was made.
    NotJoinable(Eligibility),
    /// A join is already in flight.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewerState {
    Idle,
    Joining,
}

/// View model and join action for one viewer.
pub struct InviteViewer {
    service: Arc<dyn SpectatorInviteService>,
    identity: Arc<dyn IdentityProvider>,
    state: Mutex<ViewerState>,
}

impl InviteViewer {
    pub fn new(
        service: Arc<dyn SpectatorInviteService>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            service,
            identity,
            state: Mutex::new(ViewerState::Idle),
        }
    }

    pub fn view(&self, invite: &SpectatorInvite) -> InviteView {
        self.view_at(invite, Utc::now())
    }

    pub fn view_at(&self, invite: &SpectatorInvite, now: DateTime<Utc>) -> InviteView {
        let viewer = self.identity.current_user();
        InviteView::derive(invite, viewer.as_ref().map(|u| u.uid.as_str()), now)
    }

    /// Whether a join request is in flight. The join control stays disabled meanwhile.
    pub fn is_joining(&self) -> bool {
        *self.lock() == ViewerState::Joining
    }

    pub async fn join(&self, invite: &SpectatorInvite) -> JoinOutcome {
        self.join_at(invite, Utc::now()).await
    }

    /// Join `invite` as the signed-in user, evaluated at `now`.
    pub async fn join_at(&self, invite: &SpectatorInvite, now: DateTime<Utc>) -> JoinOutcome {
        let Some(viewer) = self.identity.current_user() else {
            return JoinOutcome::NotJoinable(Eligibility::SignedOut);
        };

        let view = InviteView::derive(invite, Some(&viewer.uid), now);
        if !view.eligibility.can_join() {
            return JoinOutcome::NotJoinable(view.eligibility);
        }
        if view.action == InviteAction::None {
            // Joined spectators of an ended game get no action either.
            return JoinOutcome::NotJoinable(Eligibility::Ineligible(IneligibleReason::Ended));
        }

        {
            let mut state = self.lock();
            if *state == ViewerState::Joining {
                return JoinOutcome::Busy;
            }
            *state = ViewerState::Joining;
        }

        let result = self
            .service
            .join_spectator_invite(
                invite.id,
                &viewer.uid,
                &viewer.display_name,
                viewer.avatar_url.as_deref(),
            )
            .await;

        *self.lock() = ViewerState::Idle;

        match result {
            Ok(response) if response.success => match response.live_session_id {
                Some(live_session_id) => JoinOutcome::Watching { live_session_id },
                None => {
                    debug!(invite_id = %invite.id, "Joined before host started");
                    JoinOutcome::WaitingForHost {
                        message: WAITING_FOR_HOST_MESSAGE.to_string(),
                    }
                }
            },
            Ok(response) => {
                let message = response
                    .error
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_JOIN_ERROR.to_string());
                warn!(invite_id = %invite.id, error = %message, "Join rejected");
                JoinOutcome::Failed { message }
            }
            Err(e) => {
                warn!(invite_id = %invite.id, error = %e, "Join request failed");
                let message = e.to_string();
                JoinOutcome::Failed {
                    message: if message.is_empty() {
                        DEFAULT_JOIN_ERROR.to_string()
                    } else {
                        message
                    },
                }
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ViewerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
