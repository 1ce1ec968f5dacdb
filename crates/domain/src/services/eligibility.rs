//! Viewer eligibility and invite display derivation.
//!
//! Everything here is a pure function of the invite, the viewer id and the
//! clock, recomputed on every read. Nothing is cached.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{InviteStatus, SpectatorInvite};

/// Label shown when an invite has no room left.
pub const CAPACITY_REACHED_LABEL: &str = "Max spectators reached";

/// Label shown for every other reason a viewer cannot join.
pub const NOT_AVAILABLE_LABEL: &str = "Not available";

/// Why a viewer who is neither host nor spectator cannot join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    /// Status is completed, expired or cancelled.
    Ended,
    /// The expiry time has passed, whatever the stored status says.
    Expired,
    CapacityReached,
    /// Viewer is not on the allow-list.
    NotInvited,
}

impl IneligibleReason {
    /// Short label for the invite card. Only capacity gets its own wording.
    pub fn label(&self) -> &'static str {
        match self {
            IneligibleReason::CapacityReached => CAPACITY_REACHED_LABEL,
            _ => NOT_AVAILABLE_LABEL,
        }
    }

    /// Longer message returned by the join service.
    pub fn message(&self) -> &'static str {
        match self {
            IneligibleReason::Ended => "This game is no longer available",
            IneligibleReason::Expired => "This invite has expired",
            IneligibleReason::CapacityReached => CAPACITY_REACHED_LABEL,
            IneligibleReason::NotInvited => "You are not invited to watch this game",
        }
    }
}

/// Where a viewer stands with respect to an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum Eligibility {
    SignedOut,
    Host,
    AlreadyJoined,
    Eligible,
    Ineligible(IneligibleReason),
}

impl Eligibility {
    /// True for a viewer who may press join (or watch again).
    pub fn can_join(&self) -> bool {
        matches!(self, Eligibility::Eligible | Eligibility::AlreadyJoined)
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Eligibility::Host)
    }
}

/// Computes whether `viewer_id` may join `invite` at `now`.
///
/// Order matters: the host check wins over everything, and a viewer already
/// in the spectator list stays eligible regardless of status, expiry or cap.
pub fn compute_eligibility(
    invite: &SpectatorInvite,
    viewer_id: Option<&str>,
    now: DateTime<Utc>,
) -> Eligibility {
    let Some(viewer_id) = viewer_id else {
        return Eligibility::SignedOut;
    };

    if invite.is_host(viewer_id) {
        return Eligibility::Host;
    }

    if invite.has_spectator(viewer_id) {
        return Eligibility::AlreadyJoined;
    }

    if invite.status.is_ended() {
        return Eligibility::Ineligible(IneligibleReason::Ended);
    }

    if invite.is_expired_at(now) {
        return Eligibility::Ineligible(IneligibleReason::Expired);
    }

    if invite.is_full() {
        return Eligibility::Ineligible(IneligibleReason::CapacityReached);
    }

    if !invite.is_eligible_user(viewer_id) {
        return Eligibility::Ineligible(IneligibleReason::NotInvited);
    }

    Eligibility::Eligible
}

/// Call-to-action for an invite card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InviteAction {
    /// Terminal status: nothing to press.
    None,
    /// The viewer is the host; show hosting hints instead of a join button.
    HostHints {
        spectator_count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_spectators: Option<u32>,
        live: bool,
    },
    /// Join button, enabled once the host's live session exists.
    Join { enabled: bool },
    /// Viewer already joined and may re-enter.
    WatchAgain { enabled: bool },
    /// Viewer cannot join; show the reason label.
    Unavailable { reason: &'static str },
}

/// Display model for one viewer of one invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteView {
    pub status: InviteStatus,
    pub status_label: &'static str,
    pub eligibility: Eligibility,
    pub action: InviteAction,
}

impl InviteView {
    pub fn derive(invite: &SpectatorInvite, viewer_id: Option<&str>, now: DateTime<Utc>) -> Self {
        let eligibility = compute_eligibility(invite, viewer_id, now);
        let live = invite.live_session_id.is_some();

        let action = if invite.status.is_ended() {
            InviteAction::None
        } else {
            match eligibility {
                Eligibility::Host => InviteAction::HostHints {
                    spectator_count: invite.spectators.len(),
                    max_spectators: invite.max_spectators,
                    live,
                },
                Eligibility::AlreadyJoined => InviteAction::WatchAgain { enabled: live },
                Eligibility::Eligible => InviteAction::Join { enabled: live },
                Eligibility::Ineligible(reason) => InviteAction::Unavailable {
                    reason: reason.label(),
                },
                Eligibility::SignedOut => InviteAction::Unavailable {
                    reason: NOT_AVAILABLE_LABEL,
                },
            }
        };

        Self {
            status: invite.status,
            status_label: invite.status.label(),
            eligibility,
            action,
        }
    }

    /// The reason label when the viewer cannot join, if any.
    pub fn unavailable_reason(&self) -> Option<&'static str> {
        match self.action {
            InviteAction::Unavailable { reason } => Some(reason),
            _ => None,
        }
    }
}
