//! Storage abstraction for spectator invites.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{InviteStatus, Spectator, SpectatorInvite};

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Invite not found")]
    NotFound,

    #[error("{0}")]
    Backend(String),
}

/// Result of recording a spectator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddSpectatorOutcome {
    /// The spectator was appended.
    Added(SpectatorInvite),
    /// The user had already joined; nothing changed.
    AlreadyPresent(SpectatorInvite),
    /// The cap was reached before this user could be added.
    CapacityReached,
    /// The invite is no longer pending or active.
    Closed(InviteStatus),
}

/// Persistent storage for invites.
///
/// Implementations must make `add_spectator` and `transition_status` atomic
/// per invite so concurrent joins cannot exceed the cap or duplicate a user.
#[async_trait::async_trait]
pub trait SpectatorInviteStore: Send + Sync {
    async fn insert(&self, invite: SpectatorInvite) -> Result<SpectatorInvite, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SpectatorInvite>, StoreError>;

    /// Invites for a conversation, newest first.
    async fn list_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<SpectatorInvite>, StoreError>;

    /// Idempotently append a spectator, enforcing the cap and open status.
    async fn add_spectator(
        &self,
        id: Uuid,
        spectator: Spectator,
    ) -> Result<AddSpectatorOutcome, StoreError>;

    /// Move to `to` if the current status is one of `from`.
    ///
    /// `live_session_id`, when given, is stored alongside the new status.
    /// Returns `None` if the invite is missing or its status is not in `from`.
    async fn transition_status(
        &self,
        id: Uuid,
        from: &[InviteStatus],
        to: InviteStatus,
        live_session_id: Option<String>,
    ) -> Result<Option<SpectatorInvite>, StoreError>;

    /// Mark every open invite whose expiry is before `now` as expired.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
