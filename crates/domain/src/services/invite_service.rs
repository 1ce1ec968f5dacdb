//! Spectator invite service contract.
//!
//! The client-side creator and viewer talk to invites only through this
//! trait. It is implemented in-process by [`InviteLifecycleService`] and over
//! HTTP by the client crate.
//!
//! [`InviteLifecycleService`]: super::lifecycle::InviteLifecycleService

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AuthenticatedUser, CreateSpectatorInviteRequest, InviteStatus, JoinInviteResponse,
    SpectatorInvite,
};

use super::store::StoreError;

/// Error type for invite operations.
///
/// Ineligibility is not an error: the join call reports it as
/// `success: false`. These variants cover preconditions and exceptional
/// failures only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InviteError {
    #[error("You must be signed in")]
    Unauthenticated,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invite not found")]
    NotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Cannot move invite from {from} to {to}")]
    InvalidTransition { from: InviteStatus, to: InviteStatus },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for InviteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => InviteError::NotFound,
            StoreError::Backend(msg) => InviteError::Storage(msg),
        }
    }
}

impl From<validator::ValidationErrors> for InviteError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", field, message)
                })
            })
            .collect();
        InviteError::Validation(messages.join(", "))
    }
}

/// Parameters for creating an invite on behalf of a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SendSpectatorInviteParams {
    pub host_id: String,
    pub host_name: String,
    #[serde(flatten)]
    pub invite: CreateSpectatorInviteRequest,
}

impl SendSpectatorInviteParams {
    pub fn new(host: &AuthenticatedUser, invite: CreateSpectatorInviteRequest) -> Self {
        Self {
            host_id: host.uid.clone(),
            host_name: host.display_name.clone(),
            invite,
        }
    }
}

/// Service that creates invites and records spectators joining them.
#[async_trait::async_trait]
pub trait SpectatorInviteService: Send + Sync {
    /// Create an invite. The service sets `expires_at` from
    /// `expiration_minutes`. Callers do not retry automatically.
    async fn send_spectator_invite(
        &self,
        params: SendSpectatorInviteParams,
    ) -> Result<SpectatorInvite, InviteError>;

    /// Record `user_id` as a spectator.
    ///
    /// A game that has not started yet is `success: true` without a
    /// `live_session_id`. `Err` is reserved for exceptional failures.
    async fn join_spectator_invite(
        &self,
        invite_id: Uuid,
        user_id: &str,
        display_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<JoinInviteResponse, InviteError>;
}
