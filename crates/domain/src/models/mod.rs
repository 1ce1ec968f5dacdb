//! Domain models for spectator invites.

pub mod game;
pub mod identity;
pub mod spectator_invite;

pub use game::GameType;
pub use identity::AuthenticatedUser;
pub use spectator_invite::{
    CreateSpectatorInviteRequest, InviteAudience, InviteContext, InviteStatus,
    JoinInviteResponse, JoinSpectatorInviteRequest, ListSpectatorInvitesResponse, MaxSpectators,
    Spectator, SpectatorInvite, StartSessionRequest, DEFAULT_EXPIRATION_MINUTES,
    MAX_EXPIRATION_MINUTES,
};
