//! Repository implementations.

pub mod spectator_invite;

pub use spectator_invite::SpectatorInviteRepository;
