//! HTTP route handlers.

pub mod health;
pub mod spectator_invites;
