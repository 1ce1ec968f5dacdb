//! Domain layer for the Spectate backend.
//!
//! This crate contains:
//! - Domain models (SpectatorInvite, GameType, AuthenticatedUser)
//! - Eligibility rules and the invite lifecycle service
//! - The invite store abstraction and an in-memory store

pub mod models;
pub mod services;
