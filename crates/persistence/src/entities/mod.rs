//! Database entity definitions.

pub mod spectator_invite;

pub use spectator_invite::{
    InviteContextDb, InviteStatusDb, SpectatorEntity, SpectatorInviteEntity,
};
