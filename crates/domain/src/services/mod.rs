//! Domain services for spectator invites.
//!
//! Services contain business logic that operates on domain models.

pub mod eligibility;
pub mod invite_service;
pub mod lifecycle;
pub mod memory_store;
pub mod store;

pub use eligibility::{
    compute_eligibility, Eligibility, IneligibleReason, InviteAction, InviteView,
    CAPACITY_REACHED_LABEL, NOT_AVAILABLE_LABEL,
};
pub use invite_service::{InviteError, SendSpectatorInviteParams, SpectatorInviteService};
pub use lifecycle::{InviteLifecycleService, HOST_CANNOT_JOIN};
pub use memory_store::InMemoryInviteStore;
pub use store::{AddSpectatorOutcome, SpectatorInviteStore, StoreError};
