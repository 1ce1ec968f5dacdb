//! Client-side spectator invite components.
//!
//! This crate contains:
//! - The invite creator a host uses to send an invite or play alone
//! - The invite viewer a recipient uses to inspect and join an invite
//! - The identity provider seam and an HTTP implementation of the invite service

pub mod creator;
pub mod http;
pub mod identity;
pub mod viewer;

pub use creator::{CloseReason, CreatorState, InviteCreator, InviteDraft, SubmitOutcome};
pub use http::{HttpClientError, HttpInviteClient};
pub use identity::{IdentityProvider, StaticIdentity};
pub use viewer::{InviteViewer, JoinOutcome};
