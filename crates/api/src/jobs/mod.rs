//! Background job scheduler and job implementations.

mod expire_invites;
mod scheduler;

pub use expire_invites::ExpireInvitesJob;
pub use scheduler::{Job, JobScheduler};
