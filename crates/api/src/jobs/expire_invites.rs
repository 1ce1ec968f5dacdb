//! Invite expiry sweep.
//!
//! Moves pending and active invites past their `expires_at` to `expired`.
//! Eligibility already treats them as expired on read; the sweep makes the
//! stored status agree.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use domain::services::InviteLifecycleService;
use tracing::{debug, info};

use crate::middleware::metrics::record_invites_expired;

use super::scheduler::Job;

pub struct ExpireInvitesJob {
    invites: Arc<InviteLifecycleService>,
    interval: Duration,
}

impl ExpireInvitesJob {
    pub fn new(invites: Arc<InviteLifecycleService>, interval_secs: u64) -> Self {
        Self {
            invites,
            interval: Duration::from_secs(interval_secs),
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpireInvitesJob {
    fn name(&self) -> &'static str {
        "expire_invites"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> Result<(), String> {
        let expired = self
            .invites
            .expire_overdue(Utc::now())
            .await
            .map_err(|e| format!("Failed to expire invites: {}", e))?;

        if expired > 0 {
            record_invites_expired(expired);
            info!(expired = expired, "Expired overdue spectator invites");
        } else {
            debug!("No overdue spectator invites");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{
        AuthenticatedUser, CreateSpectatorInviteRequest, GameType, InviteContext, InviteStatus,
    };
    use domain::services::InMemoryInviteStore;

    #[tokio::test]
    async fn test_execute_expires_overdue_invites() {
        let invites = Arc::new(InviteLifecycleService::new(Arc::new(
            InMemoryInviteStore::new(),
        )));
        let invite = invites
            .create_invite_at(
                &AuthenticatedUser::new("u1", "Host"),
                CreateSpectatorInviteRequest {
                    game_type: GameType::Sudoku,
                    context: InviteContext::Dm,
                    conversation_id: "dm-1".to_string(),
                    conversation_name: None,
                    recipient_id: Some("u2".to_string()),
                    eligible_user_ids: None,
                    max_spectators: None,
                    expiration_minutes: Some(1),
                },
                Utc::now() - chrono::Duration::minutes(5),
            )
            .await
            .unwrap();

        let job = ExpireInvitesJob::new(invites.clone(), 60);
        assert_eq!(job.name(), "expire_invites");
        assert_eq!(job.interval(), Duration::from_secs(60));

        job.execute().await.unwrap();
        assert_eq!(
            invites.get_invite(invite.id).await.unwrap().status,
            InviteStatus::Expired
        );
    }
}
