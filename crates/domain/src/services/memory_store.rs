//! In-memory invite store for development and testing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{InviteStatus, Spectator, SpectatorInvite};

use super::store::{AddSpectatorOutcome, SpectatorInviteStore, StoreError};

/// Invite store backed by a map behind a single lock.
///
/// Every mutation takes the write lock, which makes joins and transitions
/// atomic per invite.
#[derive(Debug, Default)]
pub struct InMemoryInviteStore {
    invites: RwLock<HashMap<Uuid, SpectatorInvite>>,
}

impl InMemoryInviteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.invites.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.invites.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SpectatorInviteStore for InMemoryInviteStore {
    async fn insert(&self, invite: SpectatorInvite) -> Result<SpectatorInvite, StoreError> {
        let mut invites = self.invites.write().await;
        if invites.contains_key(&invite.id) {
            return Err(StoreError::Backend(format!(
                "Invite {} already exists",
                invite.id
            )));
        }
        invites.insert(invite.id, invite.clone());
        Ok(invite)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SpectatorInvite>, StoreError> {
        Ok(self.invites.read().await.get(&id).cloned())
    }

    async fn list_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<SpectatorInvite>, StoreError> {
        let invites = self.invites.read().await;
        let mut matching: Vec<SpectatorInvite> = invites
            .values()
            .filter(|i| i.conversation_id == conversation_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn add_spectator(
        &self,
        id: Uuid,
        spectator: Spectator,
    ) -> Result<AddSpectatorOutcome, StoreError> {
        let mut invites = self.invites.write().await;
        let invite = invites.get_mut(&id).ok_or(StoreError::NotFound)?;

        if invite.has_spectator(&spectator.user_id) {
            return Ok(AddSpectatorOutcome::AlreadyPresent(invite.clone()));
        }
        if invite.status.is_ended() {
            return Ok(AddSpectatorOutcome::Closed(invite.status));
        }
        if invite.is_full() {
            return Ok(AddSpectatorOutcome::CapacityReached);
        }

        invite.spectators.push(spectator);
        Ok(AddSpectatorOutcome::Added(invite.clone()))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: &[InviteStatus],
        to: InviteStatus,
        live_session_id: Option<String>,
    ) -> Result<Option<SpectatorInvite>, StoreError> {
        let mut invites = self.invites.write().await;
        let Some(invite) = invites.get_mut(&id) else {
            return Ok(None);
        };
        if !from.contains(&invite.status) {
            return Ok(None);
        }

        invite.status = to;
        if live_session_id.is_some() {
            invite.live_session_id = live_session_id;
        }
        Ok(Some(invite.clone()))
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut invites = self.invites.write().await;
        let mut expired = 0;
        for invite in invites.values_mut() {
            if !invite.status.is_ended() && invite.is_expired_at(now) {
                invite.status = InviteStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameType, InviteContext};
    use chrono::Duration;

    fn invite(conversation_id: &str, max_spectators: Option<u32>) -> SpectatorInvite {
        let now = Utc::now();
        SpectatorInvite {
            id: Uuid::new_v4(),
            host_id: "host".to_string(),
            host_name: "Host".to_string(),
            game_type: GameType::Minesweeper,
            context: InviteContext::Group,
            conversation_id: conversation_id.to_string(),
            conversation_name: None,
            recipient_id: None,
            eligible_user_ids: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            max_spectators,
            spectators: vec![],
            status: InviteStatus::Pending,
            live_session_id: None,
            expires_at: now + Duration::minutes(30),
            created_at: now,
        }
    }

    fn spectator(user_id: &str) -> Spectator {
        Spectator {
            user_id: user_id.to_string(),
            display_name: user_id.to_string(),
            avatar_url: None,
            joined_at: Utc::now(),
        }
    }

    async fn status_of(store: &InMemoryInviteStore, id: Uuid) -> InviteStatus {
        store.find_by_id(id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryInviteStore::new();
        assert!(store.is_empty().await);

        let created = store.insert(invite("conv", None)).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.find_by_id(created.id).await.unwrap(), Some(created.clone()));
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());

        assert!(store.insert(created).await.is_err());
    }

    #[tokio::test]
    async fn test_add_spectator_is_idempotent() {
        let store = InMemoryInviteStore::new();
        let created = store.insert(invite("conv", Some(5))).await.unwrap();

        let first = store.add_spectator(created.id, spectator("a")).await.unwrap();
        assert!(matches!(first, AddSpectatorOutcome::Added(ref i) if i.spectators.len() == 1));

        let second = store.add_spectator(created.id, spectator("a")).await.unwrap();
        assert!(
            matches!(second, AddSpectatorOutcome::AlreadyPresent(ref i) if i.spectators.len() == 1)
        );
    }

    #[tokio::test]
    async fn test_add_spectator_enforces_cap() {
        let store = InMemoryInviteStore::new();
        let created = store.insert(invite("conv", Some(1))).await.unwrap();

        store.add_spectator(created.id, spectator("a")).await.unwrap();
        let outcome = store.add_spectator(created.id, spectator("b")).await.unwrap();
        assert_eq!(outcome, AddSpectatorOutcome::CapacityReached);

        // A joined spectator can still come back.
        let again = store.add_spectator(created.id, spectator("a")).await.unwrap();
        assert!(matches!(again, AddSpectatorOutcome::AlreadyPresent(_)));
    }

    #[tokio::test]
    async fn test_add_spectator_to_closed_invite() {
        let store = InMemoryInviteStore::new();
        let created = store.insert(invite("conv", None)).await.unwrap();
        store
            .transition_status(
                created.id,
                &InviteStatus::OPEN,
                InviteStatus::Cancelled,
                None,
            )
            .await
            .unwrap();

        let outcome = store.add_spectator(created.id, spectator("a")).await.unwrap();
        assert_eq!(outcome, AddSpectatorOutcome::Closed(InviteStatus::Cancelled));
    }

    #[tokio::test]
    async fn test_add_spectator_missing_invite() {
        let store = InMemoryInviteStore::new();
        let result = store.add_spectator(Uuid::new_v4(), spectator("a")).await;
        assert_eq!(result, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_transition_status_is_conditional() {
        let store = InMemoryInviteStore::new();
        let created = store.insert(invite("conv", None)).await.unwrap();

        let started = store
            .transition_status(
                created.id,
                &[InviteStatus::Pending],
                InviteStatus::Active,
                Some("sess-1".to_string()),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(started.status, InviteStatus::Active);
        assert_eq!(started.live_session_id.as_deref(), Some("sess-1"));

        let again = store
            .transition_status(
                created.id,
                &[InviteStatus::Pending],
                InviteStatus::Active,
                None,
            )
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_expire_overdue() {
        let store = InMemoryInviteStore::new();
        let mut overdue = invite("conv", None);
        overdue.expires_at = Utc::now() - Duration::minutes(1);
        let overdue = store.insert(overdue).await.unwrap();

        let mut finished = invite("conv", None);
        finished.expires_at = Utc::now() - Duration::minutes(1);
        finished.status = InviteStatus::Completed;
        let finished = store.insert(finished).await.unwrap();

        let fresh = store.insert(invite("conv", None)).await.unwrap();

        assert_eq!(store.expire_overdue(Utc::now()).await.unwrap(), 1);

        assert_eq!(status_of(&store, overdue.id).await, InviteStatus::Expired);
        assert_eq!(status_of(&store, finished.id).await, InviteStatus::Completed);
        assert_eq!(status_of(&store, fresh.id).await, InviteStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_by_conversation_newest_first() {
        let store = InMemoryInviteStore::new();
        let mut older = invite("conv-a", None);
        older.created_at = Utc::now() - Duration::minutes(10);
        let older = store.insert(older).await.unwrap();
        let newer = store.insert(invite("conv-a", None)).await.unwrap();
        store.insert(invite("conv-b", None)).await.unwrap();

        let listed = store.list_by_conversation("conv-a").await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }
}
