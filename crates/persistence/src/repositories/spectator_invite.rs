//! Spectator invite repository for database operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use domain::models::{InviteStatus, Spectator, SpectatorInvite};
use domain::services::{AddSpectatorOutcome, SpectatorInviteStore, StoreError};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use crate::entities::{InviteContextDb, InviteStatusDb, SpectatorEntity, SpectatorInviteEntity};
use crate::metrics::QueryTimer;

const INVITE_COLUMNS: &str = "id, host_id, host_name, game_type, context, conversation_id, \
     conversation_name, recipient_id, eligible_user_ids, max_spectators, status, \
     live_session_id, expires_at, created_at";

const SPECTATOR_COLUMNS: &str = "invite_id, user_id, display_name, avatar_url, joined_at";

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Postgres-backed invite store.
#[derive(Clone)]
pub struct SpectatorInviteRepository {
    pool: PgPool,
}

impl SpectatorInviteRepository {
    /// Creates a new SpectatorInviteRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn spectators_for(&self, invite_ids: &[Uuid]) -> Result<Vec<SpectatorEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_invite_spectators");
        let result = sqlx::query_as::<_, SpectatorEntity>(&format!(
            "SELECT {SPECTATOR_COLUMNS} FROM invite_spectators \
             WHERE invite_id = ANY($1) ORDER BY joined_at ASC"
        ))
        .bind(invite_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    async fn spectators_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        invite_id: Uuid,
    ) -> Result<Vec<SpectatorEntity>, sqlx::Error> {
        sqlx::query_as::<_, SpectatorEntity>(&format!(
            "SELECT {SPECTATOR_COLUMNS} FROM invite_spectators \
             WHERE invite_id = $1 ORDER BY joined_at ASC"
        ))
        .bind(invite_id)
        .fetch_all(&mut **tx)
        .await
    }

    /// Attach spectator rows to their invites, preserving row order.
    async fn hydrate(
        &self,
        rows: Vec<SpectatorInviteEntity>,
    ) -> Result<Vec<SpectatorInvite>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut by_invite: HashMap<Uuid, Vec<SpectatorEntity>> = HashMap::new();
        for spectator in self.spectators_for(&ids).await.map_err(backend)? {
            by_invite.entry(spectator.invite_id).or_default().push(spectator);
        }

        rows.into_iter()
            .map(|row| {
                let spectators = by_invite.remove(&row.id).unwrap_or_default();
                to_domain(row, spectators)
            })
            .collect()
    }
}

fn to_domain(
    row: SpectatorInviteEntity,
    spectators: Vec<SpectatorEntity>,
) -> Result<SpectatorInvite, StoreError> {
    let id = row.id;
    row.into_domain(spectators).map_err(|e| {
        warn!(invite_id = %id, error = %e, "Stored invite could not be mapped");
        StoreError::Backend(e)
    })
}

#[async_trait::async_trait]
impl SpectatorInviteStore for SpectatorInviteRepository {
    async fn insert(&self, invite: SpectatorInvite) -> Result<SpectatorInvite, StoreError> {
        let timer = QueryTimer::new("create_spectator_invite");
        let max_spectators = invite.max_spectators.map(|m| m as i32);
        let result = sqlx::query_as::<_, SpectatorInviteEntity>(&format!(
            r#"
            INSERT INTO spectator_invites (
                id, host_id, host_name, game_type, context, conversation_id,
                conversation_name, recipient_id, eligible_user_ids, max_spectators,
                status, live_session_id, expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(invite.id)
        .bind(&invite.host_id)
        .bind(&invite.host_name)
        .bind(invite.game_type.as_str())
        .bind(InviteContextDb::from(invite.context))
        .bind(&invite.conversation_id)
        .bind(&invite.conversation_name)
        .bind(&invite.recipient_id)
        .bind(&invite.eligible_user_ids)
        .bind(max_spectators)
        .bind(InviteStatusDb::from(invite.status))
        .bind(&invite.live_session_id)
        .bind(invite.expires_at)
        .bind(invite.created_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        to_domain(result.map_err(backend)?, Vec::new())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SpectatorInvite>, StoreError> {
        let timer = QueryTimer::new("find_spectator_invite_by_id");
        let result = sqlx::query_as::<_, SpectatorInviteEntity>(&format!(
            "SELECT {INVITE_COLUMNS} FROM spectator_invites WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match result.map_err(backend)? {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<SpectatorInvite>, StoreError> {
        let timer = QueryTimer::new("list_spectator_invites_by_conversation");
        let result = sqlx::query_as::<_, SpectatorInviteEntity>(&format!(
            "SELECT {INVITE_COLUMNS} FROM spectator_invites \
             WHERE conversation_id = $1 ORDER BY created_at DESC"
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        self.hydrate(result.map_err(backend)?).await
    }

    async fn add_spectator(
        &self,
        id: Uuid,
        spectator: Spectator,
    ) -> Result<AddSpectatorOutcome, StoreError> {
        let timer = QueryTimer::new("add_invite_spectator");

        // The row lock serializes concurrent joins on the same invite.
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query_as::<_, SpectatorInviteEntity>(&format!(
            "SELECT {INVITE_COLUMNS} FROM spectator_invites WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?;

        let existing = Self::spectators_in_tx(&mut tx, id).await.map_err(backend)?;
        let invite = to_domain(row.clone(), existing)?;

        if invite.has_spectator(&spectator.user_id) {
            tx.commit().await.map_err(backend)?;
            timer.record();
            return Ok(AddSpectatorOutcome::AlreadyPresent(invite));
        }
        if invite.status.is_ended() {
            tx.commit().await.map_err(backend)?;
            timer.record();
            return Ok(AddSpectatorOutcome::Closed(invite.status));
        }
        if invite.is_full() {
            tx.commit().await.map_err(backend)?;
            timer.record();
            return Ok(AddSpectatorOutcome::CapacityReached);
        }

        sqlx::query(
            r#"
            INSERT INTO invite_spectators (invite_id, user_id, display_name, avatar_url, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&spectator.user_id)
        .bind(&spectator.display_name)
        .bind(&spectator.avatar_url)
        .bind(spectator.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        let spectators = Self::spectators_in_tx(&mut tx, id).await.map_err(backend)?;
        tx.commit().await.map_err(backend)?;
        timer.record();

        Ok(AddSpectatorOutcome::Added(to_domain(row, spectators)?))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: &[InviteStatus],
        to: InviteStatus,
        live_session_id: Option<String>,
    ) -> Result<Option<SpectatorInvite>, StoreError> {
        let timer = QueryTimer::new("transition_spectator_invite_status");
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let result = sqlx::query_as::<_, SpectatorInviteEntity>(&format!(
            r#"
            UPDATE spectator_invites
            SET status = $2,
                live_session_id = COALESCE($3, live_session_id),
                updated_at = NOW()
            WHERE id = $1 AND status::text = ANY($4)
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(InviteStatusDb::from(to))
        .bind(live_session_id)
        .bind(&from)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match result.map_err(backend)? {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("expire_overdue_spectator_invites");
        let result = sqlx::query(
            r#"
            UPDATE spectator_invites
            SET status = 'expired', updated_at = NOW()
            WHERE status IN ('pending', 'active') AND expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        timer.record();
        Ok(result.rows_affected())
    }
}
