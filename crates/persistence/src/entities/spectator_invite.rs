//! Spectator invite entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{
    GameType, InviteContext, InviteStatus, MaxSpectators, Spectator, SpectatorInvite,
};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for spectator_invite_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "spectator_invite_status", rename_all = "lowercase")]
pub enum InviteStatusDb {
    Pending,
    Active,
    Completed,
    Expired,
    Cancelled,
}

impl From<InviteStatusDb> for InviteStatus {
    fn from(db: InviteStatusDb) -> Self {
        match db {
            InviteStatusDb::Pending => InviteStatus::Pending,
            InviteStatusDb::Active => InviteStatus::Active,
            InviteStatusDb::Completed => InviteStatus::Completed,
            InviteStatusDb::Expired => InviteStatus::Expired,
            InviteStatusDb::Cancelled => InviteStatus::Cancelled,
        }
    }
}

impl From<InviteStatus> for InviteStatusDb {
    fn from(status: InviteStatus) -> Self {
        match status {
            InviteStatus::Pending => InviteStatusDb::Pending,
            InviteStatus::Active => InviteStatusDb::Active,
            InviteStatus::Completed => InviteStatusDb::Completed,
            InviteStatus::Expired => InviteStatusDb::Expired,
            InviteStatus::Cancelled => InviteStatusDb::Cancelled,
        }
    }
}

/// Database enum for spectator_invite_context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "spectator_invite_context", rename_all = "lowercase")]
pub enum InviteContextDb {
    Dm,
    Group,
}

impl From<InviteContextDb> for InviteContext {
    fn from(db: InviteContextDb) -> Self {
        match db {
            InviteContextDb::Dm => InviteContext::Dm,
            InviteContextDb::Group => InviteContext::Group,
        }
    }
}

impl From<InviteContext> for InviteContextDb {
    fn from(context: InviteContext) -> Self {
        match context {
            InviteContext::Dm => InviteContextDb::Dm,
            InviteContext::Group => InviteContextDb::Group,
        }
    }
}

/// Database row mapping for the spectator_invites table.
#[derive(Debug, Clone, FromRow)]
pub struct SpectatorInviteEntity {
    pub id: Uuid,
    pub host_id: String,
    pub host_name: String,
    pub game_type: String,
    pub context: InviteContextDb,
    pub conversation_id: String,
    pub conversation_name: Option<String>,
    pub recipient_id: Option<String>,
    pub eligible_user_ids: Vec<String>,
    pub max_spectators: Option<i32>,
    pub status: InviteStatusDb,
    pub live_session_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SpectatorInviteEntity {
    /// Build the domain invite from this row and its spectator rows.
    ///
    /// Fails if a stored column no longer maps to a domain value.
    pub fn into_domain(self, spectators: Vec<SpectatorEntity>) -> Result<SpectatorInvite, String> {
        let game_type: GameType = self.game_type.parse()?;
        let max_spectators = match self.max_spectators {
            Some(raw) => {
                let raw = u32::try_from(raw)
                    .map_err(|_| format!("Invalid max_spectators {}", raw))?;
                Some(MaxSpectators::try_from(raw)?.value())
            }
            None => None,
        };

        Ok(SpectatorInvite {
            id: self.id,
            host_id: self.host_id,
            host_name: self.host_name,
            game_type,
            context: self.context.into(),
            conversation_id: self.conversation_id,
            conversation_name: self.conversation_name,
            recipient_id: self.recipient_id,
            eligible_user_ids: self.eligible_user_ids,
            max_spectators,
            spectators: spectators.into_iter().map(Into::into).collect(),
            status: self.status.into(),
            live_session_id: self.live_session_id,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

/// Database row mapping for the invite_spectators table.
#[derive(Debug, Clone, FromRow)]
pub struct SpectatorEntity {
    pub invite_id: Uuid,
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl From<SpectatorEntity> for Spectator {
    fn from(entity: SpectatorEntity) -> Self {
        Self {
            user_id: entity.user_id,
            display_name: entity.display_name,
            avatar_url: entity.avatar_url,
            joined_at: entity.joined_at,
        }
    }
}
