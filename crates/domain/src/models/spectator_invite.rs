//! Spectator invite domain models.
//!
//! A host about to start a single-player game can invite people from a chat
//! conversation to watch. The invite record tracks who may join, who has
//! joined, and where the host's session is in its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use shared::validation::{validate_spectator_cap, validate_user_id, validate_user_id_list};

use super::game::GameType;

/// Invite lifetime used when the host does not pick one.
pub const DEFAULT_EXPIRATION_MINUTES: u32 = 30;

/// Longest invite lifetime a host may request (one day).
pub const MAX_EXPIRATION_MINUTES: u32 = 1440;

/// Lifecycle status of a spectator invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Active,
    Completed,
    Expired,
    Cancelled,
}

impl InviteStatus {
    pub const ALL: [InviteStatus; 5] = [
        InviteStatus::Pending,
        InviteStatus::Active,
        InviteStatus::Completed,
        InviteStatus::Expired,
        InviteStatus::Cancelled,
    ];

    /// Statuses an invite can still be joined or mutated from.
    pub const OPEN: [InviteStatus; 2] = [InviteStatus::Pending, InviteStatus::Active];

    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Active => "active",
            InviteStatus::Completed => "completed",
            InviteStatus::Expired => "expired",
            InviteStatus::Cancelled => "cancelled",
        }
    }

    /// Label shown to viewers for this status.
    pub fn label(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "Waiting to start…",
            InviteStatus::Active => "Live now!",
            InviteStatus::Completed => "Game ended",
            InviteStatus::Expired => "Invite expired",
            InviteStatus::Cancelled => "Cancelled",
        }
    }

    /// Returns true once the invite can no longer change.
    pub fn is_ended(&self) -> bool {
        matches!(
            self,
            InviteStatus::Completed | InviteStatus::Expired | InviteStatus::Cancelled
        )
    }

    /// Returns true if moving from `self` to `next` is a legal forward step.
    ///
    /// `pending -> active -> completed`, and any open status may expire or be
    /// cancelled. Nothing ever returns to `pending`.
    pub fn can_transition_to(&self, next: InviteStatus) -> bool {
        matches!(
            (self, next),
            (InviteStatus::Pending, InviteStatus::Active)
                | (InviteStatus::Active, InviteStatus::Completed)
                | (InviteStatus::Pending | InviteStatus::Active, InviteStatus::Expired)
                | (InviteStatus::Pending | InviteStatus::Active, InviteStatus::Cancelled)
        )
    }

    /// Statuses from which `target` can be reached.
    pub fn sources_of(target: InviteStatus) -> Vec<InviteStatus> {
        InviteStatus::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(target))
            .collect()
    }
}

impl FromStr for InviteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InviteStatus::Pending),
            "active" => Ok(InviteStatus::Active),
            "completed" => Ok(InviteStatus::Completed),
            "expired" => Ok(InviteStatus::Expired),
            "cancelled" => Ok(InviteStatus::Cancelled),
            _ => Err(format!("Invalid invite status: {}", s)),
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Chat context the invite was sent from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteContext {
    Dm,
    Group,
}

impl InviteContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteContext::Dm => "dm",
            InviteContext::Group => "group",
        }
    }
}

impl FromStr for InviteContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dm" => Ok(InviteContext::Dm),
            "group" => Ok(InviteContext::Group),
            _ => Err(format!("Invalid invite context: {}", s)),
        }
    }
}

impl fmt::Display for InviteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spectator cap a host can choose. Only these four values are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MaxSpectators {
    Five,
    #[default]
    Ten,
    Twenty,
    Fifty,
}

impl MaxSpectators {
    pub const ALL: [MaxSpectators; 4] = [
        MaxSpectators::Five,
        MaxSpectators::Ten,
        MaxSpectators::Twenty,
        MaxSpectators::Fifty,
    ];

    pub fn value(&self) -> u32 {
        match self {
            MaxSpectators::Five => 5,
            MaxSpectators::Ten => 10,
            MaxSpectators::Twenty => 20,
            MaxSpectators::Fifty => 50,
        }
    }
}

impl TryFrom<u32> for MaxSpectators {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        validate_spectator_cap(value).map_err(|e| {
            e.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid max spectators: {}", value))
        })?;
        MaxSpectators::ALL
            .into_iter()
            .find(|m| m.value() == value)
            .ok_or_else(|| format!("Invalid max spectators: {}", value))
    }
}

impl From<MaxSpectators> for u32 {
    fn from(cap: MaxSpectators) -> Self {
        cap.value()
    }
}

/// A user who joined an invite as a spectator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Spectator {
    pub user_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub joined_at: DateTime<Utc>,
}

/// A spectator invite record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SpectatorInvite {
    pub id: Uuid,
    pub host_id: String,
    pub host_name: String,
    pub game_type: GameType,
    pub context: InviteContext,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_name: Option<String>,
    /// Set for dm invites only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    /// Authorization allow-list. For dm invites this is exactly `[recipient_id]`.
    pub eligible_user_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_spectators: Option<u32>,
    /// Joined spectators, in join order.
    pub spectators: Vec<Spectator>,
    pub status: InviteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_session_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SpectatorInvite {
    pub fn is_host(&self, user_id: &str) -> bool {
        self.host_id == user_id
    }

    pub fn has_spectator(&self, user_id: &str) -> bool {
        self.spectators.iter().any(|s| s.user_id == user_id)
    }

    pub fn is_eligible_user(&self, user_id: &str) -> bool {
        self.eligible_user_ids.iter().any(|id| id == user_id)
    }

    /// Returns true if a spectator cap is set and has been reached.
    pub fn is_full(&self) -> bool {
        self.max_spectators
            .is_some_and(|max| self.spectators.len() >= max as usize)
    }

    /// Returns true if `now` is past the invite's expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Who an invite is addressed to, resolved from a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteAudience {
    Direct { recipient_id: String },
    Group { eligible_user_ids: Vec<String> },
}

impl InviteAudience {
    pub fn context(&self) -> InviteContext {
        match self {
            InviteAudience::Direct { .. } => InviteContext::Dm,
            InviteAudience::Group { .. } => InviteContext::Group,
        }
    }

    pub fn recipient_id(&self) -> Option<&str> {
        match self {
            InviteAudience::Direct { recipient_id } => Some(recipient_id),
            InviteAudience::Group { .. } => None,
        }
    }

    /// The allow-list stored on the invite.
    pub fn eligible_user_ids(&self) -> Vec<String> {
        match self {
            InviteAudience::Direct { recipient_id } => vec![recipient_id.clone()],
            InviteAudience::Group { eligible_user_ids } => eligible_user_ids.clone(),
        }
    }
}

/// Request to create a spectator invite.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateSpectatorInviteRequest {
    pub game_type: GameType,

    pub context: InviteContext,

    #[validate(length(min = 1, max = 128, message = "conversation_id must be 1-128 characters"))]
    pub conversation_id: String,

    #[validate(length(max = 100, message = "conversation_name cannot exceed 100 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_name: Option<String>,

    /// Required for dm invites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,

    /// Required for group invites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_user_ids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_spectators: Option<MaxSpectators>,

    /// Minutes until the invite expires (1-1440, default: 30)
    #[validate(range(
        min = 1,
        max = 1440,
        message = "expiration_minutes must be between 1 and 1440"
    ))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_minutes: Option<u32>,
}

impl CreateSpectatorInviteRequest {
    /// Resolves the audience for this request's context.
    ///
    /// Dm invites need a `recipient_id`; any `eligible_user_ids` given must be
    /// exactly that recipient. Group invites need `eligible_user_ids` and take
    /// no `recipient_id`.
    pub fn resolve_audience(&self) -> Result<InviteAudience, String> {
        match self.context {
            InviteContext::Dm => {
                let recipient_id = self
                    .recipient_id
                    .as_deref()
                    .ok_or_else(|| "recipient_id is required for dm invites".to_string())?;
                validate_user_id(recipient_id).map_err(|e| validation_message(e, "recipient_id"))?;

                if let Some(ids) = &self.eligible_user_ids {
                    if ids.len() != 1 || ids[0] != recipient_id {
                        return Err(
                            "eligible_user_ids must match recipient_id for dm invites".to_string()
                        );
                    }
                }

                Ok(InviteAudience::Direct {
                    recipient_id: recipient_id.to_string(),
                })
            }
            InviteContext::Group => {
                if self.recipient_id.is_some() {
                    return Err("recipient_id is only allowed for dm invites".to_string());
                }
                let ids = self
                    .eligible_user_ids
                    .as_ref()
                    .ok_or_else(|| "eligible_user_ids is required for group invites".to_string())?;
                validate_user_id_list(ids).map_err(|e| validation_message(e, "eligible_user_ids"))?;

                Ok(InviteAudience::Group {
                    eligible_user_ids: ids.clone(),
                })
            }
        }
    }

    /// Requested lifetime, or `default` when the host did not choose one.
    pub fn expiration_minutes_or(&self, default: u32) -> u32 {
        self.expiration_minutes.unwrap_or(default)
    }
}

fn validation_message(err: validator::ValidationError, field: &str) -> String {
    let message = err
        .message
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string());
    format!("{}: {}", field, message)
}

/// Request body for joining an invite. Identity comes from the caller's token.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct JoinSpectatorInviteRequest {
    #[validate(url(message = "avatar_url must be a valid URL"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Request body for a host starting their live session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct StartSessionRequest {
    /// Session id from the game server. Generated when absent.
    #[validate(length(min = 1, max = 128, message = "live_session_id must be 1-128 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_session_id: Option<String>,
}

/// Result of a join attempt.
///
/// `success` with no `live_session_id` means the host has not started yet,
/// which is an expected outcome rather than a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JoinInviteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JoinInviteResponse {
    pub fn live(live_session_id: impl Into<String>) -> Self {
        Self {
            success: true,
            live_session_id: Some(live_session_id.into()),
            error: None,
        }
    }

    pub fn not_started() -> Self {
        Self {
            success: true,
            live_session_id: None,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            live_session_id: None,
            error: Some(error.into()),
        }
    }
}

/// Response for listing invites in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListSpectatorInvitesResponse {
    pub data: Vec<SpectatorInvite>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(context: InviteContext) -> CreateSpectatorInviteRequest {
        CreateSpectatorInviteRequest {
            game_type: GameType::Snake,
            context,
            conversation_id: "conv-1".to_string(),
            conversation_name: None,
            recipient_id: None,
            eligible_user_ids: None,
            max_spectators: None,
            expiration_minutes: None,
        }
    }

    #[test]
    fn test_status_labels_are_total() {
        let labels: Vec<&str> = InviteStatus::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Waiting to start…",
                "Live now!",
                "Game ended",
                "Invite expired",
                "Cancelled"
            ]
        );
    }

    #[test]
    fn test_status_display_and_parse() {
        for status in InviteStatus::ALL {
            assert_eq!(status.to_string().parse::<InviteStatus>().unwrap(), status);
        }
        assert!("started".parse::<InviteStatus>().is_err());
    }

    #[test]
    fn test_status_transitions_forward_only() {
        use InviteStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Expired));
        assert!(Active.can_transition_to(Expired));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Active.can_transition_to(Pending));
        for status in InviteStatus::ALL {
            assert!(!status.can_transition_to(Pending));
            assert!(!status.can_transition_to(status));
        }
        for ended in [Completed, Expired, Cancelled] {
            assert!(ended.is_ended());
            for next in InviteStatus::ALL {
                assert!(!ended.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_sources_of() {
        use InviteStatus::*;
        assert_eq!(InviteStatus::sources_of(Active), vec![Pending]);
        assert_eq!(InviteStatus::sources_of(Completed), vec![Active]);
        assert_eq!(InviteStatus::sources_of(Cancelled), vec![Pending, Active]);
        assert!(InviteStatus::sources_of(Pending).is_empty());
    }

    #[test]
    fn test_max_spectators_options() {
        assert_eq!(MaxSpectators::try_from(5).unwrap(), MaxSpectators::Five);
        assert_eq!(MaxSpectators::try_from(50).unwrap(), MaxSpectators::Fifty);
        assert!(MaxSpectators::try_from(7).is_err());
        assert!(MaxSpectators::try_from(0).is_err());
        assert_eq!(u32::from(MaxSpectators::Twenty), 20);
        assert_eq!(MaxSpectators::default(), MaxSpectators::Ten);
    }

    #[test]
    fn test_max_spectators_serde_as_number() {
        assert_eq!(serde_json::to_string(&MaxSpectators::Ten).unwrap(), "10");
        let cap: MaxSpectators = serde_json::from_str("20").unwrap();
        assert_eq!(cap, MaxSpectators::Twenty);
        assert!(serde_json::from_str::<MaxSpectators>("12").is_err());
    }

    #[test]
    fn test_create_request_deserialize() {
        let json = r#"{
            "game_type": "2048",
            "context": "group",
            "conversation_id": "conv-9",
            "eligible_user_ids": ["u2", "u3"],
            "max_spectators": 5
        }"#;
        let req: CreateSpectatorInviteRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.game_type, GameType::Game2048);
        assert_eq!(req.max_spectators, Some(MaxSpectators::Five));
        assert_eq!(req.expiration_minutes_or(DEFAULT_EXPIRATION_MINUTES), DEFAULT_EXPIRATION_MINUTES);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_validation() {
        let mut req = request(InviteContext::Group);
        req.expiration_minutes = Some(MAX_EXPIRATION_MINUTES + 1);
        assert!(req.validate().is_err());

        let mut req = request(InviteContext::Group);
        req.conversation_id = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_resolve_dm_audience() {
        let mut req = request(InviteContext::Dm);
        assert!(req.resolve_audience().is_err());

        req.recipient_id = Some("u2".to_string());
        let audience = req.resolve_audience().unwrap();
        assert_eq!(audience.context(), InviteContext::Dm);
        assert_eq!(audience.recipient_id(), Some("u2"));
        assert_eq!(audience.eligible_user_ids(), vec!["u2".to_string()]);

        req.eligible_user_ids = Some(vec!["u3".to_string()]);
        assert!(req.resolve_audience().is_err());
    }

    #[test]
    fn test_resolve_group_audience() {
        let mut req = request(InviteContext::Group);
        assert!(req.resolve_audience().is_err());

        req.eligible_user_ids = Some(vec!["u2".to_string(), "u3".to_string()]);
        let audience = req.resolve_audience().unwrap();
        assert_eq!(audience.context(), InviteContext::Group);
        assert_eq!(audience.recipient_id(), None);
        assert_eq!(audience.eligible_user_ids().len(), 2);

        req.recipient_id = Some("u2".to_string());
        assert!(req.resolve_audience().is_err());
    }

    #[test]
    fn test_resolve_group_audience_rejects_bad_ids() {
        let mut req = request(InviteContext::Group);
        req.eligible_user_ids = Some(vec![]);
        let err = req.resolve_audience().unwrap_err();
        assert!(err.starts_with("eligible_user_ids"));
    }

    #[test]
    fn test_invite_helpers() {
        let now = Utc::now();
        let invite = SpectatorInvite {
            id: Uuid::new_v4(),
            host_id: "u1".to_string(),
            host_name: "Host".to_string(),
            game_type: GameType::Snake,
            context: InviteContext::Group,
            conversation_id: "conv-1".to_string(),
            conversation_name: None,
            recipient_id: None,
            eligible_user_ids: vec!["u2".to_string()],
            max_spectators: Some(1),
            spectators: vec![Spectator {
                user_id: "u2".to_string(),
                display_name: "Two".to_string(),
                avatar_url: None,
                joined_at: now,
            }],
            status: InviteStatus::Pending,
            live_session_id: None,
            expires_at: now + Duration::minutes(5),
            created_at: now,
        };

        assert!(invite.is_host("u1"));
        assert!(invite.has_spectator("u2"));
        assert!(!invite.has_spectator("u3"));
        assert!(invite.is_eligible_user("u2"));
        assert!(invite.is_full());
        assert!(!invite.is_expired_at(now));
        assert!(!invite.is_expired_at(invite.expires_at));
        assert!(invite.is_expired_at(invite.expires_at + Duration::milliseconds(1)));
    }

    #[test]
    fn test_join_response_shapes() {
        let live = JoinInviteResponse::live("sess-1");
        assert!(live.success);
        assert_eq!(live.live_session_id.as_deref(), Some("sess-1"));

        let waiting = JoinInviteResponse::not_started();
        assert!(waiting.success);
        assert!(waiting.live_session_id.is_none());
        assert_eq!(serde_json::to_string(&waiting).unwrap(), r#"{"success":true}"#);

        let rejected = JoinInviteResponse::rejected("Max spectators reached");
        assert!(!rejected.success);
        assert_eq!(rejected.error.as_deref(), Some("Max spectators reached"));
    }

    #[test]
    fn test_join_request_validation() {
        let ok = JoinSpectatorInviteRequest {
            avatar_url: Some("https://cdn.example.com/a.png".to_string()),
        };
        assert!(ok.validate().is_ok());

        let bad = JoinSpectatorInviteRequest {
            avatar_url: Some("not a url".to_string()),
        };
        assert!(bad.validate().is_err());

        assert!(JoinSpectatorInviteRequest::default().validate().is_ok());
    }
}
