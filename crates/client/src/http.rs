//! Invite service over the HTTP API.

use domain::models::{
    CreateSpectatorInviteRequest, JoinInviteResponse, JoinSpectatorInviteRequest,
    ListSpectatorInvitesResponse, SpectatorInvite, StartSessionRequest,
};
use domain::services::{InviteError, SendSpectatorInviteParams, SpectatorInviteService};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

/// Error type for HTTP invite calls.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: StatusCode, message: String },
}

impl From<HttpClientError> for InviteError {
    fn from(err: HttpClientError) -> Self {
        match err {
            HttpClientError::Http(e) => InviteError::Unavailable(e.to_string()),
            HttpClientError::Api { status, message } => match status {
                StatusCode::BAD_REQUEST => InviteError::Validation(message),
                StatusCode::UNAUTHORIZED => InviteError::Unauthenticated,
                StatusCode::FORBIDDEN => InviteError::Forbidden(message),
                StatusCode::NOT_FOUND => InviteError::NotFound,
                s if s.is_server_error() => InviteError::Storage(message),
                _ => InviteError::Unavailable(message),
            },
        }
    }
}

/// Error body rendered by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the spectator invite API, authenticated as one user.
///
/// Requests carry no timeout. A stalled request keeps the calling creator or
/// viewer busy until the transport gives up.
#[derive(Debug, Clone)]
pub struct HttpInviteClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpInviteClient {
    /// `base_url` is the server root, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, HttpClientError> {
        let response = request.bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or_else(|_| format!("Request failed with status {}", status));
            return Err(HttpClientError::Api { status, message });
        }

        Ok(response.json::<T>().await?)
    }

    pub async fn create_invite(
        &self,
        request: &CreateSpectatorInviteRequest,
    ) -> Result<SpectatorInvite, HttpClientError> {
        self.send(self.client.post(self.url("/spectator-invites")).json(request))
            .await
    }

    pub async fn get_invite(&self, invite_id: Uuid) -> Result<SpectatorInvite, HttpClientError> {
        #[derive(Deserialize)]
        struct InviteEnvelope {
            invite: SpectatorInvite,
        }

        let envelope: InviteEnvelope = self
            .send(self.client.get(self.url(&format!("/spectator-invites/{}", invite_id))))
            .await?;
        Ok(envelope.invite)
    }

    pub async fn join(
        &self,
        invite_id: Uuid,
        avatar_url: Option<&str>,
    ) -> Result<JoinInviteResponse, HttpClientError> {
        let body = JoinSpectatorInviteRequest {
            avatar_url: avatar_url.map(str::to_string),
        };
        self.send(
            self.client
                .post(self.url(&format!("/spectator-invites/{}/join", invite_id)))
                .json(&body),
        )
        .await
    }

    pub async fn start_session(
        &self,
        invite_id: Uuid,
        live_session_id: Option<String>,
    ) -> Result<SpectatorInvite, HttpClientError> {
        self.send(
            self.client
                .post(self.url(&format!("/spectator-invites/{}/start", invite_id)))
                .json(&StartSessionRequest { live_session_id }),
        )
        .await
    }

    pub async fn complete(&self, invite_id: Uuid) -> Result<SpectatorInvite, HttpClientError> {
        self.send(
            self.client
                .post(self.url(&format!("/spectator-invites/{}/complete", invite_id))),
        )
        .await
    }

    pub async fn cancel(&self, invite_id: Uuid) -> Result<SpectatorInvite, HttpClientError> {
        self.send(
            self.client
                .post(self.url(&format!("/spectator-invites/{}/cancel", invite_id))),
        )
        .await
    }

    pub async fn list_for_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<SpectatorInvite>, HttpClientError> {
        let response: ListSpectatorInvitesResponse = self
            .send(self.client.get(self.url(&format!(
                "/conversations/{}/spectator-invites",
                conversation_id
            ))))
            .await?;
        Ok(response.data)
    }
}

#[async_trait::async_trait]
impl SpectatorInviteService for HttpInviteClient {
    /// The host is taken from the bearer token; `host_id` and `host_name`
    /// in `params` are not sent.
    async fn send_spectator_invite(
        &self,
        params: SendSpectatorInviteParams,
    ) -> Result<SpectatorInvite, InviteError> {
        Ok(self.create_invite(&params.invite).await?)
    }

    /// The viewer is taken from the bearer token.
    async fn join_spectator_invite(
        &self,
        invite_id: Uuid,
        _user_id: &str,
        _display_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<JoinInviteResponse, InviteError> {
        Ok(self.join(invite_id, avatar_url).await?)
    }
}
