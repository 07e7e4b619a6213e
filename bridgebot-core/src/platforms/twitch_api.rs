//! Twitch Helix REST client. Uses an app access token (client credentials)
//! for the read endpoints and the authorization-code grant for the oauth
//! callback flow.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use bridgebot_common::models::StreamInfo;
use bridgebot_common::traits::platform_traits::StreamSource;

use crate::Error;

const HELIX_BASE: &str = "https://api.twitch.tv/helix";
const OAUTH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Helix caps id-list queries at 100 values per request.
const MAX_IDS_PER_REQUEST: usize = 100;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HelixStream {
    id: String,
    user_name: String,
    user_login: String,
    game_name: String,
    title: String,
    #[serde(default)]
    tags: Vec<String>,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct HelixUser {
    id: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct HelixPage<T> {
    data: Vec<T>,
}

struct AppToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Tokens from a completed authorization-code exchange.
pub struct UserTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

pub struct TwitchApiClient {
    http: Client,
    client_id: String,
    client_secret: String,
    app_token: Mutex<Option<AppToken>>,
}

impl TwitchApiClient {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            http: Client::new(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            app_token: Mutex::new(None),
        }
    }

    /// Current app token, refreshed through the client-credentials grant
    /// when missing or within a minute of expiry.
    async fn app_token(&self) -> Result<String, Error> {
        let mut guard = self.app_token.lock().await;
        if let Some(tok) = guard.as_ref() {
            if tok.expires_at > Utc::now() + Duration::seconds(60) {
                return Ok(tok.token.clone());
            }
        }
        debug!("fetching fresh twitch app token");
        let resp: TokenResponse = self
            .http
            .post(OAUTH_TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let token = resp.access_token.clone();
        *guard = Some(AppToken {
            token: resp.access_token,
            expires_at: Utc::now() + Duration::seconds(resp.expires_in),
        });
        Ok(token)
    }

    /// Exchanges an authorization code from the oauth callback for user
    /// tokens. `redirect_uri` must match the one the code was issued for.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<UserTokens, Error> {
        let resp: TokenResponse = self
            .http
            .post(OAUTH_TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(UserTokens {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
        })
    }

    async fn get_helix<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<HelixPage<T>, Error> {
        let token = self.app_token().await?;
        let page = self
            .http
            .get(format!("{HELIX_BASE}/{path}"))
            .header("Client-Id", &self.client_id)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(page)
    }

    /// One `/streams` query per chunk of up to 100 ids under `key`.
    async fn get_streams(&self, key: &str, ids: &[String]) -> Result<Vec<StreamInfo>, Error> {
        let mut out = Vec::new();
        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let mut query: Vec<(&str, &str)> = vec![("first", "100")];
            query.extend(chunk.iter().map(|id| (key, id.as_str())));
            let page: HelixPage<HelixStream> = self.get_helix("streams", &query).await?;
            out.extend(page.data.into_iter().map(|s| StreamInfo {
                id: s.id,
                user: s.user_name,
                login: s.user_login,
                title: s.title,
                game: s.game_name,
                tags: s.tags,
                started_at: s.started_at,
            }));
        }
        Ok(out)
    }
}

#[async_trait]
impl StreamSource for TwitchApiClient {
    async fn get_streams_by_user_ids(&self, user_ids: &[String]) -> Result<Vec<StreamInfo>, Error> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }
        self.get_streams("user_id", user_ids).await
    }

    async fn get_streams_by_game_ids(&self, game_ids: &[String]) -> Result<Vec<StreamInfo>, Error> {
        if game_ids.is_empty() {
            return Ok(vec![]);
        }
        self.get_streams("game_id", game_ids).await
    }

    async fn get_user_id(&self, login: &str) -> Result<Option<String>, Error> {
        let page: HelixPage<HelixUser> =
            self.get_helix("users", &[("login", login)]).await?;
        Ok(page.data.into_iter().next().map(|u| u.id))
    }

    async fn get_display_names(&self, user_ids: &[String]) -> Result<Vec<String>, Error> {
        let mut out = Vec::new();
        for chunk in user_ids.chunks(MAX_IDS_PER_REQUEST) {
            let query: Vec<(&str, &str)> =
                chunk.iter().map(|id| ("id", id.as_str())).collect();
            let page: HelixPage<HelixUser> = self.get_helix("users", &query).await?;
            out.extend(page.data.into_iter().map(|u| u.display_name));
        }
        Ok(out)
    }
}
