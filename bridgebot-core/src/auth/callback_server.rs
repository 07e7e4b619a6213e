//! HTTP server for the twitch OAuth redirect. Each allowed channel gets a
//! random `oauth_state` stored on its settings row; the callback matches the
//! `state` query param against those rows and persists the exchanged tokens.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use axum_server::{Handle, Server};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use bridgebot_common::traits::repository_traits::ChannelSettingsRepository;

use crate::platforms::twitch_api::TwitchApiClient;
use crate::Error;

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Clone)]
pub struct CallbackState {
    pub channels: Arc<dyn ChannelSettingsRepository>,
    pub api: Arc<TwitchApiClient>,
    /// Must match the redirect uri the authorize link was built with.
    pub redirect_uri: String,
}

/// Binds the callback server and returns a handle for graceful shutdown.
pub async fn start_callback_server(
    addr: SocketAddr,
    state: CallbackState,
) -> Result<Handle, Error> {
    let app = Router::new()
        .route("/twitch_oauth", get(handle_callback))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let handle = Handle::new();
    let server = Server::bind(addr)
        .handle(handle.clone())
        .serve(app.into_make_service());
    info!("oauth callback server listening on http://{addr}");

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("callback server error: {e}");
        }
        info!("callback server shut down");
    });

    Ok(handle)
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(query): Query<AuthQuery>,
) -> (StatusCode, String) {
    if let Some(err) = query.error.as_ref() {
        let desc = query.error_description.unwrap_or_default();
        warn!("oauth callback returned error: {err} {desc}");
        return (StatusCode::BAD_REQUEST, format!("OAuth error: {err} {desc}"));
    }

    let (code, oauth_state) = match (query.code, query.state) {
        (Some(c), Some(s)) => (c, s),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                "Missing 'code' or 'state' query param".to_string(),
            )
        }
    };

    match complete_authorization(&state, &code, &oauth_state).await {
        Ok(channel) => {
            info!("stored oauth tokens for channel {channel}");
            (
                StatusCode::OK,
                format!("Authorization complete for {channel}. You can close this window now."),
            )
        }
        Err(Error::Auth(msg)) => {
            warn!("oauth callback rejected: {msg}");
            (
                StatusCode::BAD_REQUEST,
                "Unknown or expired authorization request".to_string(),
            )
        }
        Err(e) => {
            error!("oauth callback failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error while storing tokens".to_string(),
            )
        }
    }
}

/// Matches the state against a channel row, exchanges the code, stores the
/// tokens, and clears the single-use state.
async fn complete_authorization(
    state: &CallbackState,
    code: &str,
    oauth_state: &str,
) -> Result<String, Error> {
    let mut settings = state
        .channels
        .get_by_oauth_state(oauth_state)
        .await?
        .ok_or_else(|| Error::Auth(format!("no channel pending with state {oauth_state}")))?;

    let tokens = state.api.exchange_code(code, &state.redirect_uri).await?;
    settings.access_token = Some(tokens.access_token);
    settings.refresh_token = tokens.refresh_token;
    settings.oauth_state = None;
    state.channels.update(&settings).await?;
    Ok(settings.channel)
}
