use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One currently-live broadcast as reported by the streaming API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub id: String,
    /// Display name of the broadcaster.
    pub user: String,
    /// Lowercased login of the broadcaster, used to build the stream url.
    pub login: String,
    pub title: String,
    pub game: String,
    pub tags: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl StreamInfo {
    pub fn url(&self) -> String {
        format!("https://twitch.tv/{}", self.login)
    }
}
