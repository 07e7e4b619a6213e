use async_trait::async_trait;

use crate::error::Error;
use crate::models::stream::StreamInfo;

/// Outbound message sink for one chat platform. The announcer and the
/// dispatch loop only ever talk to platforms through this seam.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error>;
}

/// Private-message sink, kept separate from `ChatSender` because only the
/// discord side can deliver DMs.
#[async_trait]
pub trait DirectMessenger: Send + Sync {
    async fn send_dm(&self, user_id: &str, text: &str) -> Result<(), Error>;
}

/// Joining and leaving chat channels at runtime (twitch side).
#[async_trait]
pub trait ChatChannelControl: Send + Sync {
    async fn join_channel(&self, channel: &str) -> Result<(), Error>;
    async fn leave_channel(&self, channel: &str) -> Result<(), Error>;
}

/// Read side of the external streaming-service API.
#[async_trait]
pub trait StreamSource: Send + Sync {
    async fn get_streams_by_user_ids(&self, user_ids: &[String])
        -> Result<Vec<StreamInfo>, Error>;
    async fn get_streams_by_game_ids(&self, game_ids: &[String])
        -> Result<Vec<StreamInfo>, Error>;
    /// Twitch user id for a login name, if the login exists.
    async fn get_user_id(&self, login: &str) -> Result<Option<String>, Error>;
    async fn get_display_names(&self, user_ids: &[String]) -> Result<Vec<String>, Error>;
}
