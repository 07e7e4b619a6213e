use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Error;
use crate::models::announce_channel::{AnnounceChannel, AnnounceType};
use crate::models::channel::TwitchChannelSettings;
use crate::models::literally::Literally;
use crate::models::quote::Quote;
use crate::models::simple_command::SimpleCommand;
use crate::models::user::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), Error>;
    async fn get(&self, user_id: Uuid) -> Result<Option<User>, Error>;
    async fn update(&self, user: &User) -> Result<(), Error>;
    async fn delete(&self, user_id: Uuid) -> Result<(), Error>;
    async fn get_by_twitch_id(&self, twitch_user_id: &str) -> Result<Option<User>, Error>;
    async fn get_by_discord_id(&self, discord_user_id: &str) -> Result<Option<User>, Error>;
    async fn get_by_link_token(&self, link_token: &str) -> Result<Option<User>, Error>;

    /// Deletes both source rows and inserts the combined row in a single
    /// transaction. A failure rolls back all three writes.
    async fn combine(
        &self,
        twitch_user: &User,
        discord_user: &User,
        combined: &User,
    ) -> Result<(), Error>;
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(&self, quote: &Quote) -> Result<(), Error>;
    async fn delete(&self, quote_id: Uuid) -> Result<bool, Error>;
    /// Random quote, optionally restricted to rows whose text or author
    /// contains `filter` (case-insensitive).
    async fn get_random(&self, filter: Option<&str>) -> Result<Option<Quote>, Error>;
}

#[async_trait]
pub trait LiterallyRepository: Send + Sync {
    async fn create(&self, literally: &Literally) -> Result<(), Error>;
    /// Random clip, optionally restricted to deaths whose `what` contains
    /// `filter` (case-insensitive).
    async fn get_random(&self, filter: Option<&str>) -> Result<Option<Literally>, Error>;
    /// A (what, clip) pair that is already saved, compared case-insensitively
    /// on `what`.
    async fn is_duplicate(&self, what: &str, clip: &str) -> Result<bool, Error>;
}

#[async_trait]
pub trait SimpleCommandRepository: Send + Sync {
    async fn create(&self, cmd: &SimpleCommand) -> Result<(), Error>;
    async fn get(&self, name: &str) -> Result<Option<SimpleCommand>, Error>;
    async fn delete(&self, name: &str) -> Result<(), Error>;
    async fn list_all(&self) -> Result<Vec<SimpleCommand>, Error>;
}

#[async_trait]
pub trait ChannelSettingsRepository: Send + Sync {
    async fn create(&self, settings: &TwitchChannelSettings) -> Result<(), Error>;
    async fn get(&self, channel: &str) -> Result<Option<TwitchChannelSettings>, Error>;
    async fn update(&self, settings: &TwitchChannelSettings) -> Result<(), Error>;
    async fn delete(&self, channel: &str) -> Result<(), Error>;
    async fn list_all(&self) -> Result<Vec<TwitchChannelSettings>, Error>;
    async fn get_by_oauth_state(&self, state: &str)
        -> Result<Option<TwitchChannelSettings>, Error>;
}

#[async_trait]
pub trait AnnounceChannelRepository: Send + Sync {
    async fn upsert(&self, channel: &AnnounceChannel) -> Result<(), Error>;
    async fn get(&self, channel: &str) -> Result<Option<AnnounceChannel>, Error>;
    async fn delete(&self, channel: &str) -> Result<(), Error>;
    async fn list_by_type(&self, kind: AnnounceType) -> Result<Vec<AnnounceChannel>, Error>;
}
