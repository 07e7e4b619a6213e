//! In-memory repository and platform fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use bridgebot_core::models::{
    AnnounceChannel, AnnounceType, Literally, Quote, SimpleCommand, StreamInfo,
    TwitchChannelSettings, User,
};
use bridgebot_core::services::context::{DiscordChatEvent, TwitchChatEvent};
use bridgebot_core::Error;
use bridgebot_common::traits::platform_traits::{
    ChatChannelControl, ChatSender, DirectMessenger, StreamSource,
};
use bridgebot_common::traits::repository_traits::{
    AnnounceChannelRepository, ChannelSettingsRepository, LiterallyRepository, QuoteRepository,
    SimpleCommandRepository, UserRepository,
};

// ---------- repositories ----------

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn count(&self) -> usize {
        self.users.lock().await.len()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User) -> Result<(), Error> {
        self.users.lock().await.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<User>, Error> {
        Ok(self.users.lock().await.get(&user_id).cloned())
    }

    async fn update(&self, user: &User) -> Result<(), Error> {
        self.users.lock().await.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), Error> {
        self.users.lock().await.remove(&user_id);
        Ok(())
    }

    async fn get_by_twitch_id(&self, twitch_user_id: &str) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.twitch_user_id == twitch_user_id)
            .cloned())
    }

    async fn get_by_discord_id(&self, discord_user_id: &str) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.discord_user_id == discord_user_id)
            .cloned())
    }

    async fn get_by_link_token(&self, link_token: &str) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.link_token.as_deref() == Some(link_token))
            .cloned())
    }

    async fn combine(
        &self,
        twitch_user: &User,
        discord_user: &User,
        combined: &User,
    ) -> Result<(), Error> {
        let mut users = self.users.lock().await;
        users.remove(&twitch_user.user_id);
        users.remove(&discord_user.user_id);
        users.insert(combined.user_id, combined.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryQuoteRepository {
    quotes: Mutex<Vec<Quote>>,
}

impl MemoryQuoteRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl QuoteRepository for MemoryQuoteRepository {
    async fn create(&self, quote: &Quote) -> Result<(), Error> {
        self.quotes.lock().await.push(quote.clone());
        Ok(())
    }

    async fn delete(&self, quote_id: Uuid) -> Result<bool, Error> {
        let mut quotes = self.quotes.lock().await;
        let before = quotes.len();
        quotes.retain(|q| q.quote_id != quote_id);
        Ok(quotes.len() < before)
    }

    async fn get_random(&self, filter: Option<&str>) -> Result<Option<Quote>, Error> {
        let quotes = self.quotes.lock().await;
        Ok(quotes
            .iter()
            .find(|q| match filter {
                Some(f) => {
                    let f = f.to_lowercase();
                    q.quote.to_lowercase().contains(&f) || q.user.to_lowercase().contains(&f)
                }
                None => true,
            })
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryLiterallyRepository {
    clips: Mutex<Vec<Literally>>,
}

impl MemoryLiterallyRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl LiterallyRepository for MemoryLiterallyRepository {
    async fn create(&self, literally: &Literally) -> Result<(), Error> {
        self.clips.lock().await.push(literally.clone());
        Ok(())
    }

    async fn get_random(&self, filter: Option<&str>) -> Result<Option<Literally>, Error> {
        let clips = self.clips.lock().await;
        Ok(clips
            .iter()
            .find(|l| match filter {
                Some(f) => l.what.to_lowercase().contains(&f.to_lowercase()),
                None => true,
            })
            .cloned())
    }

    async fn is_duplicate(&self, what: &str, clip: &str) -> Result<bool, Error> {
        Ok(self
            .clips
            .lock()
            .await
            .iter()
            .any(|l| l.what.eq_ignore_ascii_case(what) && l.clip == clip))
    }
}

#[derive(Default)]
pub struct MemorySimpleCommandRepository {
    commands: Mutex<HashMap<String, SimpleCommand>>,
}

impl MemorySimpleCommandRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl SimpleCommandRepository for MemorySimpleCommandRepository {
    async fn create(&self, cmd: &SimpleCommand) -> Result<(), Error> {
        self.commands
            .lock()
            .await
            .insert(cmd.name.clone(), cmd.clone());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<SimpleCommand>, Error> {
        Ok(self.commands.lock().await.get(name).cloned())
    }

    async fn delete(&self, name: &str) -> Result<(), Error> {
        self.commands.lock().await.remove(name);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<SimpleCommand>, Error> {
        Ok(self.commands.lock().await.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryChannelSettingsRepository {
    channels: Mutex<HashMap<String, TwitchChannelSettings>>,
}

impl MemoryChannelSettingsRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ChannelSettingsRepository for MemoryChannelSettingsRepository {
    async fn create(&self, settings: &TwitchChannelSettings) -> Result<(), Error> {
        self.channels
            .lock()
            .await
            .insert(settings.channel.clone(), settings.clone());
        Ok(())
    }

    async fn get(&self, channel: &str) -> Result<Option<TwitchChannelSettings>, Error> {
        Ok(self.channels.lock().await.get(channel).cloned())
    }

    async fn update(&self, settings: &TwitchChannelSettings) -> Result<(), Error> {
        self.channels
            .lock()
            .await
            .insert(settings.channel.clone(), settings.clone());
        Ok(())
    }

    async fn delete(&self, channel: &str) -> Result<(), Error> {
        self.channels.lock().await.remove(channel);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TwitchChannelSettings>, Error> {
        Ok(self.channels.lock().await.values().cloned().collect())
    }

    async fn get_by_oauth_state(
        &self,
        state: &str,
    ) -> Result<Option<TwitchChannelSettings>, Error> {
        Ok(self
            .channels
            .lock()
            .await
            .values()
            .find(|c| c.oauth_state.as_deref() == Some(state))
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryAnnounceChannelRepository {
    channels: Mutex<HashMap<String, AnnounceChannel>>,
}

impl MemoryAnnounceChannelRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed(&self, channel: &str, types: &[AnnounceType]) {
        let mut row = AnnounceChannel::new(channel);
        row.announce_types.extend(types.iter().copied());
        self.channels.lock().await.insert(row.channel.clone(), row);
    }
}

#[async_trait]
impl AnnounceChannelRepository for MemoryAnnounceChannelRepository {
    async fn upsert(&self, channel: &AnnounceChannel) -> Result<(), Error> {
        self.channels
            .lock()
            .await
            .insert(channel.channel.clone(), channel.clone());
        Ok(())
    }

    async fn get(&self, channel: &str) -> Result<Option<AnnounceChannel>, Error> {
        Ok(self.channels.lock().await.get(channel).cloned())
    }

    async fn delete(&self, channel: &str) -> Result<(), Error> {
        self.channels.lock().await.remove(channel);
        Ok(())
    }

    async fn list_by_type(&self, kind: AnnounceType) -> Result<Vec<AnnounceChannel>, Error> {
        Ok(self
            .channels
            .lock()
            .await
            .values()
            .filter(|c| c.announce_types.contains(&kind))
            .cloned()
            .collect())
    }
}

// ---------- platforms ----------

/// Records every outbound message so tests can assert on them.
#[derive(Default)]
pub struct RecordingChatSender {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingChatSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ChatSender for RecordingChatSender {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error> {
        self.sent
            .lock()
            .await
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDirectMessenger {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingDirectMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn sent_dms(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl DirectMessenger for RecordingDirectMessenger {
    async fn send_dm(&self, user_id: &str, text: &str) -> Result<(), Error> {
        self.sent
            .lock()
            .await
            .push((user_id.to_string(), text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingChannelControl {
    pub joined: Mutex<Vec<String>>,
    pub left: Mutex<Vec<String>>,
}

impl RecordingChannelControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ChatChannelControl for RecordingChannelControl {
    async fn join_channel(&self, channel: &str) -> Result<(), Error> {
        self.joined.lock().await.push(channel.to_string());
        Ok(())
    }

    async fn leave_channel(&self, channel: &str) -> Result<(), Error> {
        self.left.lock().await.push(channel.to_string());
        Ok(())
    }
}

/// Configurable stream source: tests set the live list between poll cycles.
#[derive(Default)]
pub struct FakeStreamSource {
    pub user_streams: Mutex<Vec<StreamInfo>>,
    pub game_streams: Mutex<Vec<StreamInfo>>,
    pub user_ids: Mutex<HashMap<String, String>>,
}

impl FakeStreamSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn set_user_streams(&self, streams: Vec<StreamInfo>) {
        *self.user_streams.lock().await = streams;
    }

    pub async fn set_game_streams(&self, streams: Vec<StreamInfo>) {
        *self.game_streams.lock().await = streams;
    }
}

#[async_trait]
impl StreamSource for FakeStreamSource {
    async fn get_streams_by_user_ids(&self, _user_ids: &[String]) -> Result<Vec<StreamInfo>, Error> {
        Ok(self.user_streams.lock().await.clone())
    }

    async fn get_streams_by_game_ids(&self, _game_ids: &[String]) -> Result<Vec<StreamInfo>, Error> {
        Ok(self.game_streams.lock().await.clone())
    }

    async fn get_user_id(&self, login: &str) -> Result<Option<String>, Error> {
        Ok(self.user_ids.lock().await.get(login).cloned())
    }

    async fn get_display_names(&self, user_ids: &[String]) -> Result<Vec<String>, Error> {
        Ok(user_ids.to_vec())
    }
}

// ---------- event builders ----------

pub fn twitch_chat(channel: &str, login: &str, user_id: &str, text: &str) -> TwitchChatEvent {
    TwitchChatEvent {
        channel: channel.to_string(),
        login: login.to_string(),
        user_id: Some(user_id.to_string()),
        display_name: login.to_string(),
        text: text.to_string(),
        is_broadcaster: false,
        is_moderator: false,
    }
}

pub fn discord_chat(channel_id: &str, author_id: &str, author_name: &str, text: &str) -> DiscordChatEvent {
    DiscordChatEvent {
        channel_id: channel_id.to_string(),
        author_id: author_id.to_string(),
        author_name: author_name.to_string(),
        text: text.to_string(),
    }
}

pub fn live_stream(id: &str, user: &str, title: &str, game: &str) -> StreamInfo {
    StreamInfo {
        id: id.to_string(),
        user: user.to_string(),
        login: user.to_lowercase(),
        title: title.to_string(),
        game: game.to_string(),
        tags: vec![],
        started_at: Utc::now(),
    }
}
