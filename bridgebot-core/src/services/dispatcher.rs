use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, error, trace};

use bridgebot_common::models::TwitchChannelSettings;
use bridgebot_common::traits::repository_traits::ChannelSettingsRepository;

use crate::services::context::{ChatContext, DiscordChatEvent, TwitchChatEvent};
use crate::services::registry::{CommandCategory, CommandDefinition, CommandRegistry};
use crate::Error;

const INTERNAL_ERROR_REPLY: &str = "Internal Error";

/// Splits the first whitespace-delimited word (after `skip` prefix bytes)
/// from the trimmed remainder. Remainder is None if empty.
pub fn parse_next_word(text: &str, skip: usize) -> (String, Option<String>) {
    let rest = &text[skip..];
    match rest.find(char::is_whitespace) {
        Some(idx) => {
            let word = rest[..idx].to_string();
            let remain = rest[idx..].trim();
            let remain = if remain.is_empty() {
                None
            } else {
                Some(remain.to_string())
            };
            (word, remain)
        }
        None => (rest.to_string(), None),
    }
}

/// Tracks the last time a cooldown-limited command produced a reply,
/// keyed by (channel, command name).
#[derive(Default)]
struct CooldownTracker {
    last_use: HashMap<(String, String), DateTime<Utc>>,
}

/// Owns the two platform registries and the dispatch path in front of them.
///
/// The channel-settings cache is a single-owner structure: every mutation
/// goes through `cache_settings`/`evict_settings` together with the
/// repository write, never by poking the map from handler code.
pub struct Dispatcher {
    pub twitch: CommandRegistry,
    pub discord: CommandRegistry,
    pub twitch_prefix: String,
    pub discord_prefix: String,
    channel_repo: Arc<dyn ChannelSettingsRepository>,
    channel_settings: DashMap<String, TwitchChannelSettings>,
    cooldowns: Mutex<CooldownTracker>,
}

impl Dispatcher {
    pub fn new(
        twitch_prefix: &str,
        discord_prefix: &str,
        channel_repo: Arc<dyn ChannelSettingsRepository>,
    ) -> Self {
        Self {
            twitch: CommandRegistry::new(),
            discord: CommandRegistry::new(),
            twitch_prefix: twitch_prefix.to_string(),
            discord_prefix: discord_prefix.to_string(),
            channel_repo,
            channel_settings: DashMap::new(),
            cooldowns: Mutex::new(CooldownTracker::default()),
        }
    }

    /// Loads all allowed-channel settings rows into the runtime cache.
    pub async fn load_channel_cache(&self) -> Result<(), Error> {
        for settings in self.channel_repo.list_all().await? {
            self.channel_settings.insert(settings.channel.clone(), settings);
        }
        debug!("Loaded {} channel settings rows", self.channel_settings.len());
        Ok(())
    }

    pub fn settings_for(&self, channel: &str) -> Option<TwitchChannelSettings> {
        self.channel_settings
            .get(&channel.to_lowercase())
            .map(|s| s.clone())
    }

    pub fn cache_settings(&self, settings: TwitchChannelSettings) {
        self.channel_settings.insert(settings.channel.clone(), settings);
    }

    pub fn evict_settings(&self, channel: &str) {
        self.channel_settings.remove(&channel.to_lowercase());
    }

    pub fn cached_channels(&self) -> Vec<String> {
        self.channel_settings.iter().map(|e| e.key().clone()).collect()
    }

    /// Dispatch one twitch chat line. Returns the reply to say in the
    /// originating channel, if any.
    pub async fn handle_twitch_message(&self, evt: TwitchChatEvent) -> Option<String> {
        if !evt.text.starts_with(&self.twitch_prefix) {
            return None;
        }
        let (word, param) = parse_next_word(&evt.text, self.twitch_prefix.len());
        let name = word.to_lowercase();
        trace!(channel = %evt.channel, user = %evt.login, cmd = %name, "twitch command");
        let def = self.twitch.lookup(&name)?;

        if let Some(settings) = self.settings_for(&evt.channel) {
            if settings.is_disabled_command(&name) {
                return None;
            }
            if def.category == CommandCategory::Simple
                && !self.cooldown_elapsed(&evt.channel, &name, settings.min_action_seconds)
            {
                return None;
            }
        }

        let ctx = ChatContext::Twitch(evt);
        self.invoke(&def, ctx, param).await
    }

    /// Dispatch one discord message. Same shape as the twitch path, minus
    /// the channel-settings gates (those are twitch-channel scoped).
    pub async fn handle_discord_message(&self, evt: DiscordChatEvent) -> Option<String> {
        if !evt.text.starts_with(&self.discord_prefix) {
            return None;
        }
        let (word, param) = parse_next_word(&evt.text, self.discord_prefix.len());
        let name = word.to_lowercase();
        trace!(channel = %evt.channel_id, user = %evt.author_name, cmd = %name, "discord command");
        let def = self.discord.lookup(&name)?;
        let ctx = ChatContext::Discord(evt);
        self.invoke(&def, ctx, param).await
    }

    /// Dispatch a slash-command interaction that arrives already split into
    /// name and parameter.
    pub async fn handle_discord_command(
        &self,
        name: &str,
        param: Option<String>,
        evt: DiscordChatEvent,
    ) -> Option<String> {
        let def = self.discord.lookup(name)?;
        let ctx = ChatContext::Discord(evt);
        self.invoke(&def, ctx, param).await
    }

    async fn invoke(
        &self,
        def: &CommandDefinition,
        ctx: ChatContext,
        param: Option<String>,
    ) -> Option<String> {
        let platform = ctx.platform_name();
        let author = ctx.author_login();
        match (def.handler)(ctx, param).await {
            Ok(reply) if reply.is_empty() => None,
            Ok(reply) => Some(reply),
            Err(e) => {
                error!(
                    command = %def.name,
                    platform,
                    user = %author,
                    "command handler failed: {e:?}"
                );
                Some(INTERNAL_ERROR_REPLY.to_string())
            }
        }
    }

    fn cooldown_elapsed(&self, channel: &str, name: &str, min_seconds: i32) -> bool {
        self.cooldown_elapsed_at(channel, name, min_seconds, Utc::now())
    }

    /// A use at exactly `min_seconds` after the last reply is still inside
    /// the window; suppressed uses do not restart it.
    fn cooldown_elapsed_at(
        &self,
        channel: &str,
        name: &str,
        min_seconds: i32,
        now: DateTime<Utc>,
    ) -> bool {
        if min_seconds <= 0 {
            return true;
        }
        let key = (channel.to_lowercase(), name.to_string());
        let mut tracker = self.cooldowns.lock().unwrap();
        if let Some(last) = tracker.last_use.get(&key) {
            if (now - *last).num_seconds() <= min_seconds as i64 {
                return false;
            }
        }
        tracker.last_use.insert(key, now);
        true
    }
}
