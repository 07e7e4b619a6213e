//! Built-in chat commands, registered at startup. Registration failures are
//! configuration errors and abort the process.

pub mod accounts;
pub mod announce_admin;
pub mod channel_admin;
pub mod general;
pub mod help;
pub mod literally;
pub mod simple;

use std::sync::Arc;

use tokio::sync::watch;

use bridgebot_common::traits::platform_traits::{
    ChatChannelControl, DirectMessenger, StreamSource,
};
use bridgebot_common::traits::repository_traits::{
    AnnounceChannelRepository, ChannelSettingsRepository, LiterallyRepository, QuoteRepository,
    SimpleCommandRepository, UserRepository,
};

use crate::services::dispatcher::Dispatcher;
use crate::tasks::stream_announcer::StreamCacheHandle;
use crate::Error;

/// Everything the built-in handlers reach out to.
#[derive(Clone)]
pub struct BuiltinDeps {
    pub users: Arc<dyn UserRepository>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub literally: Arc<dyn LiterallyRepository>,
    pub simple_commands: Arc<dyn SimpleCommandRepository>,
    pub channels: Arc<dyn ChannelSettingsRepository>,
    pub announce_channels: Arc<dyn AnnounceChannelRepository>,
    pub streams_api: Arc<dyn StreamSource>,
    pub stream_cache: StreamCacheHandle,
    pub discord_dm: Arc<dyn DirectMessenger>,
    pub twitch_control: Arc<dyn ChatChannelControl>,
    pub shutdown: watch::Sender<bool>,
}

pub fn register_builtin_commands(
    dispatcher: &Arc<Dispatcher>,
    deps: &BuiltinDeps,
) -> Result<(), Error> {
    help::register(dispatcher)?;
    general::register(dispatcher, deps)?;
    literally::register(dispatcher, deps)?;
    accounts::register(dispatcher, deps)?;
    simple::register(dispatcher, deps)?;
    channel_admin::register(dispatcher, deps)?;
    announce_admin::register(dispatcher, deps)?;
    Ok(())
}
