//! Channel management: which twitch channels the bot sits in (bot admin) and
//! per-channel command gating (broadcaster/moderator of that channel).

use std::sync::{Arc, Weak};

use bridgebot_common::models::TwitchChannelSettings;
use bridgebot_common::traits::repository_traits::ChannelSettingsRepository;

use crate::services::adapter::{register_common_admin, user_handler, CommonCommandSpec};
use crate::services::builtin::BuiltinDeps;
use crate::services::context::ChatContext;
use crate::services::dispatcher::Dispatcher;
use crate::services::registry::{handler, CommandCategory, CommandDefinition, CommandHandler};
use crate::Error;

pub fn register(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    register_operator_commands(dispatcher, deps)?;
    register_admin_commands(dispatcher, deps)?;
    Ok(())
}

/// Wraps a handler with the broadcaster-or-moderator gate. Twitch-only by
/// construction; these are never registered on the discord registry.
fn operator_gate<F, Fut>(f: F) -> CommandHandler
where
    F: Fn(ChatContext, Option<String>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<String, Error>> + Send + 'static,
{
    let inner = Arc::new(f);
    handler(move |ctx, param| {
        let inner = inner.clone();
        async move {
            if !ctx.is_channel_operator() {
                return Ok("Permission denied".to_string());
            }
            inner(ctx, param).await
        }
    })
}

fn register_operator_commands(
    dispatcher: &Arc<Dispatcher>,
    deps: &BuiltinDeps,
) -> Result<(), Error> {
    let weak: Weak<Dispatcher> = Arc::downgrade(dispatcher);
    let channels = deps.channels.clone();
    dispatcher.twitch.register(CommandDefinition {
        name: "disablecmd".to_string(),
        category: CommandCategory::Channel,
        short_description: "Disable a command in this channel (broadcaster/mods)".to_string(),
        usage: "disablecmd <command name>".to_string(),
        handler: operator_gate(move |ctx, param| {
            let weak = weak.clone();
            let channels = channels.clone();
            async move {
                let dispatcher = upgrade(&weak)?;
                let name = match param {
                    Some(p) => p.to_lowercase(),
                    None => return Ok("Usage: disablecmd <command name>".to_string()),
                };
                if name.contains(',') {
                    return Ok("Command names cannot contain a comma".to_string());
                }
                // Keep the escape hatch reachable.
                if name == "disablecmd" || name == "enablecmd" {
                    return Ok(format!("'{name}' cannot be disabled"));
                }
                if !dispatcher.twitch.exists(&name) {
                    return Ok(format!("No such command '{name}'"));
                }
                let mut settings = settings_for(&dispatcher, &channels, ctx.channel()).await?;
                if !settings.disabled_commands.insert(name.clone()) {
                    return Ok(format!("'{name}' is already disabled here"));
                }
                channels.update(&settings).await?;
                dispatcher.cache_settings(settings);
                Ok(format!("'{name}' is now disabled in this channel"))
            }
        }),
    })?;

    let weak: Weak<Dispatcher> = Arc::downgrade(dispatcher);
    let channels = deps.channels.clone();
    dispatcher.twitch.register(CommandDefinition {
        name: "enablecmd".to_string(),
        category: CommandCategory::Channel,
        short_description: "Re-enable a disabled command in this channel (broadcaster/mods)"
            .to_string(),
        usage: "enablecmd <command name>".to_string(),
        handler: operator_gate(move |ctx, param| {
            let weak = weak.clone();
            let channels = channels.clone();
            async move {
                let dispatcher = upgrade(&weak)?;
                let name = match param {
                    Some(p) => p.to_lowercase(),
                    None => return Ok("Usage: enablecmd <command name>".to_string()),
                };
                let mut settings = settings_for(&dispatcher, &channels, ctx.channel()).await?;
                if !settings.disabled_commands.remove(&name) {
                    return Ok(format!("'{name}' is not disabled here"));
                }
                channels.update(&settings).await?;
                dispatcher.cache_settings(settings);
                Ok(format!("'{name}' is enabled again in this channel"))
            }
        }),
    })?;

    let weak: Weak<Dispatcher> = Arc::downgrade(dispatcher);
    let channels = deps.channels.clone();
    dispatcher.twitch.register(CommandDefinition {
        name: "listdisabledcmds".to_string(),
        category: CommandCategory::Channel,
        short_description: "List the commands disabled in this channel".to_string(),
        usage: "listdisabledcmds".to_string(),
        handler: operator_gate(move |ctx, _param| {
            let weak = weak.clone();
            let channels = channels.clone();
            async move {
                let dispatcher = upgrade(&weak)?;
                let settings = settings_for(&dispatcher, &channels, ctx.channel()).await?;
                if settings.disabled_commands.is_empty() {
                    return Ok("No commands are disabled in this channel".to_string());
                }
                let mut names: Vec<&str> =
                    settings.disabled_commands.iter().map(String::as_str).collect();
                names.sort_unstable();
                Ok(format!("Disabled commands: {}", names.join(", ")))
            }
        }),
    })?;

    let weak: Weak<Dispatcher> = Arc::downgrade(dispatcher);
    let channels = deps.channels.clone();
    dispatcher.twitch.register(CommandDefinition {
        name: "setminactiontime".to_string(),
        category: CommandCategory::Channel,
        short_description: "Set the cooldown (seconds) between simple-command replies here"
            .to_string(),
        usage: "setminactiontime <seconds>".to_string(),
        handler: operator_gate(move |ctx, param| {
            let weak = weak.clone();
            let channels = channels.clone();
            async move {
                let dispatcher = upgrade(&weak)?;
                let seconds: i32 = match param.as_deref().map(str::trim).map(str::parse) {
                    Some(Ok(n)) if n >= 0 => n,
                    _ => return Ok("Usage: setminactiontime <seconds>".to_string()),
                };
                let mut settings = settings_for(&dispatcher, &channels, ctx.channel()).await?;
                settings.min_action_seconds = seconds;
                channels.update(&settings).await?;
                dispatcher.cache_settings(settings);
                Ok(format!("Minimum action time is now {seconds}s"))
            }
        }),
    })?;
    Ok(())
}

fn register_admin_commands(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    let weak: Weak<Dispatcher> = Arc::downgrade(dispatcher);
    let channels = deps.channels.clone();
    let control = deps.twitch_control.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "addtwitchchannel",
            category: CommandCategory::Admin,
            short_description: "Have the bot join a twitch channel",
            usage: "addtwitchchannel <channel>",
        },
        user_handler(move |_ctx, _user, param| {
            let weak = weak.clone();
            let channels = channels.clone();
            let control = control.clone();
            async move {
                let dispatcher = upgrade(&weak)?;
                let channel = match param {
                    Some(p) => p.trim_start_matches('#').to_lowercase(),
                    None => return Ok("Usage: addtwitchchannel <channel>".to_string()),
                };
                if channels.get(&channel).await?.is_some() {
                    return Ok(format!("Already in channel '{channel}'"));
                }
                let settings = TwitchChannelSettings::new(&channel);
                channels.create(&settings).await?;
                dispatcher.cache_settings(settings);
                control.join_channel(&channel).await?;
                Ok(format!("Joined channel '{channel}'"))
            }
        }),
    )?;

    let weak: Weak<Dispatcher> = Arc::downgrade(dispatcher);
    let channels = deps.channels.clone();
    let control = deps.twitch_control.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "removetwitchchannel",
            category: CommandCategory::Admin,
            short_description: "Have the bot leave a twitch channel",
            usage: "removetwitchchannel <channel>",
        },
        user_handler(move |_ctx, _user, param| {
            let weak = weak.clone();
            let channels = channels.clone();
            let control = control.clone();
            async move {
                let dispatcher = upgrade(&weak)?;
                let channel = match param {
                    Some(p) => p.trim_start_matches('#').to_lowercase(),
                    None => return Ok("Usage: removetwitchchannel <channel>".to_string()),
                };
                if channels.get(&channel).await?.is_none() {
                    return Ok(format!("Not in channel '{channel}'"));
                }
                channels.delete(&channel).await?;
                dispatcher.evict_settings(&channel);
                control.leave_channel(&channel).await?;
                Ok(format!("Left channel '{channel}'"))
            }
        }),
    )?;

    let channels = deps.channels.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "listtwitchchannels",
            category: CommandCategory::Admin,
            short_description: "List the twitch channels the bot sits in",
            usage: "listtwitchchannels",
        },
        user_handler(move |_ctx, _user, _param| {
            let channels = channels.clone();
            async move {
                let mut names: Vec<String> = channels
                    .list_all()
                    .await?
                    .into_iter()
                    .map(|s| s.channel)
                    .collect();
                if names.is_empty() {
                    return Ok("Not in any twitch channels".to_string());
                }
                names.sort_unstable();
                Ok(format!("Twitch channels: {}", names.join(", ")))
            }
        }),
    )?;
    Ok(())
}

fn upgrade(weak: &Weak<Dispatcher>) -> Result<Arc<Dispatcher>, Error> {
    weak.upgrade()
        .ok_or_else(|| Error::Registry("dispatcher is gone".into()))
}

/// Cached settings for the channel, falling back to the repository and then
/// to a fresh default row (the bot only sits in channels with a row, but the
/// cache can be cold right after a join).
async fn settings_for(
    dispatcher: &Dispatcher,
    channels: &Arc<dyn ChannelSettingsRepository>,
    channel: &str,
) -> Result<TwitchChannelSettings, Error> {
    if let Some(settings) = dispatcher.settings_for(channel) {
        return Ok(settings);
    }
    if let Some(settings) = channels.get(channel).await? {
        return Ok(settings);
    }
    let settings = TwitchChannelSettings::new(channel);
    channels.create(&settings).await?;
    Ok(settings)
}
