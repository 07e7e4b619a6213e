//! Admin commands managing the announcer's inputs and outputs: which discord
//! channels receive go-live announcements and which twitch channels are
//! watched for going live.

use std::sync::Arc;

use bridgebot_common::models::{AnnounceChannel, AnnounceType};

use crate::services::adapter::{register_common_admin, user_handler, CommonCommandSpec};
use crate::services::builtin::BuiltinDeps;
use crate::services::context::ChatContext;
use crate::services::dispatcher::Dispatcher;
use crate::services::registry::CommandCategory;
use crate::Error;

pub fn register(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    let announce = deps.announce_channels.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "addliveannouncechannel",
            category: CommandCategory::Admin,
            short_description: "Announce go-lives in this discord channel",
            usage: "addliveannouncechannel [discord channel id] [speedrun]",
        },
        user_handler(move |ctx, _user, param| {
            let announce = announce.clone();
            async move {
                let mut kind = AnnounceType::Live;
                let mut channel_id: Option<String> = None;
                for word in param.as_deref().unwrap_or("").split_whitespace() {
                    if word == "speedrun" {
                        kind = AnnounceType::SpeedrunLive;
                    } else if word.chars().all(|c| c.is_ascii_digit()) {
                        channel_id = Some(word.to_string());
                    } else {
                        return Ok(format!("Unknown argument '{word}'"));
                    }
                }
                // Without an explicit id the destination is wherever the
                // command was issued, which only makes sense on discord.
                let channel_id = match channel_id {
                    Some(id) => id,
                    None => match &ctx {
                        ChatContext::Discord(_) => ctx.channel().to_string(),
                        ChatContext::Twitch(_) => {
                            return Ok(
                                "Specify the discord channel id when using this from twitch"
                                    .to_string(),
                            )
                        }
                    },
                };
                let mut row = announce
                    .get(&channel_id)
                    .await?
                    .unwrap_or_else(|| AnnounceChannel::new(&channel_id));
                if !row.announce_types.insert(kind) {
                    return Ok("This channel already receives those announcements".to_string());
                }
                announce.upsert(&row).await?;
                Ok(match kind {
                    AnnounceType::SpeedrunLive => {
                        "Speedrun go-lives will now be announced here".to_string()
                    }
                    _ => "Go-lives will now be announced here".to_string(),
                })
            }
        }),
    )?;

    let announce = deps.announce_channels.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "removeliveannouncechannel",
            category: CommandCategory::Admin,
            short_description: "Stop announcing go-lives in this discord channel",
            usage: "removeliveannouncechannel [discord channel id]",
        },
        user_handler(move |ctx, _user, param| {
            let announce = announce.clone();
            async move {
                let channel_id = match param.as_deref().map(str::trim) {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => match &ctx {
                        ChatContext::Discord(_) => ctx.channel().to_string(),
                        ChatContext::Twitch(_) => {
                            return Ok(
                                "Specify the discord channel id when using this from twitch"
                                    .to_string(),
                            )
                        }
                    },
                };
                let mut row = match announce.get(&channel_id).await? {
                    Some(r) => r,
                    None => return Ok("That channel receives no announcements".to_string()),
                };
                let had_any = row.announce_types.remove(&AnnounceType::Live)
                    | row.announce_types.remove(&AnnounceType::SpeedrunLive);
                if !had_any {
                    return Ok("That channel receives no announcements".to_string());
                }
                if row.announce_types.is_empty() {
                    announce.delete(&row.channel).await?;
                } else {
                    announce.upsert(&row).await?;
                }
                Ok("Go-lives will no longer be announced here".to_string())
            }
        }),
    )?;

    let announce = deps.announce_channels.clone();
    let api = deps.streams_api.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "addstreamchannel",
            category: CommandCategory::Admin,
            short_description: "Watch a twitch channel for going live",
            usage: "addstreamchannel <twitch login>",
        },
        user_handler(move |_ctx, _user, param| {
            let announce = announce.clone();
            let api = api.clone();
            async move {
                let login = match param {
                    Some(p) => p.trim().to_lowercase(),
                    None => return Ok("Usage: addstreamchannel <twitch login>".to_string()),
                };
                let user_id = match api.get_user_id(&login).await? {
                    Some(id) => id,
                    None => return Ok(format!("No twitch user named '{login}'")),
                };
                let mut row = announce
                    .get(&user_id)
                    .await?
                    .unwrap_or_else(|| AnnounceChannel::new(&user_id));
                if !row.announce_types.insert(AnnounceType::Stream) {
                    return Ok(format!("Already watching '{login}'"));
                }
                announce.upsert(&row).await?;
                Ok(format!("Now watching '{login}' for going live"))
            }
        }),
    )?;

    let announce = deps.announce_channels.clone();
    let api = deps.streams_api.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "removestreamchannel",
            category: CommandCategory::Admin,
            short_description: "Stop watching a twitch channel",
            usage: "removestreamchannel <twitch login>",
        },
        user_handler(move |_ctx, _user, param| {
            let announce = announce.clone();
            let api = api.clone();
            async move {
                let login = match param {
                    Some(p) => p.trim().to_lowercase(),
                    None => return Ok("Usage: removestreamchannel <twitch login>".to_string()),
                };
                let user_id = match api.get_user_id(&login).await? {
                    Some(id) => id,
                    None => return Ok(format!("No twitch user named '{login}'")),
                };
                let mut row = match announce.get(&user_id).await? {
                    Some(r) => r,
                    None => return Ok(format!("Not watching '{login}'")),
                };
                if !row.announce_types.remove(&AnnounceType::Stream) {
                    return Ok(format!("Not watching '{login}'"));
                }
                if row.announce_types.is_empty() {
                    announce.delete(&row.channel).await?;
                } else {
                    announce.upsert(&row).await?;
                }
                Ok(format!("No longer watching '{login}'"))
            }
        }),
    )?;

    let announce = deps.announce_channels.clone();
    let api = deps.streams_api.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "liststreamchannels",
            category: CommandCategory::Admin,
            short_description: "List the watched twitch channels",
            usage: "liststreamchannels",
        },
        user_handler(move |_ctx, _user, _param| {
            let announce = announce.clone();
            let api = api.clone();
            async move {
                let ids: Vec<String> = announce
                    .list_by_type(AnnounceType::Stream)
                    .await?
                    .into_iter()
                    .map(|c| c.channel)
                    .collect();
                if ids.is_empty() {
                    return Ok("No watched twitch channels".to_string());
                }
                let mut names = api.get_display_names(&ids).await?;
                names.sort_unstable();
                Ok(format!("Watched channels: {}", names.join(", ")))
            }
        }),
    )?;
    Ok(())
}
