//! General-purpose commands: ping, quotes, and the live-stream listing.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use bridgebot_common::models::{Quote, StreamInfo};

use crate::services::adapter::{
    register_common_admin, register_common_anonymous, user_handler, CommonCommandSpec,
};
use crate::services::builtin::BuiltinDeps;
use crate::services::context::ChatContext;
use crate::services::dispatcher::Dispatcher;
use crate::services::registry::{handler, CommandCategory};
use crate::Error;

pub fn register(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    register_common_anonymous(
        dispatcher,
        CommonCommandSpec {
            name: "ping",
            category: CommandCategory::General,
            short_description: "Check that the bot is alive",
            usage: "ping",
        },
        handler(|_ctx, _param| async { Ok("pong!".to_string()) }),
    )?;

    let quotes = deps.quotes.clone();
    register_common_anonymous(
        dispatcher,
        CommonCommandSpec {
            name: "quote",
            category: CommandCategory::General,
            short_description: "Say a random quote, optionally filtered by a search term",
            usage: "quote [search term]",
        },
        handler(move |_ctx, param| {
            let quotes = quotes.clone();
            async move {
                match quotes.get_random(param.as_deref()).await? {
                    Some(q) => Ok(q.display()),
                    None => Ok("No quotes found!".to_string()),
                }
            }
        }),
    )?;

    let cache = deps.stream_cache.clone();
    register_common_anonymous(
        dispatcher,
        CommonCommandSpec {
            name: "streams",
            category: CommandCategory::General,
            short_description: "List the streams the bot currently sees live",
            usage: "streams",
        },
        handler(move |ctx, _param| {
            let cache = cache.clone();
            async move {
                let streams = cache.active_streams().await;
                Ok(render_streams(&ctx, &streams))
            }
        }),
    )?;

    register_common_anonymous(
        dispatcher,
        CommonCommandSpec {
            name: "blame",
            category: CommandCategory::General,
            short_description: "Who to blame?",
            usage: "blame",
        },
        handler(|ctx, _param| async move { Ok(render_blame(&ctx, rand::random::<f64>())) }),
    )?;

    let quotes = deps.quotes.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "addquote",
            category: CommandCategory::Admin,
            short_description: "Save a new quote",
            usage: "addquote [author |] <quote text>",
        },
        user_handler(move |ctx, _user, param| {
            let quotes = quotes.clone();
            async move {
                let param = match param {
                    Some(p) => p,
                    None => return Ok("Usage: addquote <quote text>".to_string()),
                };
                // `author | text` attributes the quote; bare text credits
                // whoever is adding it.
                let (author, text) = match param.split_once('|') {
                    Some((a, t)) if !t.trim().is_empty() => {
                        (a.trim().to_string(), t.trim().to_string())
                    }
                    _ => (ctx.display_name().to_string(), param.trim().to_string()),
                };
                let date = format!("[{}]", Utc::now().format("%Y-%m-%d"));
                let quote = Quote::new(&text, &author, Some(&date));
                quotes.create(&quote).await?;
                Ok(format!("Added quote {}", quote.quote_id))
            }
        }),
    )?;

    let quotes = deps.quotes.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "removequote",
            category: CommandCategory::Admin,
            short_description: "Delete a quote by its id",
            usage: "removequote <quote id>",
        },
        user_handler(move |_ctx, _user, param| {
            let quotes = quotes.clone();
            async move {
                let raw = match param {
                    Some(p) => p,
                    None => return Ok("Usage: removequote <quote id>".to_string()),
                };
                let quote_id = match Uuid::parse_str(raw.trim()) {
                    Ok(id) => id,
                    Err(_) => return Ok(format!("'{raw}' is not a valid quote id")),
                };
                if quotes.delete(quote_id).await? {
                    Ok("Quote removed".to_string())
                } else {
                    Ok("No quote with that id".to_string())
                }
            }
        }),
    )?;

    let shutdown = deps.shutdown.clone();
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "shutdown",
            category: CommandCategory::Admin,
            short_description: "Stop the bot",
            usage: "shutdown",
        },
        user_handler(move |_ctx, _user, _param| {
            let shutdown = shutdown.clone();
            async move {
                let _ = shutdown.send(true);
                Ok("Shutting down...".to_string())
            }
        }),
    )?;

    Ok(())
}

// The custom emote only renders on discord; twitch gets the plain name. The
// 1% roll pins the blame on whoever asked.
fn render_blame(ctx: &ChatContext, roll: f64) -> String {
    let champ = match ctx {
        ChatContext::Twitch(_) => "ProgChamp",
        ChatContext::Discord(_) => "<:ProgChamp:281409807754461184>",
    };
    if roll < 0.99 {
        format!("{champ} xKilios!")
    } else {
        format!("{champ} {}!", ctx.display_name())
    }
}

fn render_streams(ctx: &ChatContext, streams: &[StreamInfo]) -> String {
    if streams.is_empty() {
        return "There are no active streams!".to_string();
    }
    match ctx {
        ChatContext::Twitch(_) => streams
            .iter()
            .map(|s| format!("{} is streaming {}: {}", s.user, s.game, s.url()))
            .collect::<Vec<_>>()
            .join(" | "),
        // Underscores in names would italicize on discord; urls go in <> to
        // suppress the embed.
        ChatContext::Discord(_) => streams
            .iter()
            .map(|s| {
                format!(
                    "{} is streaming {}: <{}>",
                    s.user.replace('_', "\\_"),
                    s.game,
                    s.url()
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
