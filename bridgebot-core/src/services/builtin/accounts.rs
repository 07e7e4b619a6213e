//! Account commands: per-platform registration, two-step cross-platform
//! linking, style, and api keys.
//!
//! `register` is deliberately not a common command: each platform registers
//! its own handler because the created row differs.

use std::sync::Arc;

use uuid::Uuid;

use bridgebot_common::models::{User, DEFAULT_STYLE};
use bridgebot_common::traits::repository_traits::UserRepository;

use crate::services::adapter::{
    register_common_registered, user_handler, CommonCommandSpec,
};
use crate::services::builtin::BuiltinDeps;
use crate::services::context::ChatContext;
use crate::services::dispatcher::Dispatcher;
use crate::services::link_service::LinkService;
use crate::services::registry::{handler, CommandCategory, CommandDefinition};
use crate::Error;

pub fn register(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    register_register(dispatcher, deps)?;
    register_linking(dispatcher, deps)?;
    register_style(dispatcher, deps)?;
    register_apikey(dispatcher, deps)?;
    Ok(())
}

fn register_register(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    let users = deps.users.clone();
    dispatcher.twitch.register(CommandDefinition {
        name: "register".to_string(),
        category: CommandCategory::Accounts,
        short_description: "Register your twitch account with the bot".to_string(),
        usage: "register".to_string(),
        handler: handler(move |ctx, _param| {
            let users = users.clone();
            async move {
                let twitch_id = ctx.author_platform_id()?.to_string();
                if users.get_by_twitch_id(&twitch_id).await?.is_some() {
                    return Ok(format!("{} you are already registered!", ctx.mention()));
                }
                users.create(&User::new_twitch(&twitch_id)).await?;
                Ok(format!("{} you are now registered!", ctx.mention()))
            }
        }),
    })?;

    let users = deps.users.clone();
    dispatcher.discord.register(CommandDefinition {
        name: "register".to_string(),
        category: CommandCategory::Accounts,
        short_description: "Register your discord account with the bot".to_string(),
        usage: "register".to_string(),
        handler: handler(move |ctx, _param| {
            let users = users.clone();
            async move {
                let discord_id = ctx.author_platform_id()?.to_string();
                if users.get_by_discord_id(&discord_id).await?.is_some() {
                    return Ok(format!("{} you are already registered!", ctx.mention()));
                }
                users.create(&User::new_discord(&discord_id)).await?;
                Ok(format!("{} you are now registered!", ctx.mention()))
            }
        }),
    })?;
    Ok(())
}

fn register_linking(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    let links = Arc::new(LinkService::new(deps.users.clone()));

    let svc = links.clone();
    let twitch_prefix = dispatcher.twitch_prefix.clone();
    let discord_prefix = dispatcher.discord_prefix.clone();
    register_common_registered(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "startlink",
            category: CommandCategory::Accounts,
            short_description: "Begin linking this account with your account on the other platform",
            usage: "startlink <username on the other platform>",
        },
        user_handler(move |ctx, user, param| {
            let svc = svc.clone();
            let twitch_prefix = twitch_prefix.clone();
            let discord_prefix = discord_prefix.clone();
            async move {
                if user.is_linked() {
                    return Ok(
                        "This account is already linked and cannot be linked again!".to_string()
                    );
                }
                let other_username = match param {
                    Some(p) => p,
                    None => {
                        return Ok(format!(
                            "You must specify your {} username to link with",
                            ctx.other_platform_name()
                        ))
                    }
                };
                let token = svc.start_link(&user, &other_username).await?;
                // The confirm happens on the other platform, so name that
                // platform's prefix in the instructions.
                let confirm_prefix = match &ctx {
                    ChatContext::Twitch(_) => discord_prefix,
                    ChatContext::Discord(_) => twitch_prefix,
                };
                Ok(format!(
                    "Now send '{confirm_prefix}confirmlink {token}' from your {} account ({other_username}) to finish linking",
                    ctx.other_platform_name()
                ))
            }
        }),
    )?;

    register_common_registered(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "confirmlink",
            category: CommandCategory::Accounts,
            short_description: "Finish linking an account from the other platform",
            usage: "confirmlink <token>",
        },
        user_handler(move |ctx, user, param| {
            let svc = links.clone();
            async move {
                if user.is_linked() {
                    return Ok(
                        "This account is already linked and cannot be linked again!".to_string()
                    );
                }
                let token = match param {
                    Some(p) => p,
                    None => return Ok("You must specify the link token".to_string()),
                };
                match svc.confirm_link(&ctx, &user, token.trim()).await? {
                    Some(_) => Ok(
                        "Your twitch and discord accounts are now linked! Note: if you were using an api key, it has been reset"
                            .to_string(),
                    ),
                    None => Ok(format!(
                        "Could not find a pending link for your {} account. Did you start the link from your {} account with this username?",
                        ctx.platform_name(),
                        ctx.other_platform_name()
                    )),
                }
            }
        }),
    )?;
    Ok(())
}

fn register_style(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    register_common_registered(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "stylin",
            category: CommandCategory::Accounts,
            short_description: "Show off your style",
            usage: "stylin",
        },
        user_handler(|ctx, user, _param| async move {
            Ok(format!("{} is {}!", ctx.mention(), user.style))
        }),
    )?;

    let users = deps.users.clone();
    register_common_registered(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "setstyle",
            category: CommandCategory::Accounts,
            short_description: "Set your style",
            usage: "setstyle [new style]",
        },
        user_handler(move |ctx, user, param| {
            let users = users.clone();
            async move {
                let style = param.unwrap_or_else(|| DEFAULT_STYLE.to_string());
                let mut updated = user;
                updated.style = style.clone();
                users.update(&updated).await?;
                Ok(format!("{} is now {}!", ctx.mention(), style))
            }
        }),
    )?;
    Ok(())
}

/// Discord-only: the fresh key goes out as a DM, never into a public channel.
fn register_apikey(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    let users: Arc<dyn UserRepository> = deps.users.clone();
    let dm = deps.discord_dm.clone();
    let prefix = dispatcher.discord_prefix.clone();
    dispatcher.discord.register(CommandDefinition {
        name: "generateapikey".to_string(),
        category: CommandCategory::Accounts,
        short_description: "Generate a fresh api key and DM it to you".to_string(),
        usage: "generateapikey".to_string(),
        handler: handler(move |ctx, _param| {
            let users = users.clone();
            let dm = dm.clone();
            let prefix = prefix.clone();
            async move {
                let discord_id = ctx.author_platform_id()?.to_string();
                let mut user = match users.get_by_discord_id(&discord_id).await? {
                    Some(u) => u,
                    None => return Ok(format!("You must register first ({prefix}register)")),
                };
                user.api_key = Uuid::new_v4().to_string();
                users.update(&user).await?;
                dm.send_dm(
                    &discord_id,
                    &format!("Your new api key is: {}", user.api_key),
                )
                .await?;
                Ok(format!("{} check your DMs!", ctx.mention()))
            }
        }),
    })?;
    Ok(())
}
