//! Registers one shared command definition on both platform registries.
//!
//! Three modes: anonymous (no identity resolution), registered (the caller
//! must resolve to a known user), and admin (registered plus a role check,
//! always reported under the Admin category).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bridgebot_common::models::User;
use bridgebot_common::traits::repository_traits::UserRepository;

use crate::services::context::ChatContext;
use crate::services::dispatcher::Dispatcher;
use crate::services::registry::{
    CommandCategory, CommandDefinition, CommandHandler, HandlerFuture,
};
use crate::Error;

/// Handler shape for commands that require a resolved user.
pub type UserCommandHandler =
    Arc<dyn Fn(ChatContext, User, Option<String>) -> HandlerFuture + Send + Sync>;

pub fn user_handler<F, Fut>(f: F) -> UserCommandHandler
where
    F: Fn(ChatContext, User, Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, Error>> + Send + 'static,
{
    Arc::new(move |ctx, user, param| Box::pin(f(ctx, user, param)))
}

/// Shared metadata for a command registered through the adapter.
#[derive(Clone)]
pub struct CommonCommandSpec {
    pub name: &'static str,
    pub category: CommandCategory,
    pub short_description: &'static str,
    pub usage: &'static str,
}

pub fn register_common_anonymous(
    dispatcher: &Dispatcher,
    spec: CommonCommandSpec,
    handler: CommandHandler,
) -> Result<(), Error> {
    register_both(dispatcher, &spec, spec.category, handler)
}

pub fn register_common_registered(
    dispatcher: &Dispatcher,
    users: Arc<dyn UserRepository>,
    spec: CommonCommandSpec,
    handler: UserCommandHandler,
) -> Result<(), Error> {
    let wrapped = resolve_user_wrapper(dispatcher, users, handler, false);
    register_both(dispatcher, &spec, spec.category, wrapped)
}

pub fn register_common_admin(
    dispatcher: &Dispatcher,
    users: Arc<dyn UserRepository>,
    spec: CommonCommandSpec,
    handler: UserCommandHandler,
) -> Result<(), Error> {
    let wrapped = resolve_user_wrapper(dispatcher, users, handler, true);
    // Admin commands are one reporting category regardless of what the
    // definition declared.
    register_both(dispatcher, &spec, CommandCategory::Admin, wrapped)
}

fn register_both(
    dispatcher: &Dispatcher,
    spec: &CommonCommandSpec,
    category: CommandCategory,
    handler: CommandHandler,
) -> Result<(), Error> {
    dispatcher.twitch.register(CommandDefinition {
        name: spec.name.to_string(),
        category,
        short_description: spec.short_description.to_string(),
        usage: spec.usage.to_string(),
        handler: handler.clone(),
    })?;
    dispatcher.discord.register(CommandDefinition {
        name: spec.name.to_string(),
        category,
        short_description: spec.short_description.to_string(),
        usage: spec.usage.to_string(),
        handler,
    })?;
    Ok(())
}

fn resolve_user_wrapper(
    dispatcher: &Dispatcher,
    users: Arc<dyn UserRepository>,
    handler: UserCommandHandler,
    require_admin: bool,
) -> CommandHandler {
    let twitch_prefix = dispatcher.twitch_prefix.clone();
    let discord_prefix = dispatcher.discord_prefix.clone();
    Arc::new(move |ctx: ChatContext, param: Option<String>| {
        let users = users.clone();
        let handler = handler.clone();
        let prefix = match ctx {
            ChatContext::Twitch(_) => twitch_prefix.clone(),
            ChatContext::Discord(_) => discord_prefix.clone(),
        };
        let fut: Pin<Box<dyn Future<Output = Result<String, Error>> + Send>> =
            Box::pin(async move {
                let platform_id = ctx.author_platform_id()?.to_string();
                let user = match &ctx {
                    ChatContext::Twitch(_) => users.get_by_twitch_id(&platform_id).await?,
                    ChatContext::Discord(_) => users.get_by_discord_id(&platform_id).await?,
                };
                let user = match user {
                    Some(u) => u,
                    None => {
                        return Ok(format!(
                            "You must register first ({prefix}register)"
                        ))
                    }
                };
                if require_admin && !user.is_admin() {
                    return Ok("Permission denied".to_string());
                }
                handler(ctx, user, param).await
            });
        fut
    })
}
