//! Dynamic simple commands: fixed-reply commands added and removed from chat,
//! persisted so they survive restarts.

use std::sync::{Arc, Weak};

use bridgebot_common::models::SimpleCommand;
use bridgebot_common::traits::repository_traits::SimpleCommandRepository;

use crate::services::adapter::{
    register_common_admin, register_common_anonymous, user_handler, CommonCommandSpec,
};
use crate::services::builtin::BuiltinDeps;
use crate::services::dispatcher::{parse_next_word, Dispatcher};
use crate::services::registry::{handler, CommandCategory, CommandDefinition};
use crate::Error;

/// Registers one persisted simple command on both platform registries.
pub fn register_simple_command(dispatcher: &Dispatcher, cmd: &SimpleCommand) -> Result<(), Error> {
    for registry in [&dispatcher.twitch, &dispatcher.discord] {
        let reply = cmd.reply.clone();
        registry.register(CommandDefinition {
            name: cmd.name.clone(),
            category: CommandCategory::Simple,
            short_description: "Simple text reply".to_string(),
            usage: cmd.name.clone(),
            handler: handler(move |_ctx, _param| {
                let reply = reply.clone();
                async move { Ok(reply) }
            }),
        })?;
    }
    Ok(())
}

/// Loads every persisted simple command into the registries at startup.
pub async fn load_simple_commands(
    dispatcher: &Dispatcher,
    simple_commands: &dyn SimpleCommandRepository,
) -> Result<(), Error> {
    for cmd in simple_commands.list_all().await? {
        register_simple_command(dispatcher, &cmd)?;
    }
    Ok(())
}

pub fn register(dispatcher: &Arc<Dispatcher>, deps: &BuiltinDeps) -> Result<(), Error> {
    let repo = deps.simple_commands.clone();
    register_common_anonymous(
        dispatcher,
        CommonCommandSpec {
            name: "listsimplecommands",
            category: CommandCategory::General,
            short_description: "List the dynamically-added simple commands",
            usage: "listsimplecommands",
        },
        handler(move |_ctx, _param| {
            let repo = repo.clone();
            async move {
                let mut names: Vec<String> =
                    repo.list_all().await?.into_iter().map(|c| c.name).collect();
                if names.is_empty() {
                    return Ok("There are no simple commands".to_string());
                }
                names.sort_unstable();
                Ok(format!("Simple commands: {}", names.join(", ")))
            }
        }),
    )?;

    let repo = deps.simple_commands.clone();
    let weak: Weak<Dispatcher> = Arc::downgrade(dispatcher);
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "addsimplecommand",
            category: CommandCategory::Admin,
            short_description: "Add a command with a fixed text reply",
            usage: "addsimplecommand <name> <reply text>",
        },
        user_handler(move |_ctx, _user, param| {
            let repo = repo.clone();
            let weak = weak.clone();
            async move {
                let dispatcher = weak
                    .upgrade()
                    .ok_or_else(|| Error::Registry("dispatcher is gone".into()))?;
                let param = match param {
                    Some(p) => p,
                    None => return Ok("Usage: addsimplecommand <name> <reply text>".to_string()),
                };
                let (name, reply) = parse_next_word(&param, 0);
                let reply = match reply {
                    Some(r) => r,
                    None => return Ok("Usage: addsimplecommand <name> <reply text>".to_string()),
                };
                let name = name.to_lowercase();
                // Never shadow a built-in (or an existing simple command)
                // on either platform.
                if dispatcher.twitch.exists(&name) || dispatcher.discord.exists(&name) {
                    return Ok(format!("The command '{name}' already exists"));
                }
                let cmd = SimpleCommand::new(&name, &reply);
                repo.create(&cmd).await?;
                register_simple_command(&dispatcher, &cmd)?;
                Ok(format!("Added command '{name}'"))
            }
        }),
    )?;

    let repo = deps.simple_commands.clone();
    let weak: Weak<Dispatcher> = Arc::downgrade(dispatcher);
    register_common_admin(
        dispatcher,
        deps.users.clone(),
        CommonCommandSpec {
            name: "removesimplecommand",
            category: CommandCategory::Admin,
            short_description: "Remove a simple command",
            usage: "removesimplecommand <name>",
        },
        user_handler(move |_ctx, _user, param| {
            let repo = repo.clone();
            let weak = weak.clone();
            async move {
                let dispatcher = weak
                    .upgrade()
                    .ok_or_else(|| Error::Registry("dispatcher is gone".into()))?;
                let name = match param {
                    Some(p) => p.to_lowercase(),
                    None => return Ok("Usage: removesimplecommand <name>".to_string()),
                };
                if repo.get(&name).await?.is_none() {
                    return Ok(format!("No simple command named '{name}'"));
                }
                repo.delete(&name).await?;
                dispatcher.twitch.remove(&name);
                dispatcher.discord.remove(&name);
                Ok(format!("Removed command '{name}'"))
            }
        }),
    )?;
    Ok(())
}
