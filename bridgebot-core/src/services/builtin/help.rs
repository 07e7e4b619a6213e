//! The help command. Holds a `Weak` back-reference to the dispatcher so the
//! handler can enumerate whichever registry it was invoked from.

use std::sync::{Arc, Weak};

use crate::services::adapter::{register_common_anonymous, CommonCommandSpec};
use crate::services::context::ChatContext;
use crate::services::dispatcher::Dispatcher;
use crate::services::registry::{handler, CommandCategory, CommandRegistry};
use crate::Error;

pub fn register(dispatcher: &Arc<Dispatcher>) -> Result<(), Error> {
    let weak: Weak<Dispatcher> = Arc::downgrade(dispatcher);
    register_common_anonymous(
        dispatcher,
        CommonCommandSpec {
            name: "help",
            category: CommandCategory::Help,
            short_description: "List available commands, or describe one command",
            usage: "help [command|admin]",
        },
        handler(move |ctx, param| {
            let weak = weak.clone();
            async move {
                let dispatcher = weak
                    .upgrade()
                    .ok_or_else(|| Error::Registry("dispatcher is gone".into()))?;
                let (registry, prefix) = match &ctx {
                    ChatContext::Twitch(_) => (&dispatcher.twitch, &dispatcher.twitch_prefix),
                    ChatContext::Discord(_) => (&dispatcher.discord, &dispatcher.discord_prefix),
                };
                Ok(render_help(registry, prefix, param.as_deref()))
            }
        }),
    )
}

fn render_help(registry: &CommandRegistry, prefix: &str, param: Option<&str>) -> String {
    match param {
        Some("admin") => render_listing(registry, prefix, CommandCategory::Admin),
        Some(name) => match registry.lookup(name) {
            Some(def) => format!(
                "{}{} - {}\nUsage: {}{}",
                prefix, def.name, def.short_description, prefix, def.usage
            ),
            None => format!("No such command '{name}'"),
        },
        // The general listing hides admin commands (behind `help admin`) and
        // the dynamically-added simple commands (they have their own lister).
        None => {
            let mut out = String::from("Available commands:");
            for category in [
                CommandCategory::General,
                CommandCategory::Help,
                CommandCategory::Accounts,
                CommandCategory::Channel,
            ] {
                let section = render_listing(registry, prefix, category);
                if !section.is_empty() {
                    out.push('\n');
                    out.push_str(&section);
                }
            }
            out
        }
    }
}

fn render_listing(registry: &CommandRegistry, prefix: &str, category: CommandCategory) -> String {
    let entries: Vec<String> = registry
        .list()
        .into_iter()
        .filter(|(_, cat, _)| *cat == category)
        .map(|(name, _, desc)| format!("{prefix}{name} - {desc}"))
        .collect();
    entries.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registry::{handler, CommandDefinition};

    fn noop() -> crate::services::registry::CommandHandler {
        handler(|_ctx, _param| async { Ok(String::new()) })
    }

    fn registry_with(entries: &[(&str, CommandCategory, &str)]) -> CommandRegistry {
        let registry = CommandRegistry::new();
        for (name, category, desc) in entries {
            registry
                .register(CommandDefinition {
                    name: name.to_string(),
                    category: *category,
                    short_description: desc.to_string(),
                    usage: name.to_string(),
                    handler: noop(),
                })
                .unwrap();
        }
        registry
    }

    #[test]
    fn general_listing_hides_admin_and_simple() {
        let registry = registry_with(&[
            ("ping", CommandCategory::General, "Ping"),
            ("shutdown", CommandCategory::Admin, "Stop the bot"),
            ("lurk", CommandCategory::Simple, "canned reply"),
        ]);
        let out = render_help(&registry, "!", None);
        assert!(out.contains("!ping"));
        assert!(!out.contains("shutdown"));
        assert!(!out.contains("lurk"));
    }

    #[test]
    fn admin_listing_shows_admin_only() {
        let registry = registry_with(&[
            ("ping", CommandCategory::General, "Ping"),
            ("shutdown", CommandCategory::Admin, "Stop the bot"),
        ]);
        let out = render_help(&registry, "!", Some("admin"));
        assert!(out.contains("!shutdown"));
        assert!(!out.contains("!ping"));
    }

    #[test]
    fn single_command_shows_usage() {
        let registry = registry_with(&[("ping", CommandCategory::General, "Ping")]);
        let out = render_help(&registry, "!", Some("PING"));
        assert!(out.contains("Usage: !ping"));
    }

    #[test]
    fn unknown_command_reported() {
        let registry = registry_with(&[]);
        assert_eq!(render_help(&registry, "!", Some("nope")), "No such command 'nope'");
    }
}
