mod helpers;

use std::sync::Arc;

use bridgebot_core::models::TwitchChannelSettings;
use bridgebot_core::services::dispatcher::{parse_next_word, Dispatcher};
use bridgebot_core::services::registry::{handler, CommandCategory, CommandDefinition};
use bridgebot_core::Error;

use helpers::{twitch_chat, MemoryChannelSettingsRepository};

fn test_dispatcher() -> Arc<Dispatcher> {
    Arc::new(Dispatcher::new(
        "!",
        "!",
        MemoryChannelSettingsRepository::new(),
    ))
}

fn fixed_reply(name: &str, category: CommandCategory, reply: &'static str) -> CommandDefinition {
    CommandDefinition {
        name: name.to_string(),
        category,
        short_description: reply.to_string(),
        usage: name.to_string(),
        handler: handler(move |_ctx, _param| async move { Ok(reply.to_string()) }),
    }
}

#[test]
fn parse_next_word_splits_command_and_remainder() {
    assert_eq!(
        parse_next_word("!quote some filter", 1),
        ("quote".to_string(), Some("some filter".to_string()))
    );
    assert_eq!(parse_next_word("!ping", 1), ("ping".to_string(), None));
    assert_eq!(parse_next_word("!ping   ", 1), ("ping".to_string(), None));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let dispatcher = test_dispatcher();
    dispatcher
        .twitch
        .register(fixed_reply("ping", CommandCategory::General, "pong!"))
        .unwrap();
    let err = dispatcher
        .twitch
        .register(fixed_reply("PING", CommandCategory::General, "other"))
        .unwrap_err();
    assert!(matches!(err, Error::Registry(_)));

    // The original registration still answers.
    let reply = dispatcher
        .handle_twitch_message(twitch_chat("chan", "viewer", "1", "!ping"))
        .await;
    assert_eq!(reply.as_deref(), Some("pong!"));
}

#[tokio::test]
async fn unknown_and_unprefixed_messages_are_silent() {
    let dispatcher = test_dispatcher();
    dispatcher
        .twitch
        .register(fixed_reply("ping", CommandCategory::General, "pong!"))
        .unwrap();

    let unknown = dispatcher
        .handle_twitch_message(twitch_chat("chan", "viewer", "1", "!nope"))
        .await;
    assert_eq!(unknown, None);

    let unprefixed = dispatcher
        .handle_twitch_message(twitch_chat("chan", "viewer", "1", "ping"))
        .await;
    assert_eq!(unprefixed, None);
}

#[tokio::test]
async fn lookup_is_case_insensitive() {
    let dispatcher = test_dispatcher();
    dispatcher
        .twitch
        .register(fixed_reply("ping", CommandCategory::General, "pong!"))
        .unwrap();
    let reply = dispatcher
        .handle_twitch_message(twitch_chat("chan", "viewer", "1", "!PiNg"))
        .await;
    assert_eq!(reply.as_deref(), Some("pong!"));
}

#[tokio::test]
async fn disabled_command_is_suppressed_in_that_channel_only() {
    let dispatcher = test_dispatcher();
    dispatcher
        .twitch
        .register(fixed_reply("ping", CommandCategory::General, "pong!"))
        .unwrap();

    let mut settings = TwitchChannelSettings::new("muted");
    settings.disabled_commands.insert("ping".to_string());
    dispatcher.cache_settings(settings);
    dispatcher.cache_settings(TwitchChannelSettings::new("open"));

    let muted = dispatcher
        .handle_twitch_message(twitch_chat("muted", "viewer", "1", "!Ping"))
        .await;
    assert_eq!(muted, None);

    let open = dispatcher
        .handle_twitch_message(twitch_chat("open", "viewer", "1", "!ping"))
        .await;
    assert_eq!(open.as_deref(), Some("pong!"));
}

#[tokio::test]
async fn simple_command_cooldown_suppresses_rapid_reuse() {
    let dispatcher = test_dispatcher();
    dispatcher
        .twitch
        .register(fixed_reply("lurk", CommandCategory::Simple, "lurking!"))
        .unwrap();
    dispatcher
        .twitch
        .register(fixed_reply("ping", CommandCategory::General, "pong!"))
        .unwrap();

    let mut settings = TwitchChannelSettings::new("chan");
    settings.min_action_seconds = 300;
    dispatcher.cache_settings(settings);

    let first = dispatcher
        .handle_twitch_message(twitch_chat("chan", "a", "1", "!lurk"))
        .await;
    assert_eq!(first.as_deref(), Some("lurking!"));

    let second = dispatcher
        .handle_twitch_message(twitch_chat("chan", "b", "2", "!lurk"))
        .await;
    assert_eq!(second, None);

    // Cooldown only applies to simple commands.
    let ping = dispatcher
        .handle_twitch_message(twitch_chat("chan", "a", "1", "!ping"))
        .await;
    assert_eq!(ping.as_deref(), Some("pong!"));
}

#[tokio::test]
async fn handler_error_becomes_internal_error_reply() {
    let dispatcher = test_dispatcher();
    dispatcher
        .twitch
        .register(CommandDefinition {
            name: "boom".to_string(),
            category: CommandCategory::General,
            short_description: "always fails".to_string(),
            usage: "boom".to_string(),
            handler: handler(|_ctx, _param| async {
                Err(Error::Platform("backend down".into()))
            }),
        })
        .unwrap();

    let reply = dispatcher
        .handle_twitch_message(twitch_chat("chan", "viewer", "1", "!boom"))
        .await;
    assert_eq!(reply.as_deref(), Some("Internal Error"));
}

#[tokio::test]
async fn empty_reply_means_silence() {
    let dispatcher = test_dispatcher();
    dispatcher
        .twitch
        .register(CommandDefinition {
            name: "quiet".to_string(),
            category: CommandCategory::General,
            short_description: "says nothing".to_string(),
            usage: "quiet".to_string(),
            handler: handler(|_ctx, _param| async { Ok(String::new()) }),
        })
        .unwrap();

    let reply = dispatcher
        .handle_twitch_message(twitch_chat("chan", "viewer", "1", "!quiet"))
        .await;
    assert_eq!(reply, None);
}

#[tokio::test]
async fn registries_are_independent_per_platform() {
    let dispatcher = test_dispatcher();
    dispatcher
        .twitch
        .register(fixed_reply("twitchonly", CommandCategory::General, "here"))
        .unwrap();

    let reply = dispatcher
        .handle_discord_message(helpers::discord_chat("99", "5", "someone", "!twitchonly"))
        .await;
    assert_eq!(reply, None);
}
