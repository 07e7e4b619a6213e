mod helpers;

use std::sync::Arc;

use tokio::sync::watch;

use bridgebot_common::traits::repository_traits::{ChannelSettingsRepository, UserRepository};
use bridgebot_core::models::{User, UserClass};
use bridgebot_core::services::builtin::{register_builtin_commands, BuiltinDeps};
use bridgebot_core::services::dispatcher::Dispatcher;
use bridgebot_core::tasks::StreamAnnouncer;

use helpers::{
    discord_chat, twitch_chat, FakeStreamSource, MemoryAnnounceChannelRepository,
    MemoryChannelSettingsRepository, MemoryLiterallyRepository, MemoryQuoteRepository,
    MemorySimpleCommandRepository, MemoryUserRepository, RecordingChannelControl,
    RecordingChatSender, RecordingDirectMessenger,
};

struct Fixture {
    dispatcher: Arc<Dispatcher>,
    users: Arc<MemoryUserRepository>,
    channels: Arc<MemoryChannelSettingsRepository>,
    dm: Arc<RecordingDirectMessenger>,
    control: Arc<RecordingChannelControl>,
    shutdown_rx: watch::Receiver<bool>,
}

fn fixture() -> Fixture {
    let users = MemoryUserRepository::new();
    let quotes = MemoryQuoteRepository::new();
    let literally = MemoryLiterallyRepository::new();
    let simple_commands = MemorySimpleCommandRepository::new();
    let channels = MemoryChannelSettingsRepository::new();
    let announce_channels = MemoryAnnounceChannelRepository::new();
    let api = FakeStreamSource::new();
    let dm = RecordingDirectMessenger::new();
    let control = RecordingChannelControl::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let announcer = StreamAnnouncer::new(
        api.clone(),
        RecordingChatSender::new(),
        announce_channels.clone(),
        vec![],
    );

    let dispatcher = Arc::new(Dispatcher::new("!", "!", channels.clone()));
    let deps = BuiltinDeps {
        users: users.clone(),
        quotes,
        literally,
        simple_commands,
        channels: channels.clone(),
        announce_channels,
        streams_api: api,
        stream_cache: announcer.cache_handle(),
        discord_dm: dm.clone(),
        twitch_control: control.clone(),
        shutdown: shutdown_tx,
    };
    register_builtin_commands(&dispatcher, &deps).unwrap();

    Fixture {
        dispatcher,
        users,
        channels,
        dm,
        control,
        shutdown_rx,
    }
}

impl Fixture {
    async fn twitch_says(&self, login: &str, user_id: &str, text: &str) -> Option<String> {
        self.dispatcher
            .handle_twitch_message(twitch_chat("chan", login, user_id, text))
            .await
    }

    async fn discord_says(&self, author_id: &str, name: &str, text: &str) -> Option<String> {
        self.dispatcher
            .handle_discord_message(discord_chat("99", author_id, name, text))
            .await
    }

    async fn make_admin(&self, twitch_id: &str) {
        let mut user = User::new_twitch(twitch_id);
        user.user_class = UserClass::Admin.as_str().to_string();
        self.users.create(&user).await.unwrap();
    }
}

#[tokio::test]
async fn ping_answers_on_both_platforms() {
    let fx = fixture();
    assert_eq!(fx.twitch_says("a", "1", "!ping").await.as_deref(), Some("pong!"));
    assert_eq!(
        fx.discord_says("5", "someone", "!ping").await.as_deref(),
        Some("pong!")
    );
}

#[tokio::test]
async fn registered_command_prompts_unknown_users_to_register() {
    let fx = fixture();
    let reply = fx.twitch_says("newbie", "1", "!stylin").await.unwrap();
    assert_eq!(reply, "You must register first (!register)");
}

#[tokio::test]
async fn register_creates_a_user_once_per_platform() {
    let fx = fixture();
    let first = fx.twitch_says("newbie", "1", "!register").await.unwrap();
    assert!(first.contains("now registered"));
    let again = fx.twitch_says("newbie", "1", "!register").await.unwrap();
    assert!(again.contains("already registered"));
    assert_eq!(fx.users.count().await, 1);

    let discord = fx.discord_says("5", "someone", "!register").await.unwrap();
    assert!(discord.contains("now registered"));
    assert_eq!(fx.users.count().await, 2);
}

#[tokio::test]
async fn stylin_uses_the_stored_style() {
    let fx = fixture();
    fx.twitch_says("newbie", "1", "!register").await;
    let default_style = fx.twitch_says("newbie", "1", "!stylin").await.unwrap();
    assert_eq!(default_style, "newbie is Normal Style!");

    fx.twitch_says("newbie", "1", "!setstyle Swaggin' Style").await;
    let updated = fx.twitch_says("newbie", "1", "!stylin").await.unwrap();
    assert_eq!(updated, "newbie is Swaggin' Style!");
}

#[tokio::test]
async fn admin_commands_reject_plain_users() {
    let fx = fixture();
    fx.twitch_says("pleb", "1", "!register").await;
    let reply = fx.twitch_says("pleb", "1", "!shutdown").await.unwrap();
    assert_eq!(reply, "Permission denied");
    assert!(!*fx.shutdown_rx.borrow());
}

#[tokio::test]
async fn shutdown_flips_the_watch_channel() {
    let fx = fixture();
    fx.make_admin("1").await;
    let reply = fx.twitch_says("boss", "1", "!shutdown").await.unwrap();
    assert!(reply.contains("Shutting down"));
    assert!(*fx.shutdown_rx.borrow());
}

#[tokio::test]
async fn simple_commands_can_be_added_and_removed_at_runtime() {
    let fx = fixture();
    fx.make_admin("1").await;

    let added = fx
        .twitch_says("boss", "1", "!addsimplecommand lurk I'm lurking!")
        .await
        .unwrap();
    assert_eq!(added, "Added command 'lurk'");

    // Live on both platforms immediately.
    assert_eq!(fx.twitch_says("a", "2", "!lurk").await.as_deref(), Some("I'm lurking!"));
    assert_eq!(
        fx.discord_says("5", "someone", "!lurk").await.as_deref(),
        Some("I'm lurking!")
    );

    let duplicate = fx
        .twitch_says("boss", "1", "!addsimplecommand lurk another")
        .await
        .unwrap();
    assert_eq!(duplicate, "The command 'lurk' already exists");

    // Built-ins cannot be shadowed either.
    let shadow = fx
        .twitch_says("boss", "1", "!addsimplecommand ping no")
        .await
        .unwrap();
    assert_eq!(shadow, "The command 'ping' already exists");

    let removed = fx
        .twitch_says("boss", "1", "!removesimplecommand lurk")
        .await
        .unwrap();
    assert_eq!(removed, "Removed command 'lurk'");
    assert_eq!(fx.twitch_says("a", "2", "!lurk").await, None);
}

#[tokio::test]
async fn operator_commands_require_badges() {
    let fx = fixture();
    let denied = fx.twitch_says("viewer", "1", "!disablecmd ping").await.unwrap();
    assert_eq!(denied, "Permission denied");

    let mut evt = twitch_chat("chan", "streamer", "2", "!disablecmd ping");
    evt.is_broadcaster = true;
    let allowed = fx.dispatcher.handle_twitch_message(evt).await.unwrap();
    assert_eq!(allowed, "'ping' is now disabled in this channel");

    // The disable takes effect in that channel.
    assert_eq!(fx.twitch_says("viewer", "1", "!ping").await, None);

    let mut evt = twitch_chat("chan", "streamer", "2", "!enablecmd ping");
    evt.is_moderator = true;
    let enabled = fx.dispatcher.handle_twitch_message(evt).await.unwrap();
    assert_eq!(enabled, "'ping' is enabled again in this channel");
    assert_eq!(fx.twitch_says("viewer", "1", "!ping").await.as_deref(), Some("pong!"));
}

#[tokio::test]
async fn addtwitchchannel_persists_and_joins() {
    let fx = fixture();
    fx.make_admin("1").await;

    let reply = fx
        .twitch_says("boss", "1", "!addtwitchchannel #NewChan")
        .await
        .unwrap();
    assert_eq!(reply, "Joined channel 'newchan'");
    assert!(fx.channels.get("newchan").await.unwrap().is_some());
    assert_eq!(*fx.control.joined.lock().await, vec!["newchan".to_string()]);

    let reply = fx
        .twitch_says("boss", "1", "!removetwitchchannel newchan")
        .await
        .unwrap();
    assert_eq!(reply, "Left channel 'newchan'");
    assert!(fx.channels.get("newchan").await.unwrap().is_none());
    assert_eq!(*fx.control.left.lock().await, vec!["newchan".to_string()]);
}

#[tokio::test]
async fn generateapikey_is_discord_only_and_dms_the_key() {
    let fx = fixture();
    // Not registered on twitch at all.
    assert_eq!(fx.twitch_says("a", "1", "!generateapikey").await, None);

    fx.discord_says("5", "someone", "!register").await;
    let reply = fx
        .discord_says("5", "someone", "!generateapikey")
        .await
        .unwrap();
    assert!(reply.contains("check your DMs"));

    let dms = fx.dm.sent_dms().await;
    assert_eq!(dms.len(), 1);
    assert_eq!(dms[0].0, "5");
    let user = fx.users.get_by_discord_id("5").await.unwrap().unwrap();
    assert!(dms[0].1.contains(&user.api_key));
}

#[tokio::test]
async fn literally_clips_round_trip() {
    let fx = fixture();
    fx.make_admin("1").await;

    assert_eq!(
        fx.twitch_says("a", "2", "!literally").await.as_deref(),
        Some("No clips found!")
    );

    let added = fx
        .twitch_says("boss", "1", "!addliterally spikes | https://clips.example/abc")
        .await
        .unwrap();
    assert_eq!(added, "Added clip for death by spikes");

    assert_eq!(
        fx.twitch_says("a", "2", "!literally").await.as_deref(),
        Some("You LITERALLY can not die to spikes: https://clips.example/abc")
    );
    // Filter matches `what` case-insensitively.
    assert_eq!(
        fx.discord_says("5", "someone", "!literally SPIKE")
            .await
            .as_deref(),
        Some("You LITERALLY can not die to spikes: https://clips.example/abc")
    );
    assert_eq!(
        fx.twitch_says("a", "2", "!literally lava").await.as_deref(),
        Some("Nothing found for death by lava!")
    );

    let duplicate = fx
        .twitch_says("boss", "1", "!addliterally Spikes | https://clips.example/abc")
        .await
        .unwrap();
    assert_eq!(duplicate, "That clip is already saved for death by Spikes!");

    let malformed = fx
        .twitch_says("boss", "1", "!addliterally just some words")
        .await
        .unwrap();
    assert_eq!(malformed, "Usage: addliterally <what> | <clip url>");
}

#[tokio::test]
async fn blame_always_answers() {
    let fx = fixture();
    let reply = fx.twitch_says("a", "1", "!blame").await.unwrap();
    assert!(reply.starts_with("ProgChamp "));
    assert!(reply.ends_with('!'));
}

#[tokio::test]
async fn help_lists_visible_commands() {
    let fx = fixture();
    let listing = fx.twitch_says("a", "1", "!help").await.unwrap();
    assert!(listing.contains("!ping"));
    assert!(listing.contains("!quote"));
    // Admin commands hide behind `help admin`.
    assert!(!listing.contains("!shutdown"));
    let admin = fx.twitch_says("a", "1", "!help admin").await.unwrap();
    assert!(admin.contains("!shutdown"));
}

#[tokio::test]
async fn link_commands_round_trip_through_chat() {
    let fx = fixture();
    fx.twitch_says("runnerguy", "100", "!register").await;
    fx.discord_says("200", "coolname", "!register").await;

    let started = fx
        .twitch_says("runnerguy", "100", "!startlink coolname")
        .await
        .unwrap();
    let token = started
        .split("confirmlink ")
        .nth(1)
        .and_then(|rest| rest.split('\'').next())
        .expect("token in reply")
        .to_string();

    let confirmed = fx
        .discord_says("200", "coolname", &format!("!confirmlink {token}"))
        .await
        .unwrap();
    assert!(confirmed.contains("now linked"));

    let merged = fx.users.get_by_twitch_id("100").await.unwrap().unwrap();
    assert_eq!(merged.discord_user_id, "200");
    assert!(merged.is_linked());
    assert_eq!(fx.users.count().await, 1);
}
