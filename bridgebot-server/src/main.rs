use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use bridgebot_common::traits::platform_traits::{
    ChatChannelControl, ChatSender, DirectMessenger, StreamSource,
};
use bridgebot_core::auth::{start_callback_server, CallbackState};
use bridgebot_core::platforms::discord::{DiscordInbound, DiscordPlatform};
use bridgebot_core::platforms::twitch_api::TwitchApiClient;
use bridgebot_core::platforms::twitch_irc::TwitchIrcPlatform;
use bridgebot_core::repositories::postgres::{
    PostgresAnnounceChannelRepository, PostgresChannelSettingsRepository,
    PostgresLiterallyRepository, PostgresQuoteRepository, PostgresSimpleCommandRepository,
    PostgresUserRepository,
};
use bridgebot_core::services::builtin::{self, BuiltinDeps};
use bridgebot_core::services::builtin::simple::load_simple_commands;
use bridgebot_core::services::dispatcher::Dispatcher;
use bridgebot_core::tasks::StreamAnnouncer;
use bridgebot_core::{Database, Error};

#[derive(Parser, Debug, Clone)]
#[command(name = "bridgebot")]
#[command(author, version, about = "Twitch/Discord chat bot with go-live announcements")]
struct Args {
    /// Address the OAuth callback server binds to
    #[arg(long, default_value = "127.0.0.1:9143")]
    callback_addr: String,

    /// Public redirect uri registered with twitch for the OAuth flow
    #[arg(long, default_value = "http://localhost:9143/twitch_oauth")]
    callback_public_url: String,

    /// Command prefix in twitch chat
    #[arg(long, default_value = "!")]
    twitch_prefix: String,

    /// Command prefix in discord channels
    #[arg(long, default_value = "!")]
    discord_prefix: String,

    /// Comma-separated twitch game ids polled for speedrun-tagged streams
    #[arg(long, default_value = "")]
    watched_game_ids: String,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("bridgebot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(sub).is_err() {
        eprintln!("tracing subscriber was already set");
    }
}

fn require_env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| Error::Auth(format!("{name} is not set")))
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!("bridgebot starting");

    if let Err(e) = run_server(args).await {
        error!("server error: {e:?}");
        std::process::exit(1);
    }
}

async fn run_server(args: Args) -> Result<(), Error> {
    let database_url = require_env("DATABASE_URL")?;
    let twitch_username = require_env("TWITCH_CHAT_USERNAME")?;
    let twitch_chat_token = require_env("TWITCH_CHAT_TOKEN")?;
    let twitch_client_id = require_env("TWITCH_CLIENT_ID")?;
    let twitch_client_secret = require_env("TWITCH_CLIENT_SECRET")?;
    let discord_token = require_env("DISCORD_TOKEN")?;

    let db = Database::new(&database_url).await?;
    db.migrate().await?;

    let users = Arc::new(PostgresUserRepository::new(db.pool().clone()));
    let quotes = Arc::new(PostgresQuoteRepository::new(db.pool().clone()));
    let literally = Arc::new(PostgresLiterallyRepository::new(db.pool().clone()));
    let simple_commands = Arc::new(PostgresSimpleCommandRepository::new(db.pool().clone()));
    let channels = Arc::new(PostgresChannelSettingsRepository::new(db.pool().clone()));
    let announce_channels = Arc::new(PostgresAnnounceChannelRepository::new(db.pool().clone()));

    let dispatcher = Arc::new(Dispatcher::new(
        &args.twitch_prefix,
        &args.discord_prefix,
        channels.clone(),
    ));
    dispatcher.load_channel_cache().await?;

    let helix = Arc::new(TwitchApiClient::new(&twitch_client_id, &twitch_client_secret));

    // Platforms come up before the builtin registrations so the handlers can
    // capture their outbound seams.
    let twitch = Arc::new(TwitchIrcPlatform::connect(&twitch_username, &twitch_chat_token).await?);
    let discord = Arc::new(DiscordPlatform::connect(&discord_token).await?);

    let watched_game_ids: Vec<String> = args
        .watched_game_ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    let announcer = Arc::new(StreamAnnouncer::new(
        helix.clone() as Arc<dyn StreamSource>,
        discord.clone() as Arc<dyn ChatSender>,
        announce_channels.clone(),
        watched_game_ids,
    ));

    let (shutdown_tx, _) = watch::channel(false);

    let deps = BuiltinDeps {
        users: users.clone(),
        quotes,
        literally,
        simple_commands: simple_commands.clone(),
        channels: channels.clone(),
        announce_channels,
        streams_api: helix.clone(),
        stream_cache: announcer.cache_handle(),
        discord_dm: discord.clone() as Arc<dyn DirectMessenger>,
        twitch_control: twitch.clone() as Arc<dyn ChatChannelControl>,
        shutdown: shutdown_tx.clone(),
    };
    builtin::register_builtin_commands(&dispatcher, &deps)?;
    load_simple_commands(&dispatcher, simple_commands.as_ref()).await?;

    let callback_addr: SocketAddr = args
        .callback_addr
        .parse()
        .map_err(|_| Error::Parse(format!("invalid callback addr: {}", args.callback_addr)))?;
    let callback_handle = start_callback_server(
        callback_addr,
        CallbackState {
            channels: channels.clone(),
            api: helix.clone(),
            redirect_uri: args.callback_public_url.clone(),
        },
    )
    .await?;

    for channel in dispatcher.cached_channels() {
        twitch.join_channel(&channel).await?;
    }

    let slash_specs: Vec<(String, String)> = dispatcher
        .discord
        .list()
        .into_iter()
        .map(|(name, _, desc)| (name, desc))
        .collect();
    if let Err(e) = discord.register_slash_commands(&slash_specs).await {
        warn!("slash command registration failed, prefix commands still work: {e}");
    }

    let announcer_task = announcer.clone().spawn(shutdown_tx.subscribe());
    let twitch_task = spawn_twitch_loop(twitch.clone(), dispatcher.clone(), shutdown_tx.subscribe());
    let discord_task =
        spawn_discord_loop(discord.clone(), dispatcher.clone(), shutdown_tx.subscribe());

    wait_for_shutdown(&shutdown_tx).await?;

    // A second signal skips the graceful teardown.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("second interrupt, exiting immediately");
            std::process::exit(1);
        }
    });

    info!("shutting down");
    let _ = tokio::time::timeout(Duration::from_secs(10), announcer_task).await;
    twitch.shutdown();
    twitch_task.abort();
    discord_task.abort();
    discord.disconnect();
    callback_handle.graceful_shutdown(Some(Duration::from_secs(5)));
    db.close().await;
    info!("bridgebot stopped");
    Ok(())
}

/// Resolves once a termination signal arrives or the admin shutdown command
/// flips the watch channel.
async fn wait_for_shutdown(shutdown_tx: &watch::Sender<bool>) -> Result<(), Error> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT");
            let _ = shutdown_tx.send(true);
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM");
            let _ = shutdown_tx.send(true);
        }
        _ = shutdown_rx.changed() => {
            info!("shutdown requested from chat");
        }
    }
    Ok(())
}

fn spawn_twitch_loop(
    twitch: Arc<TwitchIrcPlatform>,
    dispatcher: Arc<Dispatcher>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                evt = twitch.next_chat_event() => {
                    let evt = match evt {
                        Some(e) => e,
                        None => {
                            warn!("twitch chat connection closed");
                            break;
                        }
                    };
                    let channel = evt.channel.clone();
                    if let Some(reply) = dispatcher.handle_twitch_message(evt).await {
                        if let Err(e) = twitch.send_message(&channel, &reply).await {
                            error!("twitch reply failed: {e}");
                        }
                    }
                }
            }
        }
        info!("twitch dispatch loop ended");
    })
}

fn spawn_discord_loop(
    discord: Arc<DiscordPlatform>,
    dispatcher: Arc<Dispatcher>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let inbound = tokio::select! {
                _ = shutdown.changed() => break,
                inbound = discord.next_event() => match inbound {
                    Some(i) => i,
                    None => {
                        warn!("discord connection closed");
                        break;
                    }
                },
            };
            match inbound {
                DiscordInbound::Message(evt) => {
                    let channel = evt.channel_id.clone();
                    if let Some(reply) = dispatcher.handle_discord_message(evt).await {
                        if let Err(e) = discord.send_message(&channel, &reply).await {
                            error!("discord reply failed: {e}");
                        }
                    }
                }
                DiscordInbound::Command {
                    name,
                    param,
                    evt,
                    interaction_id,
                    interaction_token,
                } => {
                    // Interactions require a response even when a prefix
                    // command would have stayed silent.
                    let reply = dispatcher
                        .handle_discord_command(&name, param, evt)
                        .await
                        .unwrap_or_else(|| "Done".to_string());
                    if let Err(e) = discord
                        .respond_to_command(interaction_id, &interaction_token, &reply)
                        .await
                    {
                        error!("interaction response failed: {e}");
                    }
                }
            }
        }
        info!("discord dispatch loop ended");
    })
}
