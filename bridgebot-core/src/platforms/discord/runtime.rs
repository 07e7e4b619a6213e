//! Discord runtime on twilight: shard event loop, message/interaction intake,
//! and the outbound http seams.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_gateway::{
    self as gateway, CloseFrame, Config, Event, EventTypeFlags, Intents, MessageSender, Shard,
    StreamExt,
};
use twilight_http::client::ClientBuilder;
use twilight_http::Client as HttpClient;
use twilight_model::application::command::CommandType;
use twilight_model::application::interaction::application_command::CommandOptionValue;
use twilight_model::application::interaction::InteractionData;
use twilight_model::gateway::payload::incoming::MessageCreate;
use twilight_model::http::interaction::{
    InteractionResponse, InteractionResponseData, InteractionResponseType,
};
use twilight_model::id::marker::{
    ApplicationMarker, ChannelMarker, InteractionMarker, UserMarker,
};
use twilight_model::id::Id;
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

use bridgebot_common::traits::platform_traits::{ChatSender, DirectMessenger};

use crate::services::context::DiscordChatEvent;
use crate::Error;

/// One inbound discord event the bot cares about.
#[derive(Debug)]
pub enum DiscordInbound {
    /// Plain channel message (prefix commands).
    Message(DiscordChatEvent),
    /// Slash-command invocation, already split into name and parameter.
    Command {
        name: String,
        param: Option<String>,
        evt: DiscordChatEvent,
        interaction_id: Id<InteractionMarker>,
        interaction_token: String,
    },
}

async fn shard_runner(mut shard: Shard, tx: UnboundedSender<DiscordInbound>) {
    let shard_id = shard.id().number();
    info!("discord shard {shard_id} started");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(err) => {
                error!("discord shard {shard_id} event error: {err:?}");
                continue;
            }
        };
        match &event {
            Event::Ready(ready) => {
                info!(
                    "discord shard {shard_id} ready as {} ({})",
                    ready.user.name, ready.user.id
                );
            }
            Event::MessageCreate(msg) => {
                let msg: &MessageCreate = msg;
                if msg.author.bot {
                    debug!("ignoring bot message from {}", msg.author.name);
                    continue;
                }
                let evt = DiscordChatEvent {
                    channel_id: msg.channel_id.to_string(),
                    author_id: msg.author.id.to_string(),
                    author_name: msg.author.name.to_lowercase(),
                    text: msg.content.clone(),
                };
                if tx.send(DiscordInbound::Message(evt)).is_err() {
                    return;
                }
            }
            Event::InteractionCreate(interaction) => {
                let data = match &interaction.data {
                    Some(InteractionData::ApplicationCommand(data)) => data,
                    _ => continue,
                };
                let author = match interaction.author() {
                    Some(a) => a,
                    None => continue,
                };
                let channel_id = match &interaction.channel {
                    Some(c) => c.id.to_string(),
                    None => continue,
                };
                let param = data.options.iter().find_map(|opt| match &opt.value {
                    CommandOptionValue::String(s) if !s.trim().is_empty() => {
                        Some(s.trim().to_string())
                    }
                    _ => None,
                });
                let evt = DiscordChatEvent {
                    channel_id,
                    author_id: author.id.to_string(),
                    author_name: author.name.to_lowercase(),
                    text: String::new(),
                };
                let inbound = DiscordInbound::Command {
                    name: data.name.clone(),
                    param,
                    evt,
                    interaction_id: interaction.id,
                    interaction_token: interaction.token.clone(),
                };
                if tx.send(inbound).is_err() {
                    return;
                }
            }
            other => {
                trace!("discord shard {shard_id} unhandled event: {other:?}");
            }
        }
    }

    warn!("discord shard {shard_id} event loop ended");
}

pub struct DiscordPlatform {
    http: Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    rx: Mutex<UnboundedReceiver<DiscordInbound>>,
    shard_senders: Vec<MessageSender>,
    shard_tasks: Vec<JoinHandle<()>>,
}

impl DiscordPlatform {
    pub async fn connect(token: &str) -> Result<Self, Error> {
        if token.is_empty() {
            return Err(Error::Auth("discord token is empty".into()));
        }

        let http = Arc::new(
            ClientBuilder::new()
                .token(token.to_string())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        let application_id = http
            .current_user_application()
            .await
            .map_err(|e| Error::Platform(format!("discord application lookup failed: {e}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("discord application decode failed: {e}")))?
            .id;

        let (tx, rx) = unbounded_channel::<DiscordInbound>();

        let config = Config::new(
            token.to_string(),
            Intents::GUILDS
                | Intents::GUILD_MESSAGES
                | Intents::DIRECT_MESSAGES
                | Intents::MESSAGE_CONTENT,
        );
        let shards = gateway::create_recommended(&http, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("discord shard setup failed: {e}")))?;

        let mut shard_senders = Vec::new();
        let mut shard_tasks = Vec::new();
        for shard in shards {
            shard_senders.push(shard.sender());
            let tx = tx.clone();
            shard_tasks.push(tokio::spawn(shard_runner(shard, tx)));
        }

        Ok(Self {
            http,
            application_id,
            rx: Mutex::new(rx),
            shard_senders,
            shard_tasks,
        })
    }

    /// Next inbound event, or None once every shard is gone.
    pub async fn next_event(&self) -> Option<DiscordInbound> {
        self.rx.lock().await.recv().await
    }

    /// Publishes every named command as a global slash command with one
    /// optional string argument carrying the parameter text.
    pub async fn register_slash_commands(
        &self,
        commands: &[(String, String)],
    ) -> Result<(), Error> {
        let built: Vec<_> = commands
            .iter()
            .map(|(name, description)| {
                CommandBuilder::new(name, description, CommandType::ChatInput)
                    .option(StringBuilder::new("input", "Command arguments").required(false))
                    .build()
            })
            .collect();
        self.http
            .interaction(self.application_id)
            .set_global_commands(&built)
            .await
            .map_err(|e| Error::Platform(format!("slash command registration failed: {e}")))?;
        info!("registered {} global slash commands", built.len());
        Ok(())
    }

    pub async fn respond_to_command(
        &self,
        interaction_id: Id<InteractionMarker>,
        interaction_token: &str,
        text: &str,
    ) -> Result<(), Error> {
        self.http
            .interaction(self.application_id)
            .create_response(
                interaction_id,
                interaction_token,
                &InteractionResponse {
                    kind: InteractionResponseType::ChannelMessageWithSource,
                    data: Some(InteractionResponseData {
                        content: Some(text.to_string()),
                        ..Default::default()
                    }),
                },
            )
            .await
            .map_err(|e| Error::Platform(format!("interaction response failed: {e}")))?;
        Ok(())
    }

    pub fn disconnect(&self) {
        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in &self.shard_tasks {
            task.abort();
        }
    }
}

#[async_trait]
impl ChatSender for DiscordPlatform {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error> {
        let channel_id: u64 = channel
            .parse()
            .map_err(|_| Error::Platform(format!("invalid discord channel id: {channel}")))?;
        self.http
            .create_message(Id::<ChannelMarker>::new(channel_id))
            .content(text)
            .await
            .map_err(|e| Error::Platform(format!("discord send failed: {e:?}")))?;
        Ok(())
    }
}

#[async_trait]
impl DirectMessenger for DiscordPlatform {
    async fn send_dm(&self, user_id: &str, text: &str) -> Result<(), Error> {
        let user_id: u64 = user_id
            .parse()
            .map_err(|_| Error::Platform(format!("invalid discord user id: {user_id}")))?;
        let dm_channel = self
            .http
            .create_private_channel(Id::<UserMarker>::new(user_id))
            .await
            .map_err(|e| Error::Platform(format!("discord DM channel open failed: {e:?}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("discord DM channel decode failed: {e}")))?;
        self.http
            .create_message(dm_channel.id)
            .content(text)
            .await
            .map_err(|e| Error::Platform(format!("discord DM send failed: {e:?}")))?;
        Ok(())
    }
}
