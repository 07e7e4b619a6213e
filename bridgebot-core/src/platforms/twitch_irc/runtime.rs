//! Twitch chat runtime: wraps the raw IRC client, converts PRIVMSG lines into
//! chat events, and exposes the outbound seams the rest of the bot uses.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, trace};

use bridgebot_common::traits::platform_traits::{ChatChannelControl, ChatSender};

use crate::platforms::twitch_irc::client::{IrcClient, IrcLine};
use crate::services::context::TwitchChatEvent;
use crate::Error;

pub struct TwitchIrcPlatform {
    client: IrcClient,
    rx: Mutex<mpsc::UnboundedReceiver<TwitchChatEvent>>,
    convert_task: JoinHandle<()>,
}

impl TwitchIrcPlatform {
    /// Connects and authenticates. The token must carry the `oauth:` prefix
    /// twitch chat expects.
    pub async fn connect(username: &str, oauth_token: &str) -> Result<Self, Error> {
        if !oauth_token.starts_with("oauth:") {
            return Err(Error::Auth(
                "twitch chat token must start with 'oauth:'".into(),
            ));
        }
        let mut client = IrcClient::connect(username, oauth_token).await?;
        let mut incoming = client
            .incoming
            .take()
            .ok_or_else(|| Error::Platform("irc client produced no incoming channel".into()))?;

        let (tx, rx) = mpsc::unbounded_channel::<TwitchChatEvent>();
        let convert_task = tokio::spawn(async move {
            while let Some(line) = incoming.recv().await {
                match line.command.as_str() {
                    "PRIVMSG" => {
                        if let Some(evt) = chat_event_from_line(&line) {
                            if tx.send(evt).is_err() {
                                break;
                            }
                        }
                    }
                    other => trace!("ignoring irc command {other}"),
                }
            }
            info!("twitch chat event loop ended");
        });

        Ok(Self {
            client,
            rx: Mutex::new(rx),
            convert_task,
        })
    }

    /// Next inbound chat line, or None once the connection is gone.
    pub async fn next_chat_event(&self) -> Option<TwitchChatEvent> {
        self.rx.lock().await.recv().await
    }

    pub fn shutdown(&self) {
        self.client.shutdown();
        self.convert_task.abort();
    }
}

#[async_trait]
impl ChatSender for TwitchIrcPlatform {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error> {
        self.client.send_privmsg(channel, text);
        Ok(())
    }
}

#[async_trait]
impl ChatChannelControl for TwitchIrcPlatform {
    async fn join_channel(&self, channel: &str) -> Result<(), Error> {
        self.client.join_channel(channel);
        Ok(())
    }

    async fn leave_channel(&self, channel: &str) -> Result<(), Error> {
        self.client.part_channel(channel);
        Ok(())
    }
}

/// PRIVMSG to chat event. Lines without a channel or text are dropped; a
/// missing user-id tag is kept as None and surfaces only if a handler needs
/// the author's identity.
fn chat_event_from_line(line: &IrcLine) -> Option<TwitchChatEvent> {
    let channel = line.params.first()?.trim_start_matches('#').to_lowercase();
    let text = line.trailing.clone()?;
    let login = line.prefix_nick()?.to_lowercase();
    let display_name = line
        .tag_value("display-name")
        .filter(|d| !d.is_empty())
        .map(String::from)
        .unwrap_or_else(|| login.clone());
    let user_id = line
        .tag_value("user-id")
        .filter(|v| !v.is_empty())
        .map(String::from);
    let badges = line.tag_value("badges").unwrap_or("");
    let is_broadcaster = badges.split(',').any(|b| b.starts_with("broadcaster/"));
    let is_moderator = line.tag_value("mod") == Some("1");

    Some(TwitchChatEvent {
        channel,
        login,
        user_id,
        display_name,
        text,
        is_broadcaster,
        is_moderator,
    })
}
