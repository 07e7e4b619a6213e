use crate::Error;

/// One inbound twitch chat line, with the IRC tag fields the handlers need.
#[derive(Debug, Clone)]
pub struct TwitchChatEvent {
    /// Channel name without the leading '#'.
    pub channel: String,
    /// Lowercased login of the sender.
    pub login: String,
    /// Numeric twitch user id from the `user-id` tag. Missing on malformed
    /// events; resolving such an event is an error for that dispatch only.
    pub user_id: Option<String>,
    pub display_name: String,
    pub text: String,
    pub is_broadcaster: bool,
    pub is_moderator: bool,
}

/// One inbound discord message or slash-command invocation.
#[derive(Debug, Clone)]
pub struct DiscordChatEvent {
    pub channel_id: String,
    pub author_id: String,
    /// Lowercased discord username.
    pub author_name: String,
    pub text: String,
}

/// Normalized envelope over which chat platform produced an event. Handlers
/// that need platform specifics match on the variant; everything else goes
/// through the accessors.
#[derive(Debug, Clone)]
pub enum ChatContext {
    Twitch(TwitchChatEvent),
    Discord(DiscordChatEvent),
}

impl ChatContext {
    pub fn platform_name(&self) -> &'static str {
        match self {
            ChatContext::Twitch(_) => "twitch",
            ChatContext::Discord(_) => "discord",
        }
    }

    pub fn other_platform_name(&self) -> &'static str {
        match self {
            ChatContext::Twitch(_) => "discord",
            ChatContext::Discord(_) => "twitch",
        }
    }

    pub fn channel(&self) -> &str {
        match self {
            ChatContext::Twitch(evt) => &evt.channel,
            ChatContext::Discord(evt) => &evt.channel_id,
        }
    }

    /// The platform-native account id of the author.
    pub fn author_platform_id(&self) -> Result<&str, Error> {
        match self {
            ChatContext::Twitch(evt) => evt
                .user_id
                .as_deref()
                .ok_or_else(|| Error::Platform("twitch event missing user-id tag".into())),
            ChatContext::Discord(evt) => Ok(&evt.author_id),
        }
    }

    /// Lowercased username, as used for link-token lookups.
    pub fn author_login(&self) -> String {
        match self {
            ChatContext::Twitch(evt) => evt.login.to_lowercase(),
            ChatContext::Discord(evt) => evt.author_name.to_lowercase(),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ChatContext::Twitch(evt) => &evt.display_name,
            ChatContext::Discord(evt) => &evt.author_name,
        }
    }

    /// How to address the author in a reply.
    pub fn mention(&self) -> String {
        match self {
            ChatContext::Twitch(evt) => evt.display_name.clone(),
            ChatContext::Discord(evt) => format!("<@{}>", evt.author_id),
        }
    }

    /// Broadcaster or moderator on the originating twitch channel. Always
    /// false on discord; channel-operator commands are twitch-only.
    pub fn is_channel_operator(&self) -> bool {
        match self {
            ChatContext::Twitch(evt) => evt.is_broadcaster || evt.is_moderator,
            ChatContext::Discord(_) => false,
        }
    }
}
