use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// What a destination or watched channel is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnounceType {
    /// Discord channel receiving every stream announcement.
    Live,
    /// Discord channel receiving only speedrun-tagged announcements.
    SpeedrunLive,
    /// Twitch channel id watched for going live regardless of game.
    Stream,
}

impl AnnounceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnounceType::Live => "live",
            AnnounceType::SpeedrunLive => "speedrunlive",
            AnnounceType::Stream => "stream",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "live" => Some(AnnounceType::Live),
            "speedrunlive" => Some(AnnounceType::SpeedrunLive),
            "stream" => Some(AnnounceType::Stream),
            _ => None,
        }
    }
}

/// A channel with one or more announcement roles. For discord destinations
/// `channel` is the discord channel id; for watched twitch channels it is the
/// twitch user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnounceChannel {
    pub channel: String,
    pub announce_types: HashSet<AnnounceType>,
}

impl AnnounceChannel {
    pub fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_lowercase(),
            announce_types: HashSet::new(),
        }
    }

    pub fn types_column(&self) -> String {
        let mut names: Vec<&str> = self.announce_types.iter().map(|t| t.as_str()).collect();
        names.sort_unstable();
        names.join(",")
    }

    pub fn parse_types(raw: &str) -> HashSet<AnnounceType> {
        raw.split(',').filter_map(AnnounceType::parse).collect()
    }
}
