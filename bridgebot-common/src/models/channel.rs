use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-channel settings for an allowed twitch channel.
///
/// `disabled_commands` is stored as a comma-joined varchar; names are kept
/// lowercased so disable/enable checks never depend on how the user typed the
/// command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitchChannelSettings {
    pub channel: String,
    pub disabled_commands: HashSet<String>,
    pub min_action_seconds: i32,
    pub oauth_state: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TwitchChannelSettings {
    pub fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_lowercase(),
            disabled_commands: HashSet::new(),
            min_action_seconds: 0,
            oauth_state: None,
            access_token: None,
            refresh_token: None,
        }
    }

    pub fn is_disabled_command(&self, cmd: &str) -> bool {
        self.disabled_commands.contains(&cmd.to_lowercase())
    }

    pub fn can_act(&self, last_action: DateTime<Utc>) -> bool {
        (Utc::now() - last_action).num_seconds() > self.min_action_seconds as i64
    }

    pub fn disabled_commands_column(&self) -> String {
        let mut names: Vec<&str> = self.disabled_commands.iter().map(String::as_str).collect();
        names.sort_unstable();
        names.join(",")
    }

    pub fn parse_disabled_commands(raw: &str) -> HashSet<String> {
        raw.split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect()
    }
}
