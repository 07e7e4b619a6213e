use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rank of a registered account. `Admin` outranks `User` when two accounts
/// are combined during linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UserClass {
    User,
    Admin,
}

impl UserClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserClass::User => "user",
            UserClass::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => UserClass::Admin,
            _ => UserClass::User,
        }
    }
}

/// A registered account, potentially linked across both chat platforms.
///
/// A platform id column that has never been claimed holds a random uuid so the
/// uniqueness constraint still applies; real Twitch/Discord ids are numeric
/// and never parse as uuids, which is how `has_twitch_id`/`has_discord_id`
/// tell the two apart.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub twitch_user_id: String,
    pub discord_user_id: String,
    pub api_key: String,
    pub user_class: String,
    pub link_token: Option<String>,
    pub style: String,
    pub chips: i64,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_STYLE: &str = "Normal Style";

impl User {
    pub fn new_twitch(twitch_user_id: &str) -> Self {
        let mut u = Self::blank();
        u.twitch_user_id = twitch_user_id.to_string();
        u
    }

    pub fn new_discord(discord_user_id: &str) -> Self {
        let mut u = Self::blank();
        u.discord_user_id = discord_user_id.to_string();
        u
    }

    fn blank() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            twitch_user_id: Uuid::new_v4().to_string(),
            discord_user_id: Uuid::new_v4().to_string(),
            api_key: Uuid::new_v4().to_string(),
            user_class: UserClass::User.as_str().to_string(),
            link_token: None,
            style: DEFAULT_STYLE.to_string(),
            chips: 0,
            created_at: Utc::now(),
        }
    }

    pub fn class(&self) -> UserClass {
        UserClass::from_str(&self.user_class)
    }

    pub fn is_admin(&self) -> bool {
        self.class() == UserClass::Admin
    }

    pub fn has_twitch_id(&self) -> bool {
        Uuid::parse_str(&self.twitch_user_id).is_err()
    }

    pub fn has_discord_id(&self) -> bool {
        Uuid::parse_str(&self.discord_user_id).is_err()
    }

    pub fn is_linked(&self) -> bool {
        self.has_twitch_id() && self.has_discord_id()
    }

    /// Builds the combined row for an account merge. Pure; the caller is
    /// responsible for performing the delete+insert transactionally.
    ///
    /// Combine rule: higher user class wins, numeric counters are summed,
    /// style comes from the discord side, and the api key is regenerated so
    /// neither old key survives the merge.
    pub fn merged(twitch_user: &User, discord_user: &User) -> User {
        let class = twitch_user.class().max(discord_user.class());
        User {
            user_id: Uuid::new_v4(),
            twitch_user_id: twitch_user.twitch_user_id.clone(),
            discord_user_id: discord_user.discord_user_id.clone(),
            api_key: Uuid::new_v4().to_string(),
            user_class: class.as_str().to_string(),
            link_token: None,
            style: discord_user.style.clone(),
            chips: twitch_user.chips + discord_user.chips,
            created_at: twitch_user.created_at.min(discord_user.created_at),
        }
    }
}
