//! Two-step cross-platform account linking.
//!
//! `start_link` stores a single-use token on the caller's row keyed by the
//! counterpart username; `confirm_link` on the other platform looks the token
//! up and merges both rows in one transaction.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use bridgebot_common::models::User;
use bridgebot_common::traits::repository_traits::UserRepository;

use crate::services::context::ChatContext;
use crate::Error;

pub struct LinkService {
    users: Arc<dyn UserRepository>,
}

impl LinkService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Generates a fresh link token for `caller`, replacing any previous one
    /// (only the latest token is valid). Returns the random part the caller
    /// must relay to their other account.
    pub async fn start_link(&self, caller: &User, other_username: &str) -> Result<String, Error> {
        let token = Uuid::new_v4().to_string();
        let mut updated = caller.clone();
        updated.link_token = Some(format!("{} {}", other_username.to_lowercase(), token));
        self.users.update(&updated).await?;
        Ok(token)
    }

    /// Confirms a pending link. `ctx` is the confirming side; the pending row
    /// must have been started from the other platform with the caller's
    /// username. Returns the merged user, or None when no pending link
    /// matches (wrong username, wrong token, or wrong direction -- the caller
    /// is never told which).
    pub async fn confirm_link(
        &self,
        ctx: &ChatContext,
        caller: &User,
        token: &str,
    ) -> Result<Option<User>, Error> {
        let key = format!("{} {}", ctx.author_login(), token);
        let counterpart = match self.users.get_by_link_token(&key).await? {
            Some(u) => u,
            None => return Ok(None),
        };

        // The token holder must live on the other platform and must not have
        // linked in the meantime.
        let (twitch_user, discord_user) = match ctx {
            ChatContext::Twitch(_) => {
                if !counterpart.has_discord_id() || counterpart.has_twitch_id() {
                    return Ok(None);
                }
                (caller, &counterpart)
            }
            ChatContext::Discord(_) => {
                if !counterpart.has_twitch_id() || counterpart.has_discord_id() {
                    return Ok(None);
                }
                (&counterpart, caller)
            }
        };

        let combined = User::merged(twitch_user, discord_user);
        self.users
            .combine(twitch_user, discord_user, &combined)
            .await?;
        info!(
            twitch_id = %combined.twitch_user_id,
            discord_id = %combined.discord_user_id,
            "linked accounts into {}",
            combined.user_id
        );
        Ok(Some(combined))
    }
}
