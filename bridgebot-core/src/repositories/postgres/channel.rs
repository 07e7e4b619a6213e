// src/repositories/postgres/channel.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use bridgebot_common::models::TwitchChannelSettings;
use bridgebot_common::traits::repository_traits::ChannelSettingsRepository;

use crate::Error;

#[derive(Clone)]
pub struct PostgresChannelSettingsRepository {
    pool: Pool<Postgres>,
}

impl PostgresChannelSettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_settings(r: &sqlx::postgres::PgRow) -> Result<TwitchChannelSettings, Error> {
        let raw: String = r.try_get("disabled_commands")?;
        Ok(TwitchChannelSettings {
            channel: r.try_get("channel")?,
            disabled_commands: TwitchChannelSettings::parse_disabled_commands(&raw),
            min_action_seconds: r.try_get("min_action_seconds")?,
            oauth_state: r.try_get("oauth_state")?,
            access_token: r.try_get("access_token")?,
            refresh_token: r.try_get("refresh_token")?,
        })
    }
}

#[async_trait]
impl ChannelSettingsRepository for PostgresChannelSettingsRepository {
    async fn create(&self, settings: &TwitchChannelSettings) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO twitch_channels (
                channel, disabled_commands, min_action_seconds,
                oauth_state, access_token, refresh_token
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&settings.channel)
        .bind(settings.disabled_commands_column())
        .bind(settings.min_action_seconds)
        .bind(&settings.oauth_state)
        .bind(&settings.access_token)
        .bind(&settings.refresh_token)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, channel: &str) -> Result<Option<TwitchChannelSettings>, Error> {
        let row = sqlx::query(
            r#"
            SELECT channel, disabled_commands, min_action_seconds,
                   oauth_state, access_token, refresh_token
            FROM twitch_channels
            WHERE channel = $1
            "#,
        )
        .bind(channel.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| Self::row_to_settings(&r)).transpose()
    }

    async fn update(&self, settings: &TwitchChannelSettings) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE twitch_channels
            SET disabled_commands = $1,
                min_action_seconds = $2,
                oauth_state = $3,
                access_token = $4,
                refresh_token = $5
            WHERE channel = $6
            "#,
        )
        .bind(settings.disabled_commands_column())
        .bind(settings.min_action_seconds)
        .bind(&settings.oauth_state)
        .bind(&settings.access_token)
        .bind(&settings.refresh_token)
        .bind(&settings.channel)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, channel: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM twitch_channels WHERE channel = $1")
            .bind(channel.to_lowercase())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TwitchChannelSettings>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT channel, disabled_commands, min_action_seconds,
                   oauth_state, access_token, refresh_token
            FROM twitch_channels
            ORDER BY channel ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_settings).collect()
    }

    async fn get_by_oauth_state(
        &self,
        state: &str,
    ) -> Result<Option<TwitchChannelSettings>, Error> {
        let row = sqlx::query(
            r#"
            SELECT channel, disabled_commands, min_action_seconds,
                   oauth_state, access_token, refresh_token
            FROM twitch_channels
            WHERE oauth_state = $1
            "#,
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| Self::row_to_settings(&r)).transpose()
    }
}
