// src/repositories/postgres/announce_channel.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use bridgebot_common::models::{AnnounceChannel, AnnounceType};
use bridgebot_common::traits::repository_traits::AnnounceChannelRepository;

use crate::Error;

#[derive(Clone)]
pub struct PostgresAnnounceChannelRepository {
    pool: Pool<Postgres>,
}

impl PostgresAnnounceChannelRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_channel(r: &sqlx::postgres::PgRow) -> Result<AnnounceChannel, Error> {
        let raw: String = r.try_get("announce_types")?;
        Ok(AnnounceChannel {
            channel: r.try_get("channel")?,
            announce_types: AnnounceChannel::parse_types(&raw),
        })
    }
}

#[async_trait]
impl AnnounceChannelRepository for PostgresAnnounceChannelRepository {
    async fn upsert(&self, channel: &AnnounceChannel) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO announce_channels (channel, announce_types)
            VALUES ($1, $2)
            ON CONFLICT (channel) DO UPDATE SET announce_types = EXCLUDED.announce_types
            "#,
        )
        .bind(&channel.channel)
        .bind(channel.types_column())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, channel: &str) -> Result<Option<AnnounceChannel>, Error> {
        let row = sqlx::query(
            "SELECT channel, announce_types FROM announce_channels WHERE channel = $1",
        )
        .bind(channel.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| Self::row_to_channel(&r)).transpose()
    }

    async fn delete(&self, channel: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM announce_channels WHERE channel = $1")
            .bind(channel.to_lowercase())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_by_type(&self, kind: AnnounceType) -> Result<Vec<AnnounceChannel>, Error> {
        // the type sets are tiny; filter in memory rather than pattern-match
        // against the comma-joined column
        let rows = sqlx::query("SELECT channel, announce_types FROM announce_channels")
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::new();
        for r in &rows {
            let chan = Self::row_to_channel(r)?;
            if chan.announce_types.contains(&kind) {
                out.push(chan);
            }
        }
        Ok(out)
    }
}
