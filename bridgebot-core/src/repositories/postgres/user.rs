// src/repositories/postgres/user.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use bridgebot_common::models::User;
use bridgebot_common::traits::repository_traits::UserRepository;

use crate::Error;

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: Pool<Postgres>,
}

impl PostgresUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_user(r: &sqlx::postgres::PgRow) -> Result<User, Error> {
        Ok(User {
            user_id: r.try_get("user_id")?,
            twitch_user_id: r.try_get("twitch_user_id")?,
            discord_user_id: r.try_get("discord_user_id")?,
            api_key: r.try_get("api_key")?,
            user_class: r.try_get("user_class")?,
            link_token: r.try_get("link_token")?,
            style: r.try_get("style")?,
            chips: r.try_get("chips")?,
            created_at: r.try_get("created_at")?,
        })
    }

    async fn get_by_column(&self, column: &str, value: &str) -> Result<Option<User>, Error> {
        // column names are fixed by the callers below, never user input
        let sql = format!(
            r#"
            SELECT user_id, twitch_user_id, discord_user_id, api_key,
                   user_class, link_token, style, chips, created_at
            FROM users
            WHERE {column} = $1
            "#
        );
        let row = sqlx::query(&sql).bind(value).fetch_optional(&self.pool).await?;
        row.map(|r| Self::row_to_user(&r)).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id, twitch_user_id, discord_user_id, api_key,
                user_class, link_token, style, chips, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.twitch_user_id)
        .bind(&user.discord_user_id)
        .bind(&user.api_key)
        .bind(&user.user_class)
        .bind(&user.link_token)
        .bind(&user.style)
        .bind(user.chips)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<User>, Error> {
        let row = sqlx::query(
            r#"
            SELECT user_id, twitch_user_id, discord_user_id, api_key,
                   user_class, link_token, style, chips, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    async fn update(&self, user: &User) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET twitch_user_id = $1,
                discord_user_id = $2,
                api_key = $3,
                user_class = $4,
                link_token = $5,
                style = $6,
                chips = $7
            WHERE user_id = $8
            "#,
        )
        .bind(&user.twitch_user_id)
        .bind(&user.discord_user_id)
        .bind(&user.api_key)
        .bind(&user.user_class)
        .bind(&user.link_token)
        .bind(&user.style)
        .bind(user.chips)
        .bind(user.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_twitch_id(&self, twitch_user_id: &str) -> Result<Option<User>, Error> {
        self.get_by_column("twitch_user_id", twitch_user_id).await
    }

    async fn get_by_discord_id(&self, discord_user_id: &str) -> Result<Option<User>, Error> {
        self.get_by_column("discord_user_id", discord_user_id).await
    }

    async fn get_by_link_token(&self, link_token: &str) -> Result<Option<User>, Error> {
        self.get_by_column("link_token", link_token).await
    }

    async fn combine(
        &self,
        twitch_user: &User,
        discord_user: &User,
        combined: &User,
    ) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM users WHERE user_id = $1 OR user_id = $2")
            .bind(twitch_user.user_id)
            .bind(discord_user.user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id, twitch_user_id, discord_user_id, api_key,
                user_class, link_token, style, chips, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(combined.user_id)
        .bind(&combined.twitch_user_id)
        .bind(&combined.discord_user_id)
        .bind(&combined.api_key)
        .bind(&combined.user_class)
        .bind(&combined.link_token)
        .bind(&combined.style)
        .bind(combined.chips)
        .bind(combined.created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }
}
