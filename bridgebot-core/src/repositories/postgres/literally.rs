// src/repositories/postgres/literally.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use bridgebot_common::models::Literally;
use bridgebot_common::traits::repository_traits::LiterallyRepository;

use crate::Error;

#[derive(Clone)]
pub struct PostgresLiterallyRepository {
    pool: Pool<Postgres>,
}

impl PostgresLiterallyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LiterallyRepository for PostgresLiterallyRepository {
    async fn create(&self, literally: &Literally) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO literally_clips (literally_id, what, clip)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(literally.literally_id)
        .bind(&literally.what)
        .bind(&literally.clip)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_random(&self, filter: Option<&str>) -> Result<Option<Literally>, Error> {
        let row = match filter {
            Some(f) => {
                let pattern = format!("%{}%", f);
                sqlx::query(
                    r#"
                    SELECT literally_id, what, clip
                    FROM literally_clips
                    WHERE what ILIKE $1
                    ORDER BY random()
                    LIMIT 1
                    "#,
                )
                .bind(pattern)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT literally_id, what, clip
                    FROM literally_clips
                    ORDER BY random()
                    LIMIT 1
                    "#,
                )
                .fetch_optional(&self.pool)
                .await?
            }
        };

        if let Some(r) = row {
            Ok(Some(Literally {
                literally_id: r.try_get("literally_id")?,
                what: r.try_get("what")?,
                clip: r.try_get("clip")?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn is_duplicate(&self, what: &str, clip: &str) -> Result<bool, Error> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS present
            FROM literally_clips
            WHERE what ILIKE $1 AND clip = $2
            LIMIT 1
            "#,
        )
        .bind(what)
        .bind(clip)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}
