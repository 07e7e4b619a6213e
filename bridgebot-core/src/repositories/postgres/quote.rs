// src/repositories/postgres/quote.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use bridgebot_common::models::Quote;
use bridgebot_common::traits::repository_traits::QuoteRepository;

use crate::Error;

#[derive(Clone)]
pub struct PostgresQuoteRepository {
    pool: Pool<Postgres>,
}

impl PostgresQuoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuoteRepository for PostgresQuoteRepository {
    async fn create(&self, quote: &Quote) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO quotes (quote_id, quote, "user", date)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(quote.quote_id)
        .bind(&quote.quote)
        .bind(&quote.user)
        .bind(&quote.date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, quote_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM quotes WHERE quote_id = $1")
            .bind(quote_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_random(&self, filter: Option<&str>) -> Result<Option<Quote>, Error> {
        let row = match filter {
            Some(f) => {
                let pattern = format!("%{}%", f);
                sqlx::query(
                    r#"
                    SELECT quote_id, quote, "user", date
                    FROM quotes
                    WHERE quote ILIKE $1 OR "user" ILIKE $1
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
                    SELECT quote_id, quote, "user", date
                    FROM quotes
                    ORDER BY random()
                    LIMIT 1
                    "#,
                )
                .fetch_optional(&self.pool)
                .await?
            }
        };

        if let Some(r) = row {
            Ok(Some(Quote {
                quote_id: r.try_get("quote_id")?,
                quote: r.try_get("quote")?,
                user: r.try_get("user")?,
                date: r.try_get("date")?,
            }))
        } else {
            Ok(None)
        }
    }
}
