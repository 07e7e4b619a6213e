// src/repositories/postgres/simple_command.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use bridgebot_common::models::SimpleCommand;
use bridgebot_common::traits::repository_traits::SimpleCommandRepository;

use crate::Error;

#[derive(Clone)]
pub struct PostgresSimpleCommandRepository {
    pool: Pool<Postgres>,
}

impl PostgresSimpleCommandRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SimpleCommandRepository for PostgresSimpleCommandRepository {
    async fn create(&self, cmd: &SimpleCommand) -> Result<(), Error> {
        sqlx::query("INSERT INTO simple_commands (name, reply) VALUES ($1, $2)")
            .bind(&cmd.name)
            .bind(&cmd.reply)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<SimpleCommand>, Error> {
        let row = sqlx::query_as::<_, SimpleCommand>(
            "SELECT name, reply FROM simple_commands WHERE name = $1",
        )
        .bind(name.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, name: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM simple_commands WHERE name = $1")
            .bind(name.to_lowercase())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<SimpleCommand>, Error> {
        let rows = sqlx::query_as::<_, SimpleCommand>(
            "SELECT name, reply FROM simple_commands ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
