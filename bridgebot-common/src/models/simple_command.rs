use serde::{Deserialize, Serialize};

/// A dynamically-added command with a fixed text reply.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SimpleCommand {
    pub name: String,
    pub reply: String,
}

impl SimpleCommand {
    pub fn new(name: &str, reply: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            reply: reply.to_string(),
        }
    }
}
