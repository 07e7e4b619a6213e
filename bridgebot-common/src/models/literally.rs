use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved "you literally can not die to X" clip, retrievable at random by
/// what killed the streamer.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Literally {
    pub literally_id: Uuid,
    /// What the death was blamed on. Matched case-insensitively.
    pub what: String,
    /// Clip url.
    pub clip: String,
}

impl Literally {
    pub fn new(what: &str, clip: &str) -> Self {
        Self {
            literally_id: Uuid::new_v4(),
            what: what.to_string(),
            clip: clip.to_string(),
        }
    }
}
