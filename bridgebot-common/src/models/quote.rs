use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A memorable chat line someone said, retrievable at random.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Quote {
    pub quote_id: Uuid,
    pub quote: String,
    pub user: String,
    pub date: Option<String>,
}

impl Quote {
    pub fn new(quote: &str, user: &str, date: Option<&str>) -> Self {
        Self {
            quote_id: Uuid::new_v4(),
            quote: quote.to_string(),
            user: user.to_string(),
            date: date.map(String::from),
        }
    }

    pub fn display(&self) -> String {
        let mut out = format!("{} - {}", self.quote, self.user);
        if let Some(d) = &self.date {
            out.push(' ');
            out.push_str(d);
        }
        out
    }
}
