use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One turn in a conversation. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub content: String,
    pub is_bot: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub content: String,
    #[serde(default)]
    pub is_bot: bool,
}

impl Message {
    pub fn speaker(&self) -> &'static str {
        if self.is_bot { "Bot" } else { "User" }
    }
}

impl NewMessage {
    pub fn new_user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_bot: false,
        }
    }

    pub fn new_bot(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_bot: true,
        }
    }
}
