use serde::{ Serialize, Deserialize };
use uuid::Uuid;

use super::exchange::Exchange;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Bot,
}

/// A single line in the chat transcript as the surface shows it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatBubble {
    pub id: String,
    pub kind: MessageKind,
    pub text: String,
    pub timestamp: i64,
    #[serde(default)]
    pub copied: bool,
}

impl ChatBubble {
    pub fn user(text: &str, timestamp: i64) -> Self {
        Self::new(MessageKind::User, text, timestamp)
    }

    pub fn bot(text: &str, timestamp: i64) -> Self {
        Self::new(MessageKind::Bot, text, timestamp)
    }

    fn new(kind: MessageKind, text: &str, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            kind,
            text: text.to_string(),
            timestamp,
            copied: false,
        }
    }
}

impl Exchange {
    /// Splits a stored exchange into its user and bot lines.
    pub fn to_bubbles(&self) -> [ChatBubble; 2] {
        [
            ChatBubble {
                id: format!("{}-q", self.id),
                kind: MessageKind::User,
                text: self.question.clone(),
                timestamp: self.timestamp,
                copied: false,
            },
            ChatBubble {
                id: format!("{}-a", self.id),
                kind: MessageKind::Bot,
                text: self.answer.clone(),
                timestamp: self.timestamp,
                copied: false,
            },
        ]
    }
}
