use serde::{ Serialize, Deserialize };
use uuid::Uuid;

/// One question and its answer. Immutable once recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: String,
    pub question: String,
    pub answer: String,
    /// Creation instant in milliseconds since the epoch.
    pub timestamp: i64,
}

impl Exchange {
    pub fn new(question: &str, answer: &str, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp,
        }
    }
}
