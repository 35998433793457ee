use crate::error::StoreError;
use serde::{ Deserialize, Serialize };
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageLimits {
    pub max_daily_messages: u32,
    pub max_history_items: usize,
}

pub const DEFAULT_FREE_TIER_LIMITS: MessageLimits = MessageLimits {
    max_daily_messages: 5,
    max_history_items: 10,
};

impl Default for MessageLimits {
    fn default() -> Self {
        DEFAULT_FREE_TIER_LIMITS
    }
}

pub fn load_limits(path: &str) -> Result<MessageLimits, StoreError> {
    let file_content = fs
        ::read_to_string(path)
        .map_err(|e| StoreError::Config(format!("Failed to read limits file '{}': {}", path, e)))?;
    let limits: MessageLimits = serde_json
        ::from_str(&file_content)
        .map_err(|e| StoreError::Config(format!("Failed to parse limits file '{}': {}", path, e)))?;
    Ok(limits)
}
