pub mod limits;

use crate::cli::Args;
use crate::error::StoreError;
use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use limits::{ load_limits, MessageLimits, DEFAULT_FREE_TIER_LIMITS };

pub const DEFAULT_STORAGE_KEY: &str = "aiChatMessages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Premium,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

impl FromStr for Tier {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "premium" => Ok(Tier::Premium),
            _ => Err(StoreError::InvalidTier(s.to_string())),
        }
    }
}

/// Invoked synchronously when a free-tier send is denied.
pub type QuotaExceededCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct StoreConfig {
    pub storage_key: String,
    pub tier: Tier,
    /// Only consulted for the free tier.
    pub limits: MessageLimits,
    /// Hold a per-instance write gate across each read-modify-write.
    pub serialize_writes: bool,
    pub on_quota_exceeded: Option<QuotaExceededCallback>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            tier: Tier::Free,
            limits: DEFAULT_FREE_TIER_LIMITS,
            serialize_writes: false,
            on_quota_exceeded: None,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("storage_key", &self.storage_key)
            .field("tier", &self.tier)
            .field("limits", &self.limits)
            .field("serialize_writes", &self.serialize_writes)
            .field("on_quota_exceeded", &self.on_quota_exceeded.is_some())
            .finish()
    }
}

impl StoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_limits(mut self, limits: MessageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_serialized_writes(mut self, enabled: bool) -> Self {
        self.serialize_writes = enabled;
        self
    }

    pub fn on_quota_exceeded<F>(mut self, callback: F) -> Self where F: Fn() + Send + Sync + 'static {
        self.on_quota_exceeded = Some(Arc::new(callback));
        self
    }

    pub fn from_args(args: &Args) -> Result<Self, StoreError> {
        if args.storage_key.trim().is_empty() {
            return Err(StoreError::Config("storage key must not be empty".to_string()));
        }
        let tier: Tier = args.tier.parse()?;
        let limits = match &args.limits_path {
            Some(path) => load_limits(path)?,
            None =>
                MessageLimits {
                    max_daily_messages: args.max_daily_messages,
                    max_history_items: args.max_history_items,
                },
        };

        Ok(Self {
            storage_key: args.storage_key.clone(),
            tier,
            limits,
            serialize_writes: args.serialize_writes,
            on_quota_exceeded: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("FREE".parse::<Tier>().unwrap(), Tier::Free);
        assert_eq!(" Premium ".parse::<Tier>().unwrap(), Tier::Premium);
        assert!(matches!("gold".parse::<Tier>(), Err(StoreError::InvalidTier(t)) if t == "gold"));
    }

    #[test]
    fn defaults_match_free_tier_widget() {
        let config = StoreConfig::default();
        assert_eq!(config.storage_key, "aiChatMessages");
        assert_eq!(config.tier, Tier::Free);
        assert_eq!(config.limits.max_daily_messages, 5);
        assert_eq!(config.limits.max_history_items, 10);
        assert!(!config.serialize_writes);
        assert!(config.on_quota_exceeded.is_none());
    }
}
