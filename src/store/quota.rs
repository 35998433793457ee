use chrono::{ DateTime, TimeZone };
use log::warn;
use std::fmt::Display;

/// Calendar date of `instant` in its own time zone, as `YYYY-MM-DD`.
pub fn date_key<Tz>(instant: &DateTime<Tz>) -> String where Tz: TimeZone, Tz::Offset: Display {
    instant.format("%Y-%m-%d").to_string()
}

/// Storage key of the send counter for one day.
pub fn daily_key(storage_key: &str, day: &str) -> String {
    format!("{}_daily_{}", storage_key, day)
}

/// Sends used on `day_key`. A different day means a different counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaCounter {
    pub day_key: String,
    pub count: u32,
}

impl QuotaCounter {
    pub fn new(day_key: String, count: u32) -> Self {
        Self { day_key, count }
    }

    pub fn fresh(day_key: String) -> Self {
        Self::new(day_key, 0)
    }

    /// Parses a persisted counter. Anything unreadable counts as zero.
    pub fn parse(day_key: String, stored: Option<&str>) -> Self {
        let count = match stored {
            Some(raw) =>
                raw
                    .trim()
                    .parse::<u32>()
                    .unwrap_or_else(|e| {
                        warn!("Ignoring unreadable quota counter for {}: {} ({:?})", day_key, e, raw);
                        0
                    }),
            None => 0,
        };
        Self { day_key, count }
    }

    pub fn is_exhausted(&self, max: u32) -> bool {
        self.count >= max
    }
}
