//! Conversation history and daily send quota over a pluggable key-value backend.
//!
//! Persistence is best effort: the in-memory state is updated first and the
//! backend write follows. A failed write is logged and reported as `false`
//! but the in-memory change stands. Nothing here makes the read-modify-write
//! of the stored list atomic; two overlapping `add_message` calls may lose
//! one update in the backend (last writer wins) unless `serialize_writes`
//! is enabled, which funnels mutations through a per-store async gate.

pub mod provider;
pub mod quota;

use chrono::Local;
use log::{ debug, error, info, warn };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };

use crate::clock::{ Clock, SystemClock };
use crate::config::{ StoreConfig, Tier };
use crate::models::Exchange;
use crate::storage::KeyValueBackend;

use self::quota::{ date_key, daily_key, QuotaCounter };

pub use self::provider::MessageProvider;

struct ConversationState {
    messages: Vec<Exchange>,
    quota: QuotaCounter,
}

pub struct ConversationStore {
    config: StoreConfig,
    backend: Arc<dyn KeyValueBackend>,
    clock: Arc<dyn Clock>,
    state: Mutex<ConversationState>,
    write_gate: tokio::sync::Mutex<()>,
}

impl ConversationStore {
    /// Creates an empty store. Call [`initialize`](Self::initialize) to load persisted data.
    pub fn new(config: StoreConfig, backend: Arc<dyn KeyValueBackend>) -> Self {
        Self::with_clock(config, backend, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: StoreConfig,
        backend: Arc<dyn KeyValueBackend>,
        clock: Arc<dyn Clock>
    ) -> Self {
        let today = date_key(&clock.now().with_timezone(&Local));
        Self {
            config,
            backend,
            clock,
            state: Mutex::new(ConversationState {
                messages: Vec::new(),
                quota: QuotaCounter::fresh(today),
            }),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Creates and initializes a store in one step.
    pub async fn open(config: StoreConfig, backend: Arc<dyn KeyValueBackend>) -> Self {
        let store = Self::new(config, backend);
        store.initialize().await;
        store
    }

    pub async fn open_with_clock(
        config: StoreConfig,
        backend: Arc<dyn KeyValueBackend>,
        clock: Arc<dyn Clock>
    ) -> Self {
        let store = Self::with_clock(config, backend, clock);
        store.initialize().await;
        store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn tier(&self) -> Tier {
        self.config.tier
    }

    pub fn storage_key(&self) -> &str {
        &self.config.storage_key
    }

    /// Loads the persisted exchanges and today's quota counter.
    ///
    /// Missing or unreadable data never fails: the store starts empty and
    /// the counter at zero.
    pub async fn initialize(&self) {
        let messages = self.load_messages().await;
        let today = self.today_key();
        let quota = self.load_quota(&today).await;

        info!(
            "Loaded {} exchanges from '{}', {} sends used on {}",
            messages.len(),
            self.config.storage_key,
            quota.count,
            today
        );

        let mut state = self.lock_state();
        state.messages = messages;
        state.quota = quota;
    }

    /// Records a question and its answer and writes the whole history back.
    ///
    /// Returns `false` if the write failed. The exchange is kept in memory either way.
    pub async fn add_message(&self, question: &str, answer: &str) -> bool {
        let _gate = self.acquire_gate().await;
        let exchange = Exchange::new(question, answer, self.clock.now().timestamp_millis());
        let serialized = {
            let mut state = self.lock_state();
            state.messages.push(exchange);
            serde_json::to_string(&state.messages)
        };

        let json = match serialized {
            Ok(json) => json,
            Err(e) => {
                error!("Error serializing messages: {}", e);
                return false;
            }
        };

        match self.backend.set(&self.config.storage_key, &json).await {
            Ok(()) => true,
            Err(e) => {
                error!("Error adding message: {}", e);
                false
            }
        }
    }

    /// Forgets every exchange. The in-memory list is emptied even if the
    /// backend removal fails; the return value reports whether it succeeded.
    pub async fn clear_messages(&self) -> bool {
        let _gate = self.acquire_gate().await;
        let removed = self.backend.remove(&self.config.storage_key).await;
        self.lock_state().messages.clear();

        match removed {
            Ok(()) => true,
            Err(e) => {
                error!("Error clearing messages: {}", e);
                false
            }
        }
    }

    /// Checks the daily allowance and, if a send is allowed, consumes one slot.
    ///
    /// Premium stores always allow and never touch the counter. A free store
    /// that has used its allowance calls `on_quota_exceeded` and refuses
    /// without changing the counter. The slot is consumed before the send
    /// happens, so a send that later fails still counts.
    pub async fn can_send_message(&self) -> bool {
        if self.config.tier == Tier::Premium {
            return true;
        }

        let _gate = self.acquire_gate().await;
        let today = self.today_key();
        self.roll_over(&today).await;

        let max = self.config.limits.max_daily_messages;
        let next = {
            let mut state = self.lock_state();
            if state.quota.is_exhausted(max) {
                None
            } else {
                state.quota.count += 1;
                Some(state.quota.count)
            }
        };

        let Some(count) = next else {
            debug!("Daily limit of {} messages reached for {}", max, today);
            if let Some(callback) = &self.config.on_quota_exceeded {
                callback();
            }
            return false;
        };

        let key = daily_key(&self.config.storage_key, &today);
        match self.backend.set(&key, &count.to_string()).await {
            Ok(()) => true,
            Err(e) => {
                error!("Error checking message limit: {}", e);
                false
            }
        }
    }

    /// The exchanges to show. Premium sees everything in insertion order;
    /// free sees the newest `max_history_items`, newest first.
    pub fn get_display_messages(&self) -> Vec<Exchange> {
        let state = self.lock_state();
        if self.config.tier == Tier::Premium {
            return state.messages.clone();
        }

        let mut indexed: Vec<(usize, &Exchange)> = state.messages.iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| b.timestamp.cmp(&a.timestamp).then(ib.cmp(ia)));
        indexed
            .into_iter()
            .take(self.config.limits.max_history_items)
            .map(|(_, exchange)| exchange.clone())
            .collect()
    }

    /// Every stored exchange in insertion order, regardless of tier.
    pub fn messages(&self) -> Vec<Exchange> {
        self.lock_state().messages.clone()
    }

    /// Sends counted against the day the counter was last loaded for.
    pub fn quota_used(&self) -> u32 {
        self.lock_state().quota.count
    }

    /// Sends left today, or `None` when the tier is unlimited.
    pub fn remaining_quota(&self) -> Option<u32> {
        if self.config.tier == Tier::Premium {
            return None;
        }
        let state = self.lock_state();
        let used = if state.quota.day_key == self.today_key() { state.quota.count } else { 0 };
        Some(self.config.limits.max_daily_messages.saturating_sub(used))
    }

    fn today_key(&self) -> String {
        date_key(&self.clock.now().with_timezone(&Local))
    }

    fn lock_state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn acquire_gate(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        if self.config.serialize_writes { Some(self.write_gate.lock().await) } else { None }
    }

    async fn roll_over(&self, today: &str) {
        let stale = self.lock_state().quota.day_key != today;
        if !stale {
            return;
        }
        info!("New day {}, starting a fresh message counter", today);
        let quota = self.load_quota(today).await;
        let mut state = self.lock_state();
        if state.quota.day_key != today {
            state.quota = quota;
        }
    }

    async fn load_messages(&self) -> Vec<Exchange> {
        let stored = match self.backend.get(&self.config.storage_key).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Error loading messages: {}", e);
                return Vec::new();
            }
        };
        let Some(json) = stored else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Exchange>>(&json) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Discarding unreadable history under '{}': {}", self.config.storage_key, e);
                Vec::new()
            }
        }
    }

    async fn load_quota(&self, day: &str) -> QuotaCounter {
        let key = daily_key(&self.config.storage_key, day);
        match self.backend.get(&key).await {
            Ok(stored) => QuotaCounter::parse(day.to_string(), stored.as_deref()),
            Err(e) => {
                warn!("Error loading daily message count: {}", e);
                QuotaCounter::fresh(day.to_string())
            }
        }
    }
}
