#![allow(dead_code)]

use ai_chat_store::clock::ManualClock;
use ai_chat_store::error::{ StorageError, StorageResult };
use ai_chat_store::storage::{ KeyValueBackend, MemoryBackend };
use async_trait::async_trait;
use chrono::{ TimeZone, Utc };
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;

/// Memory backend whose operations can be switched to fail.
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    pub fail_remove: AtomicBool,
}

impl FlakyBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_writes(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
        self.fail_remove.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueBackend for FlakyBackend {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("get {} refused", key)));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("set {} refused", key)));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("remove {} refused", key)));
        }
        self.inner.remove(key).await
    }
}

/// Midday so that a local-time day key is stable for any UTC offset within +-11h.
pub fn noon_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()))
}
