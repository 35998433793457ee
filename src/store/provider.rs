use once_cell::sync::OnceCell;
use std::sync::Arc;

use super::ConversationStore;
use crate::error::StoreError;

/// Holds the one store a chat surface talks to.
///
/// Reaching for the store before one was provided is a programming error
/// and is reported as [`StoreError::UsedOutsideProvider`].
#[derive(Default)]
pub struct MessageProvider {
    store: OnceCell<Arc<ConversationStore>>,
}

impl MessageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already built store.
    pub fn with_store(store: Arc<ConversationStore>) -> Self {
        let provider = Self::new();
        let _ = provider.store.set(store);
        provider
    }

    pub fn provide(&self, store: Arc<ConversationStore>) -> Result<Arc<ConversationStore>, StoreError> {
        self.store.set(store.clone()).map_err(|_| StoreError::AlreadyProvided)?;
        Ok(store)
    }

    pub fn use_messages(&self) -> Result<Arc<ConversationStore>, StoreError> {
        self.store.get().cloned().ok_or(StoreError::UsedOutsideProvider)
    }

    pub fn is_provided(&self) -> bool {
        self.store.get().is_some()
    }
}
