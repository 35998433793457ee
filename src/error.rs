use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The message store was accessed before one was provided.
    #[error("use_messages must be called within a MessageProvider")]
    UsedOutsideProvider,
    #[error("a conversation store has already been provided")]
    AlreadyProvided,
    #[error("invalid tier: '{0}'")]
    InvalidTier(String),
    #[error("unsupported backend type: '{0}'")]
    InvalidBackend(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type StorageResult<T> = Result<T, StorageError>;
