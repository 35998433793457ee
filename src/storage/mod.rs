mod file;
mod memory;
mod redis;

use async_trait::async_trait;
use log::info;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ StorageResult, StoreError };

pub use self::file::FileBackend;
pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;

/// Asynchronous string key-value persistence the conversation store writes through.
///
/// A missing key is `Ok(None)`, never an error. `set` and `remove` report
/// failure through `Err`; callers decide whether that is fatal.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    async fn remove(&self, key: &str) -> StorageResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    File,
    Redis,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::File => write!(f, "file"),
            BackendKind::Redis => write!(f, "redis"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "file" => Ok(BackendKind::File),
            "redis" => Ok(BackendKind::Redis),
            _ => Err(StoreError::InvalidBackend(s.to_string())),
        }
    }
}

/// Builds a backend. `host` is a directory for `file` and a connection URL for `redis`.
pub fn create_backend(
    kind: BackendKind,
    host: &str,
    key_prefix: &str
) -> Result<Arc<dyn KeyValueBackend>, StoreError> {
    info!("Conversation data will be stored in: {} at {}", kind, host);
    match kind {
        BackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
        BackendKind::File => Ok(Arc::new(FileBackend::new(host))),
        BackendKind::Redis => {
            let backend = RedisBackend::new(host, key_prefix)?;
            Ok(Arc::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_known_names() {
        assert_eq!("Memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!("file".parse::<BackendKind>().unwrap(), BackendKind::File);
        assert_eq!("REDIS".parse::<BackendKind>().unwrap(), BackendKind::Redis);
        assert!(matches!("qdrant".parse::<BackendKind>(), Err(StoreError::InvalidBackend(_))));
    }

    #[test]
    fn redis_backend_rejects_malformed_url() {
        let result = create_backend(BackendKind::Redis, "not a url", "chat:");
        assert!(result.is_err());
    }
}
