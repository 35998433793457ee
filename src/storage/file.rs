use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

use super::KeyValueBackend;
use crate::error::{ StorageError, StorageResult };

/// Stores each key as a file inside `base_path`.
///
/// File names are the percent-encoded key with dots escaped too, so any
/// string is a valid key and no key maps onto `.`, `..` or a hidden file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    base_path: PathBuf,
}

impl FileBackend {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, key: &str) -> StorageResult<PathBuf> {
        Ok(self.base_path.join(file_name(key)?))
    }

    /// A write-once sibling for `key`. `%t` is never produced by the key encoding.
    fn temp_path(&self, key: &str) -> StorageResult<PathBuf> {
        let name = format!("{}%tmp-{}", file_name(key)?, Uuid::new_v4().simple());
        Ok(self.base_path.join(name))
    }

    async fn ensure_base_dir(&self) -> StorageResult<()> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).await?;
        }
        Ok(())
    }
}

fn file_name(key: &str) -> StorageResult<String> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(urlencoding::encode(key).replace('.', "%2E"))
}

#[async_trait]
impl KeyValueBackend for FileBackend {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.full_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.full_path(key)?;
        let tmp = self.temp_path(key)?;
        self.ensure_base_dir().await?;

        // Readers never see a torn value.
        fs::write(&tmp, value).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::Io(e));
        }
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.full_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
