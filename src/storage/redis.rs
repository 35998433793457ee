use async_trait::async_trait;
use log::debug;
use redis::{ AsyncCommands, Client };

use super::KeyValueBackend;
use crate::error::StorageResult;

pub struct RedisBackend {
    client: Client,
    key_prefix: String,
}

impl RedisBackend {
    pub fn new(url: &str, key_prefix: &str) -> StorageResult<Self> {
        Ok(Self {
            client: Client::open(url)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.prefixed(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut conn = self.get_connection().await?;
        let full_key = self.prefixed(key);
        conn.set::<_, _, ()>(&full_key, value).await?;
        debug!("SET {} ({} bytes)", full_key, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let mut conn = self.get_connection().await?;
        let _: i64 = conn.del(self.prefixed(key)).await?;
        Ok(())
    }
}
