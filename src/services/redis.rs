//! Redis backend for the key-value store

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::{
    error::{AppError, AppResult},
    services::store::{KeyValueStore, StoreOp},
};

#[derive(Clone)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// Create a new Redis store and check the server answers
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Store(format!("Failed to create Redis client: {}", e)))?;

        let store = Self { client };
        store.ping().await?;
        Ok(store)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Store(format!("Failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Store(format!("Redis connection test failed: {}", e)))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get(key)
            .await
            .map_err(|e| AppError::Store(format!("Failed to read {} from Redis: {}", key, e)))
    }

    async fn members(&self, key: &str) -> AppResult<Vec<String>> {
        let mut conn = self.connection().await?;
        conn.smembers(key)
            .await
            .map_err(|e| AppError::Store(format!("Failed to read set {} from Redis: {}", key, e)))
    }

    async fn list(&self, key: &str) -> AppResult<Vec<String>> {
        let mut conn = self.connection().await?;
        conn.lrange(key, 0, -1)
            .await
            .map_err(|e| AppError::Store(format!("Failed to read list {} from Redis: {}", key, e)))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut conn = self.connection().await?;
        let mut iter = conn
            .scan_match::<_, String>(format!("{}*", prefix))
            .await
            .map_err(|e| AppError::Store(format!("Failed to scan {}* in Redis: {}", prefix, e)))?;

        let mut keys = Vec::new();
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<u64>> {
        let mut conn = self.connection().await?;
        let ttl: i64 = conn
            .ttl(key)
            .await
            .map_err(|e| AppError::Store(format!("Failed to read TTL of {} from Redis: {}", key, e)))?;
        // -2: missing, -1: no expiry
        Ok(u64::try_from(ttl).ok())
    }

    async fn apply(&self, ops: Vec<StoreOp>) -> AppResult<()> {
        let mut pipe = redis::pipe();
        pipe.atomic();

        for op in &ops {
            match op {
                StoreOp::Set { key, value } => {
                    pipe.set(key, value).ignore();
                }
                StoreOp::SetEx {
                    key,
                    value,
                    ttl_seconds,
                } => {
                    pipe.set_ex(key, value, *ttl_seconds).ignore();
                }
                StoreOp::Delete { key } => {
                    pipe.del(key).ignore();
                }
                StoreOp::SetAdd { key, member } => {
                    pipe.sadd(key, member).ignore();
                }
                StoreOp::SetRemove { key, member } => {
                    pipe.srem(key, member).ignore();
                }
                StoreOp::ListPush { key, value } => {
                    pipe.rpush(key, value).ignore();
                }
                StoreOp::Expire { key, ttl_seconds } => {
                    let seconds = i64::try_from(*ttl_seconds).unwrap_or(i64::MAX);
                    pipe.expire(key, seconds).ignore();
                }
            }
        }

        let mut conn = self.connection().await?;
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::Store(format!("Failed to apply Redis transaction: {}", e)))?;

        tracing::debug!(ops = ops.len(), "Applied store transaction");
        Ok(())
    }
}
