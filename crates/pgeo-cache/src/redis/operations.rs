//! Redis cache provider.
//!
//! Root folder entries are written without expiry; they only leave the
//! cache through invalidation.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::debug;

use pgeo_core::error::{AppError, ErrorKind};
use pgeo_core::result::AppResult;
use pgeo_core::traits::cache::CacheProvider;

use super::client::RedisClient;

/// Keys scanned per `SCAN` round trip.
const SCAN_BATCH: usize = 200;

/// Redis-backed cache provider.
#[derive(Debug, Clone)]
pub struct RedisCacheProvider {
    client: RedisClient,
}

impl RedisCacheProvider {
    /// Create a new Redis cache provider.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn session(&self, key: &str) -> (String, ConnectionManager) {
        (self.client.prefixed_key(key), self.client.conn_mut())
    }

    /// Every key matching `pattern`, walked with `SCAN` so a large
    /// keyspace never blocks the server.
    async fn scan(&self, conn: &mut ConnectionManager, pattern: &str) -> AppResult<Vec<String>> {
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(conn)
                .await
                .map_err(redis_error)?;
            keys.extend(batch);
            if next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }
}

fn redis_error(e: redis::RedisError) -> AppError {
    AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let (key, mut conn) = self.session(key);
        conn.get(&key).await.map_err(redis_error)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let (key, mut conn) = self.session(key);
        conn.set::<_, _, ()>(&key, value).await.map_err(redis_error)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let (key, mut conn) = self.session(key);
        conn.del::<_, ()>(&key).await.map_err(redis_error)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let (key, mut conn) = self.session(key);
        conn.exists(&key).await.map_err(redis_error)
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        let (pattern, mut conn) = self.session(pattern);
        let keys = self.scan(&mut conn, &pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        conn.del::<_, ()>(&keys).await.map_err(redis_error)?;
        debug!(pattern = %pattern, removed = keys.len(), "Deleted cached entries");
        Ok(keys.len() as u64)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        Ok(pong == "PONG")
    }

    async fn flush_all(&self) -> AppResult<()> {
        // Scoped to our prefix, never FLUSHDB.
        self.delete_pattern("*").await.map(|_| ())
    }
}
