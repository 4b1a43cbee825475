//! Redis integration service implementation
//!
//! JSON key/value helpers with TTL and the connection health check. Every key is namespaced with the configured prefix.

use redis::{AsyncCommands, Client, RedisResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::settings::RedisConfig;
use crate::utils::errors::Result;

/// Redis service for caching and conversation storage
#[derive(Clone, Debug)]
pub struct RedisService {
    client: Client,
    config: RedisConfig,
}

impl RedisService {
    /// Create a new RedisService instance; no connection is opened yet
    pub fn new(config: RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        Ok(Self { client, config })
    }

    async fn get_connection(&self) -> Result<redis::aio::Connection> {
        Ok(self.client.get_async_connection().await?)
    }

    /// Key with the configured prefix applied
    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }

    /// Set a JSON value with TTL (configured default when `None`)
    pub async fn set<T>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) -> Result<()>
    where
        T: Serialize,
    {
        let mut conn = self.get_connection().await?;
        let serialized = serde_json::to_string(value)?;
        let full_key = self.full_key(key);
        let ttl = ttl_seconds.unwrap_or(self.config.ttl_seconds);

        let _: () = conn.set_ex(&full_key, serialized, ttl).await?;

        debug!(key = %full_key, ttl = ttl, "Value set in Redis");
        Ok(())
    }

    pub async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut conn = self.get_connection().await?;
        let full_key = self.full_key(key);

        let result: Option<String> = conn.get(&full_key).await?;
        match result {
            Some(data) => {
                let value = serde_json::from_str::<T>(&data)?;
                debug!(key = %full_key, "Value retrieved from Redis");
                Ok(Some(value))
            }
            None => {
                debug!(key = %full_key, "Key not found in Redis");
                Ok(None)
            }
        }
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let full_key = self.full_key(key);

        let deleted: i32 = conn.del(&full_key).await?;

        debug!(key = %full_key, deleted = deleted > 0, "Key deletion attempted");
        Ok(deleted > 0)
    }

    /// PING the server; connection failures report unhealthy rather than error
    pub async fn health_check(&self) -> bool {
        match self.get_connection().await {
            Ok(mut conn) => {
                let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
                match result {
                    Ok(response) => {
                        debug!(response = %response, "Redis health check successful");
                        response == "PONG"
                    }
                    Err(e) => {
                        warn!(error = %e, "Redis health check failed");
                        false
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Redis connection failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RedisConfig {
        RedisConfig {
            url: "redis://localhost:6379".to_string(),
            prefix: "vincuhub:test:".to_string(),
            ttl_seconds: 60,
        }
    }

    #[test]
    fn test_keys_are_prefixed() {
        let service = RedisService::new(config()).unwrap();
        assert_eq!(service.full_key("chat:42"), "vincuhub:test:chat:42");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let mut bad = config();
        bad.url = "not a redis url".to_string();
        assert!(RedisService::new(bad).is_err());
    }

    #[tokio::test]
    async fn test_health_check_reports_unreachable_server() {
        let mut unreachable = config();
        unreachable.url = "redis://127.0.0.1:1".to_string();
        let service = RedisService::new(unreachable).unwrap();
        assert!(!service.health_check().await);
    }
}
