use redis::{AsyncCommands, RedisResult};
use tracing::info;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        // fail at startup rather than on the first request
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Connected to Redis");
        Ok(Self { client })
    }

    /// Fixed-window counter: `true` while `key` has been hit at most `limit`
    /// times in the current window.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .ttl(key)
            .query_async(&mut conn)
            .await?;

        // the window starts at the first hit and is never extended
        if needs_expiry(count, ttl) {
            let _: bool = conn.expire(key, window_seconds).await?;
        }

        Ok(count <= limit)
    }
}

/// `ttl` as reported by Redis right after the increment: -1 means the key
/// exists without an expiry.
fn needs_expiry(count: i64, ttl: i64) -> bool {
    count == 1 || ttl == -1
}

pub fn rate_limit_key(client: &str) -> String {
    format!("railbook:ratelimit:{}", client)
}
