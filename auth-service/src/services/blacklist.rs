use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use service_core::async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Revocation list for refresh tokens, keyed by JWT ID.
///
/// Entries carry a TTL matching the token's remaining lifetime, so the
/// list never grows past the set of unexpired revoked tokens.
#[async_trait]
pub trait TokenBlacklist: Send + Sync {
    async fn blacklist_token(&self, jti: &str, expiry_seconds: i64) -> Result<(), anyhow::Error>;
    async fn is_blacklisted(&self, jti: &str) -> Result<bool, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

/// Redis-backed blacklist for production use
#[derive(Clone)]
pub struct RedisBlacklist {
    conn: ConnectionManager,
}

impl RedisBlacklist {
    pub async fn connect(redis_url: &str) -> Result<Self, anyhow::Error> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| anyhow::anyhow!("Invalid Redis URL: {}", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to Redis: {}", e))?;
        Ok(Self { conn })
    }

    fn key(jti: &str) -> String {
        format!("blacklist:{}", jti)
    }
}

#[async_trait]
impl TokenBlacklist for RedisBlacklist {
    async fn blacklist_token(&self, jti: &str, expiry_seconds: i64) -> Result<(), anyhow::Error> {
        let mut conn = self.conn.clone();
        let ttl = expiry_seconds.max(1) as u64;
        conn.set_ex::<_, _, ()>(Self::key(jti), "revoked", ttl)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to blacklist token: {}", e))?;
        Ok(())
    }

    async fn is_blacklisted(&self, jti: &str) -> Result<bool, anyhow::Error> {
        let mut conn = self.conn.clone();
        let exists: bool = conn
            .exists(Self::key(jti))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to check blacklist: {}", e))?;
        Ok(exists)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))?;
        Ok(())
    }
}

/// In-memory blacklist for tests. Ignores TTLs.
#[derive(Default)]
pub struct MemoryBlacklist {
    revoked: Mutex<HashSet<String>>,
}

impl MemoryBlacklist {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenBlacklist for MemoryBlacklist {
    async fn blacklist_token(&self, jti: &str, _expiry_seconds: i64) -> Result<(), anyhow::Error> {
        let mut revoked = self
            .revoked
            .lock()
            .map_err(|_| anyhow::anyhow!("Blacklist lock poisoned"))?;
        revoked.insert(jti.to_string());
        Ok(())
    }

    async fn is_blacklisted(&self, jti: &str) -> Result<bool, anyhow::Error> {
        let revoked = self
            .revoked
            .lock()
            .map_err(|_| anyhow::anyhow!("Blacklist lock poisoned"))?;
        Ok(revoked.contains(jti))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_blacklist_roundtrip() -> Result<(), anyhow::Error> {
        let blacklist = MemoryBlacklist::new();

        assert!(!blacklist.is_blacklisted("jti-1").await?);
        blacklist.blacklist_token("jti-1", 60).await?;
        assert!(blacklist.is_blacklisted("jti-1").await?);
        assert!(!blacklist.is_blacklisted("jti-2").await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_blacklist_idempotent() -> Result<(), anyhow::Error> {
        let blacklist = MemoryBlacklist::new();

        blacklist.blacklist_token("jti-1", 60).await?;
        blacklist.blacklist_token("jti-1", 60).await?;
        assert!(blacklist.is_blacklisted("jti-1").await?);

        Ok(())
    }
}
