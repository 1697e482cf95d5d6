use super::traits::{RefreshTokenStore, StoreResult};
use redis::aio::ConnectionManager;
use uuid::Uuid;

/// Redis-backed refresh token records: `refresh_token:{account_id}` → fingerprint
#[derive(Clone)]
pub struct RedisRefreshTokenStore {
    conn: ConnectionManager,
}

impl RedisRefreshTokenStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn key(account_id: Uuid) -> String {
        format!("refresh_token:{}", account_id)
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn put(&self, account_id: Uuid, fingerprint: &str, ttl_secs: u64) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(Self::key(account_id))
            .arg(fingerprint)
            .arg("EX")
            .arg(ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, account_id: Uuid) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(Self::key(account_id))
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn remove(&self, account_id: Uuid) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(Self::key(account_id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
