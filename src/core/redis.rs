use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

/// Fixed-window limit applied to one subject (phone number, Telegram id, ...).
#[derive(Debug, Clone, Copy)]
pub(crate) struct RateLimit {
    pub(crate) scope: &'static str,
    pub(crate) limit: u64,
    pub(crate) window_seconds: u64,
}

pub(crate) const REGISTER_LIMIT: RateLimit =
    RateLimit { scope: "register", limit: 5, window_seconds: 3600 };
pub(crate) const LOGIN_LIMIT: RateLimit =
    RateLimit { scope: "login", limit: 10, window_seconds: 300 };
pub(crate) const BOT_CONTACT_LIMIT: RateLimit =
    RateLimit { scope: "bot-contact", limit: 3, window_seconds: 600 };

impl RateLimit {
    pub(crate) fn key(&self, subject: &str) -> String {
        format!("lms:rate-limit:{}:{}", self.scope, subject)
    }
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        let mut guard = self.manager.write().await;
        *guard = None;
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Returns `true` while the subject is within its window. Without a connection every call passes.
    pub(crate) async fn allow(&self, policy: RateLimit, subject: &str) -> Result<bool, RedisError> {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return Ok(true);
        };

        let script = redis::Script::new(
            r#"
            local current = redis.call("INCR", KEYS[1])
            if current == 1 then
                redis.call("EXPIRE", KEYS[1], ARGV[1])
            end
            return current
        "#,
        );

        let current: i64 = script
            .key(policy.key(subject))
            .arg(policy.window_seconds as i64)
            .invoke_async(&mut manager)
            .await?;

        let allowed = current <= policy.limit as i64;
        if !allowed {
            crate::core::metrics::record_rate_limited(policy.scope);
        }
        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::{RateLimit, RedisHandle};
    use crate::core::config::Settings;
    use crate::test_support;
    use uuid::Uuid;

    #[tokio::test]
    async fn allow_enforces_limit() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        test_support::reset_redis(settings.redis().redis_url()).await.expect("redis reset");

        let redis = RedisHandle::new(settings.redis().redis_url());
        redis.connect().await.expect("redis connect");

        let policy = RateLimit { scope: "unit", limit: 1, window_seconds: 5 };
        let subject = Uuid::new_v4().to_string();

        assert!(redis.allow(policy, &subject).await.expect("first"));
        assert!(!redis.allow(policy, &subject).await.expect("second"));
    }

    #[tokio::test]
    async fn disconnected_handle_allows_everything() {
        let redis = RedisHandle::new("redis://127.0.0.1:1/0".to_string());
        let policy = RateLimit { scope: "unit", limit: 0, window_seconds: 5 };

        assert!(redis.allow(policy, "anyone").await.expect("allow"));
    }

    #[test]
    fn keys_are_scoped() {
        let policy = RateLimit { scope: "login", limit: 1, window_seconds: 1 };
        assert_eq!(policy.key("901234567"), "lms:rate-limit:login:901234567");
    }
}
