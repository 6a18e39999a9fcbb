use async_trait::async_trait;
use std::time::Duration;
use tokio_rusqlite::Connection;

use super::PeriodicJob;
use crate::core::AppConfig;
use crate::limiter::RateLimiter;

/// Evicts clients the rate limiter no longer needs to remember so
/// its map doesn't grow with every address ever seen.
#[derive(Debug)]
pub struct SweepRateLimits {
    limiter: RateLimiter,
    interval: Duration,
}

impl SweepRateLimits {
    pub fn new(limiter: RateLimiter, interval: Duration) -> Self {
        Self { limiter, interval }
    }
}

#[async_trait]
impl PeriodicJob for SweepRateLimits {
    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_job(&self, _config: &AppConfig, _db: &Connection) {
        let removed = self.limiter.sweep();
        tracing::debug!(
            removed,
            remaining = self.limiter.len(),
            "Swept stale rate limit clients"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::RateLimitConfig;

    #[tokio::test]
    async fn it_removes_expired_clients() {
        let limiter = RateLimiter::new(RateLimitConfig {
            window: Duration::from_millis(10),
            max_requests: 5,
            cooldown: Duration::from_millis(10),
        });
        assert!(limiter.check("10.0.0.1").is_allowed());
        assert!(limiter.check("10.0.0.2").is_allowed());
        assert_eq!(limiter.len(), 2);

        tokio::time::sleep(Duration::from_millis(30)).await;

        let job = SweepRateLimits::new(limiter.clone(), Duration::from_secs(60));
        let db = Connection::open_in_memory().await.unwrap();
        let mut config = AppConfig::default();
        config.rate_limit = *limiter.config();

        job.run_job(&config, &db).await;
        assert!(limiter.is_empty());
    }
}
