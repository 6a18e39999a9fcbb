//! Background jobs that run on a fixed interval inside the server
//! process.
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_rusqlite::Connection;

use crate::core::AppConfig;

mod sweep_rate_limits;
pub use sweep_rate_limits::SweepRateLimits;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[async_trait]
pub trait PeriodicJob: Debug {
    fn interval(&self) -> Duration;
    async fn run_job(&self, config: &AppConfig, db: &Connection);
}

/// Run `job` forever in its own tokio task. The first run happens
/// one interval after startup.
pub fn spawn_periodic_job<J>(config: AppConfig, db: Connection, job: J) -> JoinHandle<()>
where
    J: PeriodicJob + Send + Sync + 'static,
{
    let period = if job.interval().is_zero() {
        tracing::warn!(
            "Periodic job {:?} has a zero interval, running every {:?} instead",
            job,
            MIN_INTERVAL
        );
        MIN_INTERVAL
    } else {
        job.interval()
    };

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            tracing::debug!("Running periodic job {:?}", job);
            job.run_job(&config, &db).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::RateLimiter;

    #[tokio::test]
    async fn it_keeps_running_with_a_zero_interval() {
        let db = Connection::open_in_memory().await.unwrap();
        let job = SweepRateLimits::new(RateLimiter::default(), Duration::ZERO);

        let handle = spawn_periodic_job(AppConfig::default(), db, job);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!handle.is_finished());
        handle.abort();
    }
}
