use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::error::{MaintenanceError, Result};

/// Named units of work the scheduler can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    UsersCleansing,
    GiveRewards,
    FollowSendPayment,
    PaymentsCleansing,
    CacheMarket,
    SendNotification,
}

impl JobKind {
    pub const ALL: [JobKind; 6] = [
        JobKind::UsersCleansing,
        JobKind::GiveRewards,
        JobKind::FollowSendPayment,
        JobKind::PaymentsCleansing,
        JobKind::CacheMarket,
        JobKind::SendNotification,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            JobKind::UsersCleansing => "users_cleansing",
            JobKind::GiveRewards => "give_rewards",
            JobKind::FollowSendPayment => "follow_send_payment",
            JobKind::PaymentsCleansing => "payments_cleansing",
            JobKind::CacheMarket => "cache_external_market_prices",
            JobKind::SendNotification => "send_notification",
        }
    }

    /// Hard wall-clock limit after which the run counts as failed.
    pub fn time_limit(&self) -> Duration {
        let secs = match self {
            JobKind::UsersCleansing | JobKind::PaymentsCleansing => 600,
            JobKind::GiveRewards | JobKind::FollowSendPayment => 180,
            JobKind::CacheMarket | JobKind::SendNotification => 120,
        };
        Duration::from_secs(secs)
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs a job body under its declared time limit.
pub async fn run_job<F, T>(kind: JobKind, job: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    run_with_limit(kind.name(), kind.time_limit(), job).await
}

async fn run_with_limit<F, T>(name: &'static str, limit: Duration, job: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    info!("Starting {} (limit {}s)", name, limit.as_secs());
    let started = Instant::now();
    let timed_out = || MaintenanceError::TimedOut {
        name,
        limit_secs: limit.as_secs(),
    };

    let result = match tokio::time::timeout(limit, job).await {
        Ok(result) => result,
        Err(_) => {
            error!("{} exceeded its time limit", name);
            return Err(timed_out());
        }
    };

    // Blocking bodies finish inside a single poll, so check the clock too.
    let elapsed = started.elapsed();
    if elapsed > limit {
        error!("{} finished after {:?}, over its limit", name, elapsed);
        return Err(timed_out());
    }

    match &result {
        Ok(_) => info!("{} finished in {:?}", name, elapsed),
        Err(e) => error!("{} failed after {:?}: {}", name, elapsed, e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_limits() {
        assert_eq!(JobKind::UsersCleansing.time_limit(), Duration::from_secs(600));
        assert_eq!(JobKind::PaymentsCleansing.time_limit(), Duration::from_secs(600));
        assert_eq!(JobKind::GiveRewards.time_limit(), Duration::from_secs(180));
        assert_eq!(JobKind::FollowSendPayment.time_limit(), Duration::from_secs(180));
        assert_eq!(JobKind::SendNotification.time_limit(), Duration::from_secs(120));
        assert_eq!(JobKind::CacheMarket.time_limit(), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_run_job_passes_result_through() {
        let value = run_job(JobKind::GiveRewards, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);

        let failed: Result<()> = run_job(JobKind::GiveRewards, async {
            Err(MaintenanceError::NotFound("x".to_string()))
        })
        .await;
        assert!(matches!(failed, Err(MaintenanceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_slow_job_times_out() {
        let result: Result<()> = run_with_limit("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(MaintenanceError::TimedOut { name: "slow", .. })));
    }

    #[tokio::test]
    async fn test_blocking_overrun_counts_as_timeout() {
        let result: Result<()> = run_with_limit("blocking", Duration::from_millis(5), async {
            std::thread::sleep(Duration::from_millis(30));
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(MaintenanceError::TimedOut { .. })));
    }
}
