// Due-job finder

use crate::errors::StoreError;
use crate::models::Job;
use crate::store::JobStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Queries the store for jobs worth dispatching before `horizon`
pub struct DueJobFinder {
    jobs: Arc<dyn JobStore>,
    lookahead: Duration,
}

impl DueJobFinder {
    pub fn new(jobs: Arc<dyn JobStore>, lookahead: Duration) -> Self {
        Self { jobs, lookahead }
    }

    /// `now + lookahead`
    pub fn horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lookahead
    }

    /// Jobs whose window overlaps `[now, horizon]` or has already passed
    pub async fn find(&self, horizon: DateTime<Utc>) -> Result<Vec<Job>, StoreError> {
        self.find_at(Utc::now(), horizon).await
    }

    #[instrument(skip(self))]
    pub async fn find_at(
        &self,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Result<Vec<Job>, StoreError> {
        // A horizon before now would hide windows that are currently open
        let horizon = horizon.max(now);
        let jobs = self.jobs.find_due(now, horizon).await?;
        debug!(job_count = jobs.len(), "Found due jobs");
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockJobStore;

    #[tokio::test]
    async fn test_horizon_is_clamped_to_now() {
        let now = Utc::now();
        let mut store = MockJobStore::new();
        store
            .expect_find_due()
            .withf(move |n, h| *n == now && *h == now)
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let finder = DueJobFinder::new(Arc::new(store), Duration::hours(2));
        let jobs = finder.find_at(now, now - Duration::minutes(5)).await.unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let mut store = MockJobStore::new();
        store
            .expect_find_due()
            .returning(|_, _| Err(StoreError::ConnectionFailed("down".to_string())));

        let finder = DueJobFinder::new(Arc::new(store), Duration::hours(2));
        let now = Utc::now();
        let result = finder.find_at(now, finder.horizon(now)).await;
        assert!(matches!(result, Err(StoreError::ConnectionFailed(_))));
    }

    #[test]
    fn test_horizon_uses_lookahead() {
        let finder = DueJobFinder::new(Arc::new(MockJobStore::new()), Duration::hours(2));
        let now = Utc::now();
        assert_eq!(finder.horizon(now), now + Duration::hours(2));
    }
}
