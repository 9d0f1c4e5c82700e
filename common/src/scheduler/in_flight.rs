// Process-local set of jobs currently moving through the pipeline

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Shared between the driver, which claims ids, and the marker, which
/// releases them once a job's bookkeeping is done
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    ids: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the job is already in flight
    pub async fn try_claim(&self, job_id: Uuid) -> bool {
        self.ids.lock().await.insert(job_id)
    }

    pub async fn release(&self, job_id: Uuid) {
        self.ids.lock().await.remove(&job_id);
    }

    /// Drop every claim; used once no task can release them any more
    pub async fn clear(&self) {
        self.ids.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.ids.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.ids.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_release_cycle() {
        let in_flight = InFlight::new();
        let id = Uuid::new_v4();

        assert!(in_flight.try_claim(id).await);
        assert!(!in_flight.try_claim(id).await);
        assert_eq!(in_flight.len().await, 1);

        in_flight.release(id).await;
        assert!(in_flight.is_empty().await);
        assert!(in_flight.try_claim(id).await);
    }

    #[tokio::test]
    async fn test_clear_drops_all_claims() {
        let in_flight = InFlight::new();
        in_flight.try_claim(Uuid::new_v4()).await;
        in_flight.try_claim(Uuid::new_v4()).await;

        in_flight.clear().await;
        assert!(in_flight.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let driver_side = InFlight::new();
        let marker_side = driver_side.clone();
        let id = Uuid::new_v4();

        driver_side.try_claim(id).await;
        marker_side.release(id).await;
        assert!(driver_side.is_empty().await);
    }
}
