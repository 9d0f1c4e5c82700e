// In-process queues connecting the scheduler pipeline
//
// Both queues are bounded tokio channels: a full queue makes the producer
// wait, and dropping every sender closes the queue so the consumer drains
// what is buffered and then stops.

use crate::models::{JobResult, RunnableJob};
use tokio::sync::mpsc;

pub type DispatchSender = mpsc::Sender<RunnableJob>;
pub type DispatchReceiver = mpsc::Receiver<RunnableJob>;
pub type ResultSender = mpsc::Sender<JobResult>;
pub type ResultReceiver = mpsc::Receiver<JobResult>;

/// Queue sizes for the two pipeline stages
#[derive(Debug, Clone, Copy)]
pub struct QueueCapacities {
    pub dispatch: usize,
    pub result: usize,
}

impl Default for QueueCapacities {
    fn default() -> Self {
        Self {
            dispatch: 100,
            result: 100,
        }
    }
}

impl From<&crate::config::SchedulerConfig> for QueueCapacities {
    fn from(config: &crate::config::SchedulerConfig) -> Self {
        Self {
            dispatch: config.dispatch_queue_capacity,
            result: config.result_queue_capacity,
        }
    }
}

/// Finder to worker
pub fn dispatch_queue(capacity: usize) -> (DispatchSender, DispatchReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Worker to marker
pub fn result_queue(capacity: usize) -> (ResultSender, ResultReceiver) {
    mpsc::channel(capacity.max(1))
}
