// Worker and marker tasks wired together by the two queues

use crate::queue::{dispatch_queue, result_queue, DispatchSender, QueueCapacities};
use crate::scheduler::marker::ResultMarker;
use crate::worker::ExecutionWorker;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub struct Pipeline;

impl Pipeline {
    /// Spawn the worker and marker loops
    ///
    /// Dropping every clone of the returned sender closes the dispatch queue;
    /// the worker then drains, closes the result queue, and the marker drains.
    pub fn spawn(
        worker: ExecutionWorker,
        marker: ResultMarker,
        capacities: QueueCapacities,
    ) -> (DispatchSender, PipelineHandle) {
        let (dispatch_tx, dispatch_rx) = dispatch_queue(capacities.dispatch);
        let (result_tx, result_rx) = result_queue(capacities.result);

        let worker = tokio::spawn(worker.run(dispatch_rx, result_tx));
        let marker = tokio::spawn(marker.run(result_rx));

        info!(
            dispatch_capacity = capacities.dispatch,
            result_capacity = capacities.result,
            "Pipeline started"
        );

        (dispatch_tx, PipelineHandle { worker, marker })
    }
}

/// Join handles of the two consumer tasks
pub struct PipelineHandle {
    worker: JoinHandle<()>,
    marker: JoinHandle<()>,
}

impl PipelineHandle {
    /// Wait for both loops to finish draining
    pub async fn join(self) {
        if let Err(e) = self.worker.await {
            error!(error = %e, "Execution worker task failed");
        }
        if let Err(e) = self.marker.await {
            error!(error = %e, "Job marker task failed");
        }
        info!("Pipeline drained");
    }
}
