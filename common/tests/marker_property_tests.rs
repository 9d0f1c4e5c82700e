// Property-based tests for result marking against the in-memory store

use chrono::{Duration, Utc};
use common::errors::ExecutionError;
use common::interval::RunInterval;
use common::models::{ExecutionOutcome, Job, JobResult, JobTemplate, RunRecord, TemplateType};
use common::scheduler::{ResultMarker, HISTORY_DEPTH};
use common::store::{JobStore, MemoryStore, RunStore, TemplateStore};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

async fn seeded(interval_ms: i64, history: usize) -> (Arc<MemoryStore>, Job) {
    let store = Arc::new(MemoryStore::new());
    let template = JobTemplate::new(
        TemplateType::RemoteFunction,
        None,
        json!({"function_name": "f1"}),
    )
    .unwrap();
    TemplateStore::insert(store.as_ref(), &template).await.unwrap();

    let job = Job::new(
        template.id,
        RunInterval::from_millis(interval_ms).unwrap(),
        json!({}),
        None,
        Utc::now(),
    );
    JobStore::insert(store.as_ref(), &job).await.unwrap();

    let base = Utc::now() - Duration::days(30);
    for i in 0..history {
        store
            .insert_run(&RunRecord {
                job_id: job.id,
                run_at: base + Duration::minutes(i as i64),
                success: true,
                diagnostics: Vec::new(),
            })
            .await
            .unwrap();
    }

    (store, job)
}

// Marking appends exactly one run and stores the computed window, whether or not the run failed
#[test]
fn property_marking_records_once_and_moves_window() {
    proptest!(|(
        interval_ms in 1_000i64..86_400_000,
        history in 0usize..8,
        failed in any::<bool>(),
        diagnostics in prop::collection::vec(any::<u8>(), 0..64)
    )| {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (store, job) = seeded(interval_ms, history).await;
            let marker = ResultMarker::new(store.clone(), store.clone());

            let error = failed.then(|| ExecutionError::HttpRequestFailed("refused".to_string()));
            let result = JobResult::new(
                job.clone(),
                TemplateType::RemoteFunction,
                ExecutionOutcome { error, diagnostics: diagnostics.clone() },
            );

            let now = Utc::now();
            let report = marker.mark_at(&result, now).await;

            prop_assert!(report.window_persisted);
            prop_assert!(report.history_persisted);

            let runs = store.runs_for(job.id).await;
            prop_assert_eq!(runs.len(), history + 1);
            let last = runs.last().unwrap();
            prop_assert_eq!(last.run_at, now);
            prop_assert_eq!(last.success, !failed);
            prop_assert_eq!(&last.diagnostics, &diagnostics);

            let stored = JobStore::find_by_id(store.as_ref(), job.id).await.unwrap().unwrap();
            prop_assert_eq!(stored.window, report.window);

            if history >= HISTORY_DEPTH {
                prop_assert!(stored.window.min < now);
            } else {
                prop_assert!(stored.window.min > now);
            }
            Ok(())
        })?;
    });
}
