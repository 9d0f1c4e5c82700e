// Property-based tests for whole scheduling cycles over the in-memory store

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::config::SchedulerConfig;
use common::executor::{ExecutorRegistry, JobExecutor};
use common::interval::RunInterval;
use common::models::{ExecutionOutcome, Job, JobTemplate, RunWindow, TemplateType};
use common::scheduler::SchedulerEngine;
use common::store::{JobStore, MemoryStore, Stores, TemplateStore};
use proptest::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingExecutor {
    calls: AtomicUsize,
}

#[async_trait]
impl JobExecutor for CountingExecutor {
    async fn execute(&self, _job: &Job, _template: &JobTemplate) -> ExecutionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ExecutionOutcome::success(b"ok".to_vec())
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    executor: Arc<CountingExecutor>,
    engine: SchedulerEngine,
    due: Vec<Job>,
    idle: Vec<Job>,
}

async fn fixture(due: usize, idle: usize, interval_ms: i64) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let template = JobTemplate::new(
        TemplateType::Http,
        Some("ping".to_string()),
        json!({"method": "GET", "url": "http://localhost/:id"}),
    )
    .unwrap();
    TemplateStore::insert(store.as_ref(), &template).await.unwrap();

    let now = Utc::now();
    let interval = RunInterval::from_millis(interval_ms).unwrap();

    let make = |offset: Duration| {
        let mut job = Job::new(template.id, interval, json!({}), None, now);
        job.window = RunWindow::new(now + offset, now + offset);
        job
    };
    let due_jobs: Vec<Job> = (0..due).map(|i| make(-Duration::minutes(i as i64 + 1))).collect();
    let idle_jobs: Vec<Job> = (0..idle).map(|i| make(Duration::days(i as i64 + 1))).collect();
    for job in due_jobs.iter().chain(idle_jobs.iter()) {
        JobStore::insert(store.as_ref(), job).await.unwrap();
    }

    let executor = Arc::new(CountingExecutor {
        calls: AtomicUsize::new(0),
    });
    let registry = ExecutorRegistry::new().register(TemplateType::Http, executor.clone());
    let engine = SchedulerEngine::new(
        SchedulerConfig::default(),
        Stores::memory(store.clone()),
        registry,
    );

    Fixture {
        store,
        executor,
        engine,
        due: due_jobs,
        idle: idle_jobs,
    }
}

/// **Property: One cycle runs each due job exactly once**
///
/// Every overdue job is executed and recorded once; jobs whose window lies
/// beyond the lookahead are left untouched.
#[test]
fn property_cycle_runs_each_due_job_once() {
    proptest!(|(
        due in 0usize..12,
        idle in 0usize..6,
        interval_ms in 60_000i64..86_400_000
    )| {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let f = fixture(due, idle, interval_ms).await;

            let dispatched = f.engine.run_once().await.unwrap();

            prop_assert_eq!(dispatched, due);
            prop_assert_eq!(f.executor.calls.load(Ordering::SeqCst), due);
            for job in &f.due {
                prop_assert_eq!(f.store.runs_for(job.id).await.len(), 1);
            }
            for job in &f.idle {
                prop_assert!(f.store.runs_for(job.id).await.is_empty());
                let stored = JobStore::find_by_id(f.store.as_ref(), job.id).await.unwrap().unwrap();
                prop_assert_eq!(stored.window, job.window);
            }
            prop_assert_eq!(f.engine.in_flight_count().await, 0);
            Ok(())
        })?;
    });
}

/// **Property: Marked jobs move their window forward**
///
/// With a short history the next window opens 0.9 intervals after the run,
/// which is later than the overdue window the job was selected with.
#[test]
fn property_marked_jobs_window_moves_forward() {
    proptest!(|(
        due in 1usize..6,
        interval_ms in 60_000i64..86_400_000
    )| {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let f = fixture(due, 0, interval_ms).await;
            let before = Utc::now();

            f.engine.run_once().await.unwrap();

            for job in &f.due {
                let stored = JobStore::find_by_id(f.store.as_ref(), job.id).await.unwrap().unwrap();
                prop_assert!(stored.window.min > job.window.max);
                prop_assert!(stored.window.min >= before + Duration::milliseconds(interval_ms * 9 / 10));
                prop_assert!(stored.window.min <= stored.window.max);
            }
            Ok(())
        })?;
    });
}
