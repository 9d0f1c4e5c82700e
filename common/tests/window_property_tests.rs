// Property-based tests for next-window computation and the due predicate

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::interval::RunInterval;
use common::models::RunWindow;
use common::scheduler::{next_window, HISTORY_DEPTH};
use proptest::prelude::*;

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn close_to(actual: DateTime<Utc>, base: DateTime<Utc>, offset_ms: f64) -> bool {
    let actual_ms = (actual - base).num_milliseconds() as f64;
    (actual_ms - offset_ms).abs() <= 1.0
}

// Short history: window is [now + 0.9I, now + 1.1I]
#[test]
fn property_short_history_window_around_now() {
    proptest!(|(
        interval_ms in 1i64..=7 * 24 * 3_600_000,
        now_secs in 1_600_000_000i64..1_900_000_000,
        history in 0usize..HISTORY_DEPTH,
        gap_secs in 1i64..10_000
    )| {
        let interval = RunInterval::from_millis(interval_ms).unwrap();
        let now = timestamp(now_secs);
        let runs: Vec<_> = (1..=history as i64).map(|i| now - Duration::seconds(i * gap_secs)).collect();

        let window = next_window(interval, now, &runs);

        prop_assert!(window.min <= window.max);
        prop_assert!(close_to(window.min, now, 0.9 * interval_ms as f64));
        prop_assert!(close_to(window.max, now, 1.1 * interval_ms as f64));
    });
}

// Five or more runs: window is [T + 4.8I, T + 5.2I], T = fifth most recent run
#[test]
fn property_full_history_window_anchored_on_fifth_run() {
    proptest!(|(
        interval_ms in 1i64..=7 * 24 * 3_600_000,
        now_secs in 1_600_000_000i64..1_900_000_000,
        extra in 0usize..10,
        gaps in prop::collection::vec(1i64..100_000, HISTORY_DEPTH + 10)
    )| {
        let interval = RunInterval::from_millis(interval_ms).unwrap();
        let now = timestamp(now_secs);

        let mut at = now;
        let runs: Vec<_> = gaps
            .iter()
            .take(HISTORY_DEPTH + extra)
            .map(|gap| {
                at -= Duration::seconds(*gap);
                at
            })
            .collect();
        let fifth = runs[HISTORY_DEPTH - 1];

        let window = next_window(interval, now, &runs);

        prop_assert!(window.min <= window.max);
        prop_assert!(close_to(window.min, fifth, 4.8 * interval_ms as f64));
        prop_assert!(close_to(window.max, fifth, 5.2 * interval_ms as f64));
    });
}

// A point window in the past is selectable for any horizon at or after now
#[test]
fn property_overdue_point_window_always_selectable() {
    proptest!(|(
        now_secs in 1_600_000_000i64..1_900_000_000,
        age_secs in 1i64..10_000_000,
        horizon_secs in 0i64..100_000
    )| {
        let now = timestamp(now_secs);
        let t0 = now - Duration::seconds(age_secs);
        let window = RunWindow::new(t0, t0);

        prop_assert!(window.is_selectable(now, now + Duration::seconds(horizon_secs)));
        prop_assert!(window.is_due_at(now));
    });
}

// A window entirely after the horizon is never selected
#[test]
fn property_future_window_beyond_horizon_not_selectable() {
    proptest!(|(
        now_secs in 1_600_000_000i64..1_900_000_000,
        horizon_secs in 0i64..100_000,
        lead_secs in 1i64..100_000,
        width_secs in 0i64..100_000
    )| {
        let now = timestamp(now_secs);
        let horizon = now + Duration::seconds(horizon_secs);
        let min = horizon + Duration::seconds(lead_secs);
        let window = RunWindow::new(min, min + Duration::seconds(width_secs));

        prop_assert!(!window.is_selectable(now, horizon));
    });
}
