// Next-run window computation
//
// Short history: jitter of ±10% around `now + I`.
// Full history: jitter of ±20% around `T5 + 5I`, where T5 is the fifth most
// recent run, so drift is smoothed over five runs instead of compounding.

use crate::interval::RunInterval;
use crate::models::RunWindow;
use chrono::{DateTime, Duration, Utc};

/// Number of past runs the anchored rule looks back over
pub const HISTORY_DEPTH: usize = 5;

/// Window after a run at `now`, given run timestamps most recent first
pub fn next_window(
    interval: RunInterval,
    now: DateTime<Utc>,
    recent_runs: &[DateTime<Utc>],
) -> RunWindow {
    match recent_runs.get(HISTORY_DEPTH - 1) {
        Some(fifth_most_recent) => {
            let anchor = shift(*fifth_most_recent, interval.scaled(HISTORY_DEPTH as f64));
            RunWindow::new(
                shift(anchor, -interval.scaled(0.2)),
                shift(anchor, interval.scaled(0.2)),
            )
        }
        None => RunWindow::new(
            shift(now, interval.scaled(0.9)),
            shift(now, interval.scaled(1.1)),
        ),
    }
}

/// `at + offset`, saturating at the representable range
pub fn shift(at: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
    at.checked_add_signed(offset).unwrap_or(if offset < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}
