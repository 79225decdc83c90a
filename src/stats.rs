//! In-memory performance aggregate.
//!
//! Process-lifetime counters and running latency averages per delivery path,
//! mutated only by the orchestrator after each completed attempt. The
//! incremental-average update is a read-modify-write, so all updates go
//! through one mutex. Diagnostic-only, but the arithmetic is exact.

use serde::Serialize;
use std::sync::Mutex;

/// Logical operation served by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Chat,
    Image,
    Models,
}

/// Which path completed the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    Direct,
    Browser,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct OperationCounts {
    pub direct: u64,
    pub browser: u64,
}

#[derive(Debug, Default)]
struct PerfState {
    chat: OperationCounts,
    image: OperationCounts,
    models: OperationCounts,
    direct_calls: u64,
    browser_calls: u64,
    avg_direct_secs: f64,
    avg_browser_secs: f64,
}

/// Read-only view of the aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct PerfSnapshot {
    pub chat: OperationCounts,
    pub image: OperationCounts,
    pub models: OperationCounts,
    pub direct_calls: u64,
    pub browser_calls: u64,
    pub avg_direct_secs: f64,
    pub avg_browser_secs: f64,
    /// Percentage of calls served by the direct path, if any completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_ratio: Option<f64>,
    /// `avg_browser / avg_direct`; undefined until both paths have data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_up: Option<f64>,
}

/// Running statistics aggregate, shared across concurrent requests.
#[derive(Debug, Default)]
pub struct PerfTracker {
    state: Mutex<PerfState>,
}

impl PerfTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed attempt.
    ///
    /// Updates the per-operation counter for `path` and folds the duration
    /// into that path's running mean: `new = (old * (n - 1) + x) / n`.
    pub fn record(&self, operation: OperationKind, path: PathKind, duration_secs: f64) {
        let mut st = match self.state.lock() {
            Ok(st) => st,
            // A poisoned aggregate only loses diagnostics; keep serving.
            Err(poisoned) => poisoned.into_inner(),
        };

        let counts = match operation {
            OperationKind::Chat => &mut st.chat,
            OperationKind::Image => &mut st.image,
            OperationKind::Models => &mut st.models,
        };
        match path {
            PathKind::Direct => counts.direct += 1,
            PathKind::Browser => counts.browser += 1,
        }

        match path {
            PathKind::Direct => {
                st.direct_calls += 1;
                let n = st.direct_calls as f64;
                st.avg_direct_secs = (st.avg_direct_secs * (n - 1.0) + duration_secs) / n;
            }
            PathKind::Browser => {
                st.browser_calls += 1;
                let n = st.browser_calls as f64;
                st.avg_browser_secs = (st.avg_browser_secs * (n - 1.0) + duration_secs) / n;
            }
        }
    }

    pub fn snapshot(&self) -> PerfSnapshot {
        let st = match self.state.lock() {
            Ok(st) => st,
            Err(poisoned) => poisoned.into_inner(),
        };

        let total = st.direct_calls + st.browser_calls;
        let (direct_ratio, browser_ratio) = if total > 0 {
            (
                Some(st.direct_calls as f64 / total as f64 * 100.0),
                Some(st.browser_calls as f64 / total as f64 * 100.0),
            )
        } else {
            (None, None)
        };

        let speed_up = if st.avg_direct_secs > 0.0 && st.avg_browser_secs > 0.0 {
            Some(st.avg_browser_secs / st.avg_direct_secs)
        } else {
            None
        };

        PerfSnapshot {
            chat: st.chat.clone(),
            image: st.image.clone(),
            models: st.models.clone(),
            direct_calls: st.direct_calls,
            browser_calls: st.browser_calls,
            avg_direct_secs: st.avg_direct_secs,
            avg_browser_secs: st.avg_browser_secs,
            direct_ratio,
            browser_ratio,
            speed_up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn running_mean_is_incrementally_exact() {
        let tracker = PerfTracker::new();
        tracker.record(OperationKind::Chat, PathKind::Direct, 2.0);
        tracker.record(OperationKind::Chat, PathKind::Direct, 4.0);
        assert_eq!(tracker.snapshot().avg_direct_secs, 3.0);

        tracker.record(OperationKind::Chat, PathKind::Direct, 6.0);
        assert_eq!(tracker.snapshot().avg_direct_secs, 4.0);
    }

    #[test]
    fn speed_up_requires_both_paths() {
        let tracker = PerfTracker::new();
        tracker.record(OperationKind::Chat, PathKind::Direct, 1.0);
        assert!(tracker.snapshot().speed_up.is_none());

        tracker.record(OperationKind::Chat, PathKind::Browser, 30.0);
        let snap = tracker.snapshot();
        assert_eq!(snap.speed_up, Some(30.0));
        assert_eq!(snap.direct_ratio, Some(50.0));
    }

    #[test]
    fn counts_are_split_per_operation() {
        let tracker = PerfTracker::new();
        tracker.record(OperationKind::Chat, PathKind::Direct, 0.5);
        tracker.record(OperationKind::Image, PathKind::Browser, 12.0);
        tracker.record(OperationKind::Models, PathKind::Direct, 0.2);

        let snap = tracker.snapshot();
        assert_eq!(snap.chat.direct, 1);
        assert_eq!(snap.chat.browser, 0);
        assert_eq!(snap.image.browser, 1);
        assert_eq!(snap.models.direct, 1);
        assert_eq!(snap.direct_calls, 2);
        assert_eq!(snap.browser_calls, 1);
    }

    #[tokio::test]
    async fn concurrent_records_lose_no_updates() {
        let tracker = Arc::new(PerfTracker::new());
        let mut handles = Vec::new();
        for i in 0..64u64 {
            let t = tracker.clone();
            handles.push(tokio::spawn(async move {
                t.record(OperationKind::Chat, PathKind::Direct, i as f64);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let snap = tracker.snapshot();
        assert_eq!(snap.direct_calls, 64);
        // Mean of 0..=63 regardless of interleaving order.
        assert!((snap.avg_direct_secs - 31.5).abs() < 1e-9);
    }
}
