use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Lifecycle of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Shared progress counters for one run.
///
/// Workers bump the atomics; any number of concurrent readers take
/// [`RunProgress::snapshot`] without blocking the dispatch loop.
#[derive(Debug)]
pub struct RunProgress {
    total: AtomicUsize,
    scored: AtomicUsize,
    skipped: AtomicUsize,
    started_at: Instant,
}

impl RunProgress {
    pub fn new() -> Self {
        Self {
            total: AtomicUsize::new(0),
            scored: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    pub fn record_scored(&self) {
        self.scored.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let scored = self.scored.load(Ordering::SeqCst);
        let skipped = self.skipped.load(Ordering::SeqCst);
        let total = self.total.load(Ordering::SeqCst);
        let completed = scored + skipped;
        let elapsed = self.started_at.elapsed();

        // ETA from average time per completed symbol.
        let eta = if completed > 0 && completed < total {
            let avg = elapsed.as_secs_f64() / completed as f64;
            let remaining = (total - completed) as f64;
            Some(Duration::from_secs_f64(avg * remaining))
        } else {
            None
        };

        ProgressSnapshot {
            total,
            scored,
            skipped,
            completed,
            elapsed,
            eta,
        }
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a run's progress.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub scored: usize,
    pub skipped: usize,
    pub completed: usize,
    pub elapsed: Duration,
    pub eta: Option<Duration>,
}

impl ProgressSnapshot {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }

    /// Format for display
    pub fn format_display(&self) -> String {
        let eta = match self.eta {
            Some(eta) => format!("{:.1}min", eta.as_secs_f64() / 60.0),
            None => "-".to_string(),
        };
        format!(
            "[{:03}/{:03}] scored: {} | skipped: {} | Elapsed: {:.1}min | ETA: {}",
            self.completed,
            self.total,
            self.scored,
            self.skipped,
            self.elapsed.as_secs_f64() / 60.0,
            eta,
        )
    }
}

/// Final accounting for one run. Every symbol in the universe lands in
/// exactly one of the scored or skipped buckets.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub status: RunStatus,
    pub symbol_count: usize,
    pub scored: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}
