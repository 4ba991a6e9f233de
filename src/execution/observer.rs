use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { records: usize },
    ThrottleWaited { duration: Duration },
    ChunkStarted { start_record: usize, record_count: usize },
    ChunkFinished { output_records: usize },
    RecordRejected { index: usize, message: String },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// A simple stderr logger for execution events.
#[derive(Debug, Default)]
pub struct StdErrExecutionObserver;

impl ExecutionObserver for StdErrExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunFinished { elapsed, metrics } => {
                eprintln!("[evolve][done] elapsed={elapsed:?} {metrics}");
            }
            ExecutionEvent::RecordRejected { index, message } => {
                eprintln!("[evolve][rejected] record={index} err={message}");
            }
            other => eprintln!("[evolve] {other:?}"),
        }
    }
}

/// Real-time metrics for an execution run.
///
/// The engine updates these counters during execution; callers can snapshot them at any time.
/// Every counter except `run_id` is reset when a run begins.
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,
    records_processed: AtomicU64,
    records_rejected: AtomicU64,
    chunks: AtomicU64,
    throttle_wait_ns: AtomicU64,
    active_chunks: AtomicUsize,
    max_active_chunks: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);
        for counter in [
            &self.elapsed_ns,
            &self.records_processed,
            &self.records_rejected,
            &self.chunks,
            &self.throttle_wait_ns,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
        self.active_chunks.store(0, Ordering::SeqCst);
        self.max_active_chunks.store(0, Ordering::SeqCst);
    }

    pub(crate) fn end_run(&self, elapsed: Duration) {
        // 0 means "still running", so a finished run stores at least 1ns.
        self.elapsed_ns.store(nanos(elapsed).max(1), Ordering::SeqCst);
    }

    pub(crate) fn on_record_processed(&self) {
        let _ = self.records_processed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn on_record_rejected(&self) {
        let _ = self.records_rejected.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn on_chunk_start(&self) {
        let now = self.active_chunks.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.max_active_chunks.fetch_max(now, Ordering::SeqCst);
    }

    pub(crate) fn on_chunk_end(&self) {
        let _ = self.chunks.fetch_add(1, Ordering::SeqCst);
        let _ = self.active_chunks.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn on_throttle_wait(&self, d: Duration) {
        let _ = self.throttle_wait_ns.fetch_add(nanos(d), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            records_processed: self.records_processed.load(Ordering::SeqCst),
            records_rejected: self.records_rejected.load(Ordering::SeqCst),
            chunks: self.chunks.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_active_chunks: self.max_active_chunks.load(Ordering::SeqCst),
        }
    }
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    /// `None` while the run is in progress.
    pub elapsed: Option<Duration>,
    pub records_processed: u64,
    pub records_rejected: u64,
    /// Finished chunks.
    pub chunks: u64,
    pub throttle_wait: Duration,
    pub max_active_chunks: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={} records={} rejected={} chunks={} max_active_chunks={} throttle_wait={:?} \
             elapsed={:?}",
            self.run_id,
            self.records_processed,
            self.records_rejected,
            self.chunks,
            self.max_active_chunks,
            self.throttle_wait,
            self.elapsed
        )
    }
}
