//! Execution engine for evolving record batches with configurable parallelism.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - Parallel (chunked) evolve over a slice of records, output in input order
//! - Resource limits / throttling (in-flight chunks)
//! - Real-time metrics + observer hooks for monitoring

mod observer;
mod semaphore;

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{EvolveError, EvolveResult};
use crate::processing::{evolve, try_evolve, EvolveOptions};
use crate::transform::TransformationSpec;
use crate::types::Value;

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver,
    StdErrExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of records per chunk.
    pub chunk_size: usize,
    /// Upper bound on concurrently executing chunks.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight_chunks: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            chunk_size: 1_024,
            max_in_flight_chunks: n.max(1),
        }
    }
}

/// A configurable execution engine for evolving many records.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size == 0`, `max_in_flight_chunks == 0`, `num_threads == Some(0)`, or the
    /// thread pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> Self {
        assert!(opts.chunk_size > 0, "chunk_size must be > 0");
        assert!(
            opts.max_in_flight_chunks > 0,
            "max_in_flight_chunks must be > 0"
        );
        if let Some(n) = opts.num_threads {
            assert!(n > 0, "num_threads must be > 0 when set");
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .expect("failed to build rayon thread pool");

        Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.opts
    }

    /// Evolve every record with `spec` in parallel.
    ///
    /// The output has one record per input record, in input order, each equal to
    /// `evolve(spec, record)`.
    pub fn evolve_parallel(&self, spec: &TransformationSpec, records: &[Value]) -> Vec<Value> {
        let out = self.pool.install(|| {
            self.run_chunks::<Infallible>(records, &|_, record| Ok(evolve(spec, record)))
        });
        match out {
            Ok(records) => records,
            Err(never) => match never {},
        }
    }

    /// Evolve every record with `spec` in parallel, honoring `options`.
    ///
    /// On failure returns the error of the lowest-indexed failing record, its path prefixed with
    /// the record index (e.g. `$[3].user.address`).
    pub fn try_evolve_parallel(
        &self,
        spec: &TransformationSpec,
        records: &[Value],
        options: &EvolveOptions,
    ) -> EvolveResult<Vec<Value>> {
        self.pool.install(|| {
            self.run_chunks::<EvolveError>(records, &|index, record| {
                try_evolve(spec, record, options).map_err(|e| {
                    self.metrics.on_record_rejected();
                    let e = e.within(&format!("$[{index}]"));
                    self.emit(ExecutionEvent::RecordRejected {
                        index,
                        message: e.to_string(),
                    });
                    e
                })
            })
        })
    }

    fn run_chunks<E: Send>(
        &self,
        records: &[Value],
        per_record: &(dyn Fn(usize, &Value) -> Result<Value, E> + Send + Sync),
    ) -> Result<Vec<Value>, E> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            records: records.len(),
        });

        let sem = Semaphore::new(self.opts.max_in_flight_chunks);
        let chunk_ranges = chunk_ranges(records.len(), self.opts.chunk_size);

        let per_chunk: Vec<Result<Vec<Value>, E>> = chunk_ranges
            .into_par_iter()
            .map(|range| {
                let permit = sem.acquire();
                if permit.waited > Duration::ZERO {
                    self.metrics.on_throttle_wait(permit.waited);
                    self.emit(ExecutionEvent::ThrottleWaited {
                        duration: permit.waited,
                    });
                }

                self.metrics.on_chunk_start();
                self.emit(ExecutionEvent::ChunkStarted {
                    start_record: range.start,
                    record_count: range.len(),
                });

                let mut out = Vec::with_capacity(range.len());
                let mut failed = None;
                for index in range {
                    self.metrics.on_record_processed();
                    match per_record(index, &records[index]) {
                        Ok(v) => out.push(v),
                        Err(e) => {
                            failed = Some(e);
                            break;
                        }
                    }
                }

                self.emit(ExecutionEvent::ChunkFinished {
                    output_records: out.len(),
                });
                self.metrics.on_chunk_end();
                drop(permit);
                match failed {
                    Some(e) => Err(e),
                    None => Ok(out),
                }
            })
            .collect();

        // Chunks are in record order, so the first error is the lowest-indexed one.
        let out = per_chunk
            .into_iter()
            .collect::<Result<Vec<_>, E>>()
            .map(|chunks| chunks.into_iter().flatten().collect::<Vec<_>>());

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        out
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("opts", &self.opts)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

fn chunk_ranges(record_count: usize, chunk_size: usize) -> Vec<std::ops::Range<usize>> {
    (0..record_count)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(record_count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{chunk_ranges, ExecutionEngine, ExecutionOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::error::EvolveError;
    use crate::execution::{ExecutionEvent, ExecutionObserver};
    use crate::processing::{evolve, EvolveOptions};
    use crate::transform::{leaves, TransformationSpec};
    use crate::types::{Map, Value};

    fn records_of_n(n: usize) -> Vec<Value> {
        (0..n as i64)
            .map(|i| Value::map(Map::from([("id", Value::from(i)), ("name", Value::from(" x "))])))
            .collect()
    }

    fn engine(threads: usize, chunk_size: usize, in_flight: usize) -> ExecutionEngine {
        ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(threads),
            chunk_size,
            max_in_flight_chunks: in_flight,
        })
    }

    #[test]
    fn chunk_ranges_cover_all_records() {
        assert!(chunk_ranges(0, 3).is_empty());
        assert_eq!(chunk_ranges(7, 3), vec![0..3, 3..6, 6..7]);
        assert_eq!(chunk_ranges(6, 3), vec![0..3, 3..6]);
    }

    #[test]
    fn evolve_parallel_matches_sequential_and_keeps_order() {
        let records = records_of_n(250);
        let spec = TransformationSpec::new()
            .leaf("id", leaves::add(1))
            .leaf("name", leaves::trim());

        let out = engine(4, 7, 4).evolve_parallel(&spec, &records);
        let expected: Vec<Value> = records.iter().map(|r| evolve(&spec, r)).collect();

        assert_eq!(out, expected);
    }

    #[test]
    fn evolve_parallel_runs_with_concurrency() {
        let records = records_of_n(200);
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let active2 = Arc::clone(&active);
        let max_active2 = Arc::clone(&max_active);
        let spec = TransformationSpec::new().leaf("id", move |v: &Value| {
            let now = active2.fetch_add(1, Ordering::SeqCst) + 1;
            max_active2.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            active2.fetch_sub(1, Ordering::SeqCst);
            v.clone()
        });

        let out = engine(4, 1, 4).evolve_parallel(&spec, &records);

        assert_eq!(out.len(), records.len());
        assert!(max_active.load(Ordering::SeqCst) > 1);
    }

    struct ConcurrencyObserver {
        active_chunks: AtomicUsize,
        max_active_chunks: AtomicUsize,
        rejected: AtomicUsize,
    }

    impl ConcurrencyObserver {
        fn new() -> Self {
            Self {
                active_chunks: AtomicUsize::new(0),
                max_active_chunks: AtomicUsize::new(0),
                rejected: AtomicUsize::new(0),
            }
        }
    }

    impl ExecutionObserver for ConcurrencyObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::ChunkStarted { .. } => {
                    let now = self.active_chunks.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_active_chunks.fetch_max(now, Ordering::SeqCst);
                }
                ExecutionEvent::ChunkFinished { .. } => {
                    let _ = self.active_chunks.fetch_sub(1, Ordering::SeqCst);
                }
                ExecutionEvent::RecordRejected { .. } => {
                    let _ = self.rejected.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn max_in_flight_chunks_throttles_chunk_concurrency() {
        let records = records_of_n(100);
        let observer = Arc::new(ConcurrencyObserver::new());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = engine(4, 1, 1).with_observer(obs_trait);

        let spec = TransformationSpec::new().leaf("id", |v: &Value| {
            // Make each chunk take long enough to overlap if not throttled.
            std::thread::sleep(Duration::from_millis(1));
            v.clone()
        });
        let out = engine.evolve_parallel(&spec, &records);

        assert_eq!(out.len(), records.len());
        assert_eq!(observer.max_active_chunks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn metrics_are_available_after_run() {
        let records = records_of_n(60);
        let engine = engine(4, 1, 1);
        let metrics = engine.metrics();

        let spec = TransformationSpec::new().leaf("id", |v: &Value| {
            std::thread::sleep(Duration::from_millis(2));
            v.clone()
        });
        let out = engine.evolve_parallel(&spec, &records);

        assert_eq!(out.len(), records.len());

        let snap = metrics.snapshot();
        assert_eq!(snap.run_id, 1);
        assert_eq!(snap.records_processed, records.len() as u64);
        assert_eq!(snap.records_rejected, 0);
        assert_eq!(snap.chunks, records.len() as u64);
        assert_eq!(snap.max_active_chunks, 1);
        assert!(snap.throttle_wait > Duration::ZERO);
        assert!(snap.elapsed.is_some());
    }

    #[test]
    fn try_evolve_parallel_reports_lowest_failing_record() {
        let mut records = records_of_n(40);
        records[12] = Value::map(Map::from([("id", Value::from(12)), ("user", Value::from(1))]));
        records[30] = Value::map(Map::from([("id", Value::from(30)), ("user", Value::Null)]));

        let observer = Arc::new(ConcurrencyObserver::new());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = engine(4, 5, 4).with_observer(obs_trait);
        let spec = TransformationSpec::new().nested("user", TransformationSpec::new());

        let err = engine
            .try_evolve_parallel(&spec, &records, &EvolveOptions::strict())
            .unwrap_err();

        match err {
            EvolveError::InvalidArgument { path, .. } => assert_eq!(path, "$[12].user"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(observer.rejected.load(Ordering::SeqCst), 2);
        assert_eq!(engine.metrics().snapshot().records_rejected, 2);
    }

    #[test]
    fn try_evolve_parallel_with_default_options_succeeds() {
        let records = records_of_n(10);
        let spec = TransformationSpec::new().nested("name", TransformationSpec::new());

        let out = engine(2, 3, 2)
            .try_evolve_parallel(&spec, &records, &EvolveOptions::default())
            .unwrap();

        assert_eq!(out.len(), 10);
        assert_eq!(
            out[0].as_map().unwrap().get("name"),
            Some(&Value::map(Map::new()))
        );
    }

    #[test]
    #[should_panic(expected = "chunk_size must be > 0")]
    fn zero_chunk_size_panics() {
        let _ = engine(1, 0, 1);
    }
}
