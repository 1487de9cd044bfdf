//! Parallel batch formatting with memory-aware admission control.
//!
//! Each in-flight file runs its own pipeline on a worker; admission is
//! gated by the permit pool in `javelin-memory`, so many small files run
//! concurrently while huge ones wait. Failures are isolated per file: a
//! missing or unreadable file never aborts the batch under the default
//! strategy.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use javelin_config::FormatConfig;
use javelin_memory::{MemoryReservationManager, PERMIT_UNIT_BYTES};
use javelin_rules::{RuleEngine, RuleRegistry};
use parking_lot::Mutex;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

mod pipeline;
mod recovery;

pub use pipeline::{PipelineResult, StageError};
pub use recovery::{run_stage, RecoveryPolicy};

/// Estimated peak memory per file, used to derive default concurrency.
const ESTIMATED_PER_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Invoked exactly once per file on completion, serialized across workers.
pub type ProgressCallback = dyn Fn(usize, usize, &std::path::Path) + Send + Sync;

/// How the batch reacts to per-file failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorStrategy {
    /// Failures never stop other files.
    Continue,
    /// In-flight files finish, but nothing new starts after the first
    /// failure.
    FailFast,
    /// As `FailFast`, once the failure rate crosses the threshold.
    AbortAfterThreshold { failure_rate: f64 },
}

impl Default for ErrorStrategy {
    fn default() -> Self {
        ErrorStrategy::Continue
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Worker cap; `None` derives it from available memory.
    pub max_concurrency: Option<usize>,
    pub error_strategy: ErrorStrategy,
    /// Recovery policy applied to the read and write stages.
    pub io_recovery: RecoveryPolicy,
    pub io_timeout: Duration,
    /// Apply auto fixes and write results back to disk.
    pub write: bool,
    pub cancel: CancellationToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            error_strategy: ErrorStrategy::default(),
            io_recovery: RecoveryPolicy::default(),
            io_timeout: Duration::from_secs(30),
            write: false,
            cancel: CancellationToken::new(),
        }
    }
}

/// Aggregate outcome of a batch run.
///
/// `success_count + failure_count == total` and `results.len() == total`
/// always hold; result order is unspecified.
#[derive(Debug)]
pub struct BatchResult {
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<PipelineResult>,
    pub errors: BTreeMap<PathBuf, String>,
    pub duration: Duration,
    /// Files per second over the whole batch.
    pub throughput: f64,
}

pub struct BatchProcessor {
    config: Arc<FormatConfig>,
    engine: RuleEngine,
    memory: MemoryReservationManager,
    options: BatchOptions,
}

impl BatchProcessor {
    pub fn new(config: Arc<FormatConfig>, options: BatchOptions) -> Self {
        let memory = match config.memory.total_bytes {
            Some(total) => MemoryReservationManager::new(total.0 / PERMIT_UNIT_BYTES),
            None => MemoryReservationManager::from_available_memory(),
        };
        Self {
            config,
            engine: RuleEngine::new(RuleRegistry::shared()),
            memory,
            options,
        }
    }

    pub fn with_registry(
        config: Arc<FormatConfig>,
        registry: Arc<RuleRegistry>,
        options: BatchOptions,
    ) -> Self {
        let mut processor = Self::new(config, options);
        processor.engine = RuleEngine::new(registry);
        processor
    }

    fn max_concurrency(&self) -> usize {
        if let Some(explicit) = self.options.max_concurrency {
            return explicit.max(1);
        }
        let by_memory =
            (self.memory.total_permits() * PERMIT_UNIT_BYTES / ESTIMATED_PER_FILE_BYTES).max(1);
        let by_cpu = std::thread::available_parallelism()
            .map(|n| n.get() * 2)
            .unwrap_or(8);
        (by_memory as usize).clamp(1, by_cpu)
    }

    /// Process every path, one pipeline per file, and fold the outcomes
    /// into a [`BatchResult`].
    pub fn process(
        &self,
        files: &[PathBuf],
        progress: Option<&ProgressCallback>,
    ) -> BatchResult {
        let started = Instant::now();
        let total = files.len();
        let workers = self.max_concurrency();
        tracing::debug!(total, workers, "starting batch");

        let stop = AtomicBool::new(false);
        let failures = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let progress_lock = Mutex::new(());

        let settings = pipeline::PipelineSettings {
            config: &self.config,
            engine: &self.engine,
            memory: &self.memory,
            io_recovery: &self.options.io_recovery,
            io_timeout: self.options.io_timeout,
            write: self.options.write,
        };

        let run_one = |path: &PathBuf| -> PipelineResult {
            let result = if self.options.cancel.is_cancelled() {
                PipelineResult::failed(path, StageError::Cancelled, Instant::now())
            } else if stop.load(Ordering::Acquire) {
                PipelineResult::failed(path, StageError::Aborted, Instant::now())
            } else {
                pipeline::run_file(&settings, path, &self.options.cancel)
            };

            if !result.success {
                let failed_so_far = failures.fetch_add(1, Ordering::AcqRel) + 1;
                match &self.options.error_strategy {
                    ErrorStrategy::Continue => {}
                    ErrorStrategy::FailFast => stop.store(true, Ordering::Release),
                    ErrorStrategy::AbortAfterThreshold { failure_rate } => {
                        if total > 0 && (failed_so_far as f64 / total as f64) >= *failure_rate {
                            stop.store(true, Ordering::Release);
                        }
                    }
                }
            }

            if let Some(callback) = progress {
                // Serialize callbacks: at most one at a time, with a
                // monotonic completion count.
                let _guard = progress_lock.lock();
                let done = completed.fetch_add(1, Ordering::AcqRel) + 1;
                callback(done, total, &result.path);
            } else {
                completed.fetch_add(1, Ordering::AcqRel);
            }

            result
        };

        let results: Vec<PipelineResult> = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("javelin-worker-{i}"))
            .build()
        {
            Ok(pool) => pool.install(|| files.par_iter().map(|path| run_one(path)).collect()),
            Err(error) => {
                tracing::warn!(%error, "dedicated worker pool unavailable; using the global pool");
                files.par_iter().map(|path| run_one(path)).collect()
            }
        };

        let mut errors = BTreeMap::new();
        let mut success_count = 0;
        for result in &results {
            if result.success {
                success_count += 1;
            } else if let Some(error) = &result.stage_error {
                errors.insert(result.path.clone(), error.to_string());
            }
        }
        let failure_count = results.len() - success_count;

        let duration = started.elapsed();
        let throughput = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        tracing::debug!(success_count, failure_count, "batch finished");
        BatchResult {
            total,
            success_count,
            failure_count,
            results,
            errors,
            duration,
            throughput,
        }
    }
}
