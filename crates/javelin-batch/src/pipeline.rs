//! The per-file pipeline: read -> parse -> lint -> rewrite -> write.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use javelin_config::FormatConfig;
use javelin_core::SourceText;
use javelin_memory::{MemoryReservationManager, ReserveError};
use javelin_rewrite::{rewrite, RewriteError};
use javelin_rules::{RuleEngine, Violation};
use javelin_syntax::{parse_with, JavaVersion, ParseResult};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::recovery::{run_stage, RecoveryPolicy};

/// Why a file did not make it through the pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StageError {
    #[error("{stage}: {message}")]
    Io {
        stage: &'static str,
        message: String,
    },
    #[error("{stage}: timed out")]
    IoTimeout { stage: &'static str },
    #[error("memory reservation failed: {0}")]
    Memory(ReserveError),
    #[error("parse failed: {first}")]
    Parse { errors: usize, first: String },
    #[error("conflicting fixes: {0}")]
    FixConflict(String),
    #[error("cancelled")]
    Cancelled,
    #[error("aborted before start")]
    Aborted,
}

impl StageError {
    /// Whether the error marks the file as failed. A fix conflict leaves
    /// the file linted but unrewritten, which is still a success.
    pub fn is_failure(&self) -> bool {
        !matches!(self, StageError::FixConflict(_))
    }
}

/// Outcome of one file's pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub path: PathBuf,
    pub success: bool,
    pub violations: Vec<Violation>,
    pub rewritten: Option<String>,
    pub stage_error: Option<StageError>,
    pub duration: Duration,
}

impl PipelineResult {
    pub(crate) fn failed(path: &Path, error: StageError, started: Instant) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            violations: Vec::new(),
            rewritten: None,
            stage_error: Some(error),
            duration: started.elapsed(),
        }
    }
}

pub(crate) struct PipelineSettings<'a> {
    pub config: &'a FormatConfig,
    pub engine: &'a RuleEngine,
    pub memory: &'a MemoryReservationManager,
    pub io_recovery: &'a RecoveryPolicy,
    pub io_timeout: Duration,
    /// Apply auto fixes and write the result back to disk.
    pub write: bool,
}

/// Run one file through the full pipeline under a memory reservation.
pub(crate) fn run_file(
    settings: &PipelineSettings<'_>,
    path: &Path,
    cancel: &CancellationToken,
) -> PipelineResult {
    let started = Instant::now();
    let _span = tracing::debug_span!("pipeline", path = %path.display()).entered();

    // Admission: permits proportional to on-disk size.
    let file_size = match std::fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(error) => {
            return PipelineResult::failed(
                path,
                StageError::Io {
                    stage: "stat",
                    message: error.to_string(),
                },
                started,
            );
        }
    };
    let _reservation = match settings.memory.reserve_with_token(file_size, cancel) {
        Ok(reservation) => reservation,
        Err(error) => {
            let stage_error = if cancel.is_cancelled() {
                StageError::Cancelled
            } else {
                StageError::Memory(error)
            };
            return PipelineResult::failed(path, stage_error, started);
        }
    };

    // Read.
    let source = {
        let owned = path.to_path_buf();
        let timeout = settings.io_timeout;
        match run_stage(
            settings.io_recovery,
            "read",
            move || read_with_timeout(&owned, timeout),
            || None,
        ) {
            Ok(source) => source,
            Err(error) => return PipelineResult::failed(path, error, started),
        }
    };

    // Parse. Recoverable errors still yield a lintable arena.
    let version = JavaVersion::from_feature(settings.config.java_version)
        .unwrap_or(JavaVersion::LATEST);
    let arena = match parse_with(&source, version, javelin_syntax::default_registry()) {
        ParseResult::Success { arena, errors } => {
            if !errors.is_empty() {
                tracing::debug!(
                    path = %path.display(),
                    count = errors.len(),
                    "parsed with recoverable errors"
                );
            }
            arena
        }
        ParseResult::Failure { errors } => {
            let first = errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "unknown parse failure".to_string());
            return PipelineResult::failed(
                path,
                StageError::Parse {
                    errors: errors.len(),
                    first,
                },
                started,
            );
        }
    };

    // Lint.
    let text = SourceText::new(source.as_str());
    let violations = settings
        .engine
        .lint(&text, &arena, path, settings.config);

    // Rewrite and write back.
    let mut rewritten = None;
    let mut stage_error = None;
    if settings.write {
        match rewrite(&source, &violations, settings.config) {
            Ok(outcome) if outcome.applied > 0 && outcome.text != source => {
                let owned = path.to_path_buf();
                let timeout = settings.io_timeout;
                let contents = outcome.text.clone();
                let write_result = run_stage(
                    settings.io_recovery,
                    "write",
                    move || write_with_timeout(&owned, &contents, timeout),
                    || None,
                );
                if let Err(error) = write_result {
                    return PipelineResult::failed(path, error, started);
                }
                rewritten = Some(outcome.text);
            }
            Ok(_) => {}
            Err(RewriteError::Conflict { .. }) => {
                // Linted but not rewritten.
                stage_error = Some(StageError::FixConflict(
                    "overlapping fixes; file left unchanged".to_string(),
                ));
            }
            Err(RewriteError::Apply(error)) => {
                return PipelineResult::failed(
                    path,
                    StageError::Io {
                        stage: "rewrite",
                        message: error.to_string(),
                    },
                    started,
                );
            }
        }
    }

    PipelineResult {
        path: path.to_path_buf(),
        success: true,
        violations,
        rewritten,
        stage_error,
        duration: started.elapsed(),
    }
}

/// Run a blocking I/O closure with a deadline. The operation runs on a
/// detached scratch thread; on timeout the thread is left to finish in the
/// background and its eventual result is dropped.
fn io_with_timeout<T: Send + 'static>(
    stage: &'static str,
    timeout: Duration,
    op: impl FnOnce() -> std::io::Result<T> + Send + 'static,
) -> Result<T, StageError> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(op());
    });
    match rx.recv_timeout(timeout) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(StageError::Io {
            stage,
            message: error.to_string(),
        }),
        Err(_) => Err(StageError::IoTimeout { stage }),
    }
}

fn read_with_timeout(path: &Path, timeout: Duration) -> Result<String, StageError> {
    let path = path.to_path_buf();
    io_with_timeout("read", timeout, move || std::fs::read_to_string(path))
}

fn write_with_timeout(path: &Path, contents: &str, timeout: Duration) -> Result<(), StageError> {
    let path = path.to_path_buf();
    let contents = contents.to_string();
    io_with_timeout("write", timeout, move || std::fs::write(path, contents))
}
