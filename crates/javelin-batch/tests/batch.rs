use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use javelin_batch::{BatchOptions, BatchProcessor, ErrorStrategy, StageError};
use javelin_config::FormatConfig;
use tokio_util::sync::CancellationToken;

fn write_files(dir: &tempfile::TempDir, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.path().join(format!("File{i}.java"));
            std::fs::write(&path, format!("class File{i} {{}}\n")).unwrap();
            path
        })
        .collect()
}

fn processor(options: BatchOptions) -> BatchProcessor {
    BatchProcessor::new(Arc::new(FormatConfig::default()), options)
}

#[test]
fn missing_file_fails_alone_and_progress_fires_for_every_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = write_files(&dir, 19);
    let missing = dir.path().join("Missing.java");
    files.insert(7, missing.clone());

    let calls = Arc::new(AtomicUsize::new(0));
    let in_callback = Arc::new(AtomicBool::new(false));
    let calls_cb = calls.clone();
    let in_callback_cb = in_callback.clone();
    let callback: &javelin_batch::ProgressCallback = &move |_done, total, _path| {
        assert!(
            !in_callback_cb.swap(true, Ordering::SeqCst),
            "progress callbacks overlapped"
        );
        assert_eq!(total, 20);
        calls_cb.fetch_add(1, Ordering::SeqCst);
        in_callback_cb.store(false, Ordering::SeqCst);
    };

    let result = processor(BatchOptions::default()).process(&files, Some(callback));

    assert_eq!(result.total, 20);
    assert_eq!(result.success_count, 19);
    assert_eq!(result.failure_count, 1);
    assert_eq!(result.results.len(), 20);
    assert!(result.errors.contains_key(&missing));
    assert_eq!(calls.load(Ordering::SeqCst), 20);
}

#[test]
fn counts_always_add_up() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = write_files(&dir, 6);
    files.push(dir.path().join("nope1.java"));
    files.push(dir.path().join("nope2.java"));

    let result = processor(BatchOptions::default()).process(&files, None);
    assert_eq!(result.success_count + result.failure_count, result.total);
    assert_eq!(result.results.len(), result.total);
    assert_eq!(result.failure_count, 2);
    assert!(result.throughput >= 0.0);
}

#[test]
fn fail_fast_stops_admitting_new_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = vec![dir.path().join("Missing.java")];
    files.extend(write_files(&dir, 24));

    let options = BatchOptions {
        max_concurrency: Some(1),
        error_strategy: ErrorStrategy::FailFast,
        ..BatchOptions::default()
    };
    let result = processor(options).process(&files, None);

    assert_eq!(result.total, 25);
    assert_eq!(result.success_count + result.failure_count, 25);
    assert!(result.failure_count >= 1);
    // Everything after the first failure is reported as aborted, keeping
    // the count invariants intact.
    assert!(result
        .results
        .iter()
        .any(|r| matches!(r.stage_error, Some(StageError::Aborted))));
}

#[test]
fn abort_after_threshold_triggers_once_the_rate_is_crossed() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = Vec::new();
    for i in 0..10 {
        files.push(dir.path().join(format!("missing{i}.java")));
    }
    files.extend(write_files(&dir, 10));

    let options = BatchOptions {
        max_concurrency: Some(1),
        error_strategy: ErrorStrategy::AbortAfterThreshold { failure_rate: 0.3 },
        ..BatchOptions::default()
    };
    let result = processor(options).process(&files, None);

    assert_eq!(result.success_count + result.failure_count, result.total);
    assert!(
        result.failure_count >= 6,
        "threshold abort should fail the tail, got {}",
        result.failure_count
    );
}

#[test]
fn cancellation_still_produces_a_complete_result() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_files(&dir, 8);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let options = BatchOptions {
        cancel,
        ..BatchOptions::default()
    };

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_cb = calls.clone();
    let callback: &javelin_batch::ProgressCallback = &move |_done, _total, _path| {
        calls_cb.fetch_add(1, Ordering::SeqCst);
    };
    let result = processor(options).process(&files, Some(callback));

    assert_eq!(result.total, 8);
    assert_eq!(result.failure_count, 8);
    assert_eq!(calls.load(Ordering::SeqCst), 8);
    assert!(result
        .results
        .iter()
        .all(|r| matches!(r.stage_error, Some(StageError::Cancelled))));
}

#[test]
fn write_mode_applies_fixes_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Dirty.java");
    std::fs::write(&path, "class Dirty {   \n}").unwrap();

    let options = BatchOptions {
        write: true,
        ..BatchOptions::default()
    };
    let processor = processor(options);

    let first = processor.process(&[path.clone()], None);
    assert_eq!(first.success_count, 1);
    let after_first = std::fs::read_to_string(&path).unwrap();
    assert!(!after_first.contains("{   "));
    assert!(after_first.ends_with('\n'));

    let second = processor.process(&[path.clone()], None);
    assert_eq!(second.success_count, 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
    // Nothing changed, so nothing was rewritten the second time.
    assert!(second.results[0].rewritten.is_none());
}

#[test]
fn violations_are_reported_in_check_mode_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Check.java");
    let original = "class Check {   \n}";
    std::fs::write(&path, original).unwrap();

    let result = processor(BatchOptions::default()).process(&[path.clone()], None);
    assert_eq!(result.success_count, 1);
    assert!(!result.results[0].violations.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn tiny_permit_pool_still_completes_large_batches() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_files(&dir, 32);

    let config = FormatConfig::from_toml_str("[memory]\ntotal_bytes = \"2MiB\"\n").unwrap();
    let options = BatchOptions {
        max_concurrency: Some(8),
        io_timeout: Duration::from_secs(5),
        ..BatchOptions::default()
    };
    let result = BatchProcessor::new(Arc::new(config), options).process(&files, None);

    assert_eq!(result.success_count, 32);
    assert_eq!(result.failure_count, 0);
}
