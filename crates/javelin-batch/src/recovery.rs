//! Per-stage recovery policies.

use std::time::Duration;

use crate::StageError;

/// What to do when a pipeline stage fails.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryPolicy {
    /// Return the error upward without retry; the file is marked failed.
    SkipFile,
    /// Re-run the stage with a fixed delay between attempts. The operation
    /// must be idempotent.
    Retry { max_attempts: u32, delay: Duration },
    /// Substitute the caller's fallback value and continue.
    Fallback,
    /// Propagate immediately; the retry machinery is never engaged.
    FailFast,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        RecoveryPolicy::SkipFile
    }
}

/// Run `op` under `policy`. `fallback` is consulted only by
/// [`RecoveryPolicy::Fallback`]; a `None` fallback turns into the original
/// error.
pub fn run_stage<T>(
    policy: &RecoveryPolicy,
    stage: &'static str,
    mut op: impl FnMut() -> Result<T, StageError>,
    fallback: impl FnOnce() -> Option<T>,
) -> Result<T, StageError> {
    match policy {
        RecoveryPolicy::FailFast => op(),
        RecoveryPolicy::SkipFile => op().inspect_err(|error| {
            tracing::debug!(stage, %error, "stage failed; skipping file");
        }),
        RecoveryPolicy::Fallback => match op() {
            Ok(value) => Ok(value),
            Err(error) => match fallback() {
                Some(value) => {
                    tracing::debug!(stage, %error, "stage failed; using fallback value");
                    Ok(value)
                }
                None => Err(error),
            },
        },
        RecoveryPolicy::Retry {
            max_attempts,
            delay,
        } => {
            let attempts = (*max_attempts).max(1);
            let mut last = None;
            for attempt in 1..=attempts {
                match op() {
                    Ok(value) => return Ok(value),
                    Err(error) => {
                        tracing::debug!(stage, attempt, %error, "stage attempt failed");
                        last = Some(error);
                        if attempt < attempts {
                            std::thread::sleep(*delay);
                        }
                    }
                }
            }
            Err(last.expect("at least one attempt ran"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flaky(fail_first: u32) -> impl FnMut() -> Result<u32, StageError> {
        let mut calls = 0;
        move || {
            calls += 1;
            if calls <= fail_first {
                Err(StageError::Io {
                    stage: "read",
                    message: format!("transient failure #{calls}"),
                })
            } else {
                Ok(calls)
            }
        }
    }

    #[test]
    fn retry_runs_until_success_within_budget() {
        let policy = RecoveryPolicy::Retry {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        };
        let result = run_stage(&policy, "read", flaky(2), || None);
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn retry_exhaustion_returns_the_last_error() {
        let policy = RecoveryPolicy::Retry {
            max_attempts: 2,
            delay: Duration::from_millis(1),
        };
        let err = run_stage(&policy, "read", flaky(5), || None).unwrap_err();
        assert!(err.to_string().contains("transient failure #2"));
    }

    #[test]
    fn skip_file_makes_exactly_one_attempt() {
        let mut calls = 0;
        let result: Result<(), _> = run_stage(
            &RecoveryPolicy::SkipFile,
            "read",
            || {
                calls += 1;
                Err(StageError::Io {
                    stage: "read",
                    message: "nope".into(),
                })
            },
            || None,
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn fallback_substitutes_a_value() {
        let result = run_stage(&RecoveryPolicy::Fallback, "read", flaky(9), || Some(0));
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn fail_fast_never_retries() {
        let mut calls = 0;
        let result: Result<(), _> = run_stage(
            &RecoveryPolicy::FailFast,
            "read",
            || {
                calls += 1;
                Err(StageError::Cancelled)
            },
            || None,
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
