//! Memory-aware admission control for batch formatting.
//!
//! The batch processor reserves permits proportional to each file's size
//! before running its pipeline, so many small files can be in flight at once
//! while a huge file waits for (at most) the whole pool. One permit stands
//! for 1 MiB of estimated peak memory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

mod byte_size;

pub use byte_size::{parse_byte_size, ParseByteSizeError};

/// Bytes of estimated memory represented by a single permit.
pub const PERMIT_UNIT_BYTES: u64 = 1024 * 1024;

/// Estimated peak memory per byte of source processed.
pub const MEMORY_MULTIPLIER: u64 = 5;

/// How often a blocked `reserve` re-checks its cancellation token.
const RESERVE_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReserveError {
    #[error("memory reservation cancelled while waiting for permits")]
    Cancelled,
}

struct Pool {
    available: Mutex<u64>,
    released: Condvar,
    total: u64,
}

/// A counting semaphore over 1 MiB memory permits.
///
/// Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct MemoryReservationManager {
    pool: Arc<Pool>,
}

impl MemoryReservationManager {
    /// A pool with `total_permits` units; zero is bumped to one.
    pub fn new(total_permits: u64) -> Self {
        let total = total_permits.max(1);
        Self {
            pool: Arc::new(Pool {
                available: Mutex::new(total),
                released: Condvar::new(),
                total,
            }),
        }
    }

    /// Size the pool from the memory currently available on the host.
    pub fn from_available_memory() -> Self {
        Self::new(available_memory_bytes() / PERMIT_UNIT_BYTES)
    }

    #[inline]
    pub fn total_permits(&self) -> u64 {
        self.pool.total
    }

    pub fn available_permits(&self) -> u64 {
        *self.pool.available.lock()
    }

    /// Permits needed for a file of `file_size` bytes: at least one, and
    /// `ceil(file_size * MEMORY_MULTIPLIER / PERMIT_UNIT_BYTES)` otherwise.
    pub fn permits_for(file_size: u64) -> u64 {
        let estimated = file_size.saturating_mul(MEMORY_MULTIPLIER);
        estimated.div_ceil(PERMIT_UNIT_BYTES).max(1)
    }

    /// Block until permits for `file_size` bytes are available.
    ///
    /// Requests larger than the whole pool are clamped to it, so an
    /// oversized file eventually runs alone instead of deadlocking.
    pub fn reserve(&self, file_size: u64) -> Result<Reservation, ReserveError> {
        self.reserve_with_token(file_size, &CancellationToken::new())
    }

    /// As [`reserve`](Self::reserve), but gives up with
    /// [`ReserveError::Cancelled`] once `cancel` fires. No permits are held
    /// on the error path.
    pub fn reserve_with_token(
        &self,
        file_size: u64,
        cancel: &CancellationToken,
    ) -> Result<Reservation, ReserveError> {
        let permits = Self::permits_for(file_size).min(self.pool.total);

        let mut available = self.pool.available.lock();
        loop {
            if cancel.is_cancelled() {
                return Err(ReserveError::Cancelled);
            }
            if *available >= permits {
                *available -= permits;
                return Ok(Reservation::new(self.pool.clone(), permits));
            }
            tracing::trace!(
                requested = permits,
                available = *available,
                total = self.pool.total,
                "waiting for memory permits"
            );
            self.pool
                .released
                .wait_for(&mut available, RESERVE_POLL_INTERVAL);
        }
    }

    /// Non-blocking variant; `None` when the pool cannot satisfy the
    /// request right now.
    pub fn try_reserve(&self, file_size: u64) -> Option<Reservation> {
        let permits = Self::permits_for(file_size).min(self.pool.total);
        let mut available = self.pool.available.lock();
        if *available >= permits {
            *available -= permits;
            Some(Reservation::new(self.pool.clone(), permits))
        } else {
            None
        }
    }
}

impl std::fmt::Debug for MemoryReservationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryReservationManager")
            .field("total_permits", &self.pool.total)
            .field("available_permits", &self.available_permits())
            .finish()
    }
}

/// A held slice of the permit pool, returned on `close` or drop.
pub struct Reservation {
    pool: Arc<Pool>,
    permits: u64,
    closed: AtomicBool,
}

impl Reservation {
    fn new(pool: Arc<Pool>, permits: u64) -> Self {
        Self {
            pool,
            permits,
            closed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn permits(&self) -> u64 {
        self.permits
    }

    /// Return the permits to the pool. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut available = self.pool.available.lock();
        *available = (*available + self.permits).min(self.pool.total);
        drop(available);
        self.pool.released.notify_all();
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("permits", &self.permits)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

/// Memory currently available on the host, in bytes.
pub fn available_memory_bytes() -> u64 {
    use sysinfo::System;

    let mut system = System::new();
    system.refresh_memory();
    let available = system.available_memory();
    if available > 0 {
        available
    } else {
        // Some containerized environments report zero; fall back to a
        // conservative 1 GiB budget.
        1024 * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn permit_math() {
        assert_eq!(MemoryReservationManager::permits_for(0), 1);
        assert_eq!(MemoryReservationManager::permits_for(1), 1);
        // 1 MiB of source -> 5 MiB estimated -> 5 permits.
        assert_eq!(MemoryReservationManager::permits_for(PERMIT_UNIT_BYTES), 5);
        // One byte over a permit boundary rounds up.
        assert_eq!(
            MemoryReservationManager::permits_for(PERMIT_UNIT_BYTES / 5 + 1),
            2
        );
    }

    #[test]
    fn close_is_idempotent() {
        let manager = MemoryReservationManager::new(4);
        let reservation = manager.reserve(0).unwrap();
        assert_eq!(manager.available_permits(), 3);
        reservation.close();
        reservation.close();
        assert_eq!(manager.available_permits(), 4);
        drop(reservation);
        assert_eq!(manager.available_permits(), 4);
    }

    #[test]
    fn oversized_request_is_clamped_to_pool() {
        let manager = MemoryReservationManager::new(2);
        let reservation = manager.reserve(u64::MAX / MEMORY_MULTIPLIER).unwrap();
        assert_eq!(reservation.permits(), 2);
        assert_eq!(manager.available_permits(), 0);
    }

    #[test]
    fn reserve_blocks_until_release() {
        let manager = MemoryReservationManager::new(1);
        let first = manager.reserve(0).unwrap();

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let manager = manager.clone();
            thread::spawn(move || {
                let second = manager.reserve(0).unwrap();
                tx.send(()).unwrap();
                drop(second);
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        drop(first);
        rx.recv_timeout(Duration::from_secs(2))
            .expect("waiter should acquire after release");
        waiter.join().unwrap();
    }

    #[test]
    fn cancelled_waiter_holds_nothing() {
        let manager = MemoryReservationManager::new(1);
        let held = manager.reserve(0).unwrap();

        let token = CancellationToken::new();
        let waiter = {
            let manager = manager.clone();
            let token = token.clone();
            thread::spawn(move || manager.reserve_with_token(0, &token))
        };

        thread::sleep(Duration::from_millis(30));
        token.cancel();
        assert!(matches!(
            waiter.join().unwrap(),
            Err(ReserveError::Cancelled)
        ));

        drop(held);
        assert_eq!(manager.available_permits(), 1);
    }

    #[test]
    fn outstanding_permits_never_exceed_total() {
        let manager = MemoryReservationManager::new(8);
        let mut handles = Vec::new();
        for _ in 0..16 {
            let manager = manager.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..32 {
                    let r = manager.reserve(2 * PERMIT_UNIT_BYTES).unwrap();
                    assert!(manager.available_permits() <= manager.total_permits());
                    drop(r);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(manager.available_permits(), 8);
    }
}
