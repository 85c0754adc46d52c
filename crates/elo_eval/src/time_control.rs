//! Deadlines for engine replies and the run-wide cancellation flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Time allowed for one engine reply.
///
/// The engine is asked to think for `movetime`; the reply may arrive up to
/// `grace` later before the engine is considered stalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveBudget {
    pub movetime: Duration,
    pub grace: Duration,
}

impl MoveBudget {
    pub fn new(movetime: Duration, grace: Duration) -> Self {
        Self { movetime, grace }
    }

    /// Milliseconds sent with `go movetime`.
    pub fn movetime_ms(&self) -> u64 {
        self.movetime.as_millis().min(u64::MAX as u128) as u64
    }

    /// Total wait before giving up on a `bestmove`.
    pub fn limit(&self) -> Duration {
        self.movetime + self.grace
    }

    /// Start the clock for a reply.
    pub fn start(&self) -> Deadline {
        Deadline::after(self.limit())
    }
}

/// A fixed point in time that reads are measured against.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn after(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed())
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// Cooperative cancellation shared between the caller and a running
/// evaluation.
///
/// Cheap to clone; every clone observes the same flag. Runners check it
/// between matches and between games, never in the middle of one.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "time_control_tests.rs"]
mod time_control_tests;
