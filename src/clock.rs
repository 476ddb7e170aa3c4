//! # Time Source
//!
//! Every timer in the link (stale lines, boot announcement, status period,
//! injection recency, playback pacing) reads "now" through [`Clock`] so the
//! whole core can be driven deterministically in tests.
//!
//! Time is a plain `u64` of milliseconds since boot, matching the
//! `timestamp` field on every outbound message.

use std::time::{Duration, Instant};

/// Monotonic millisecond clock plus a way to pause the current thread.
///
/// ## Rust Concepts:
/// - **Send + Sync**: the clock is shared (via `Arc`) with the injection
///   buffer, which may be fed from a capture thread
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since boot.
    fn now_ms(&self) -> u64;

    /// Block the current thread for `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);
}

/// Wall-clock implementation anchored at construction time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    boot: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { boot: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.boot.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }
}
