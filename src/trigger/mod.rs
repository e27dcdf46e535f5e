//! Debounced edge trigger shared between an asynchronous edge source and
//! the main loop.
//!
//! The edge side (`on_edge`) only touches two atomics and never blocks, so
//! it is safe to call from a signal handler task, an input thread, or any
//! other context that races the main loop. The main loop is the single
//! consumer and clears the flag with an atomic swap.

mod host;

pub use host::spawn_edge_sources;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Marks "no edge accepted yet"
const NEVER: u64 = u64::MAX;

#[derive(Debug)]
pub struct TriggerSource {
    pending: AtomicBool,
    last_accepted_ms: AtomicU64,
    debounce_ms: u64,
    epoch: Instant,
}

impl TriggerSource {
    pub fn new(debounce: Duration) -> Self {
        Self {
            pending: AtomicBool::new(false),
            last_accepted_ms: AtomicU64::new(NEVER),
            debounce_ms: debounce.as_millis() as u64,
            epoch: Instant::now(),
        }
    }

    /// Record a falling edge at the current monotonic time.
    ///
    /// Returns whether the edge was accepted.
    pub fn on_edge(&self) -> bool {
        let now_ms = self.epoch.elapsed().as_millis() as u64;
        self.on_edge_at(now_ms)
    }

    /// Record an edge at `now_ms` milliseconds on this source's clock.
    ///
    /// An edge is accepted when strictly more than the debounce window has
    /// passed since the last accepted one.
    pub fn on_edge_at(&self, now_ms: u64) -> bool {
        let mut last = self.last_accepted_ms.load(Ordering::Acquire);
        loop {
            if last != NEVER && now_ms.saturating_sub(last) <= self.debounce_ms {
                debug!(elapsed_ms = now_ms.saturating_sub(last), "edge debounced");
                return false;
            }

            // Concurrent producers race on the timestamp; one claim wins
            match self.last_accepted_ms.compare_exchange_weak(
                last,
                now_ms,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(current) => last = current,
            }
        }

        self.pending.store(true, Ordering::Release);
        debug!(at_ms = now_ms, "edge accepted");
        true
    }

    /// Read and clear the pending flag in one step.
    pub fn consume_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
