//! Optional wall-clock accounting for the hot paths.
//!
//! A disabled [`Stopwatch`] runs the timed closure and records nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Accumulates the time spent in closures passed to [`Stopwatch::time`].
#[derive(Debug, Default)]
pub struct Stopwatch {
    enabled: bool,
    nanos: AtomicU64,
}

impl Stopwatch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            nanos: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Run `f`, adding its duration to the total when enabled.
    #[inline]
    pub fn time<T>(&self, f: impl FnOnce() -> T) -> T {
        if !self.enabled {
            return f();
        }
        let start = Instant::now();
        let out = f();
        let elapsed = start.elapsed().as_nanos().min(u64::MAX as u128) as u64;
        self.nanos.fetch_add(elapsed, Ordering::Relaxed);
        out
    }

    /// Total accumulated time.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }

    pub fn reset(&self) {
        self.nanos.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of the accumulated timings of a tiled image, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Timings {
    /// Time spent installing tiles, seen from the facade
    pub update_us: u64,
    /// Time spent mapping points to tiles on misses
    pub find_sub_domain_us: u64,
    /// Time spent in cache reads
    pub read_us: u64,
    /// Time spent inside the cache's update path
    pub update_cache_us: u64,
}

pub(crate) fn micros(d: Duration) -> u64 {
    d.as_micros().min(u64::MAX as u128) as u64
}
