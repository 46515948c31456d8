//! Monotonic millisecond clocks used for device timestamps and pulse deadlines.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub trait Clock: Send + Sync {
    /// Milliseconds since the clock's origin. Never decreases.
    fn now_ms(&self) -> f64;
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock that only moves when told to. Sessions drive one of these per tick so
/// timestamps and release deadlines are a pure function of the tick count.
#[derive(Debug, Default)]
pub struct ManualClock {
    // f64 bits; only ever written through `advance`/`set`, which keep it monotonic.
    now_bits: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn advance(&self, delta_ms: f64) -> f64 {
        let delta = if delta_ms.is_finite() && delta_ms > 0.0 {
            delta_ms
        } else {
            0.0
        };
        let next = self.now_ms() + delta;
        self.now_bits.store(next.to_bits(), Ordering::Release);
        next
    }

    /// Moves the clock to `now_ms` if that is later than the current reading.
    pub fn set(&self, now_ms: f64) {
        if now_ms.is_finite() && now_ms > self.now_ms() {
            self.now_bits.store(now_ms.to_bits(), Ordering::Release);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.now_bits.load(Ordering::Acquire))
    }
}
