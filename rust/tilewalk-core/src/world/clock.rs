use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Time source and the single polling primitive every bounded wait goes through.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;

    /// Sleeps a uniformly jittered duration in `[min_ms, max_ms]`.
    fn sleep(&self, min_ms: u64, max_ms: u64);

    fn wait_until(&self, predicate: &mut dyn FnMut() -> bool, timeout_ms: u64) -> bool {
        self.wait_until_every(predicate, DEFAULT_POLL_INTERVAL_MS, timeout_ms)
    }

    /// Polls `predicate` every ~`interval_ms` until it holds or `timeout_ms` elapses.
    /// The predicate is evaluated once before any sleep and once more at the deadline.
    fn wait_until_every(&self, predicate: &mut dyn FnMut() -> bool, interval_ms: u64, timeout_ms: u64) -> bool {
        let deadline = self.now_ms().saturating_add(timeout_ms);
        loop {
            if predicate() {
                return true;
            }
            if self.now_ms() >= deadline {
                return false;
            }
            let interval = interval_ms.max(1);
            self.sleep(interval, interval + interval / 4);
        }
    }
}

/// Wall clock backed by `thread::sleep`.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn sleep(&self, min_ms: u64, max_ms: u64) {
        let ms = if max_ms > min_ms { rand::thread_rng().gen_range(min_ms..=max_ms) } else { min_ms };
        thread::sleep(Duration::from_millis(ms));
    }
}
