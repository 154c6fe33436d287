//! SM watchdog: periodic `tick()` calls mutually excluded against event
//! delivery by a non-blocking CAS, so at most one of watchdog/decoder
//! thread touches SM state at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Non-blocking mutual-exclusion lock: `try_enter` never blocks, returning
/// `None` if the lock is already held. Guards `Trunk-SM` state between the
/// decoder thread (event delivery) and the watchdog thread (`tick`).
#[derive(Default)]
pub struct CasLock {
    held: AtomicBool,
}

pub struct CasGuard<'a> {
    held: &'a AtomicBool,
}

impl Drop for CasGuard<'_> {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

impl CasLock {
    pub fn new() -> Self {
        Self { held: AtomicBool::new(false) }
    }

    /// Attempt to acquire the lock. Returns `None` without blocking if
    /// another caller already holds it.
    pub fn try_enter(&self) -> Option<CasGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| CasGuard { held: &self.held })
    }
}

/// Runs `on_tick` every `period` until `stop_flag` is set, skipping a tick
/// if the CAS lock is already held by a concurrent event-delivery call.
pub struct Watchdog {
    period: Duration,
    stop_flag: Arc<AtomicBool>,
    lock: Arc<CasLock>,
}

impl Watchdog {
    pub fn new(period_ms: u64, stop_flag: Arc<AtomicBool>, lock: Arc<CasLock>) -> Self {
        Self { period: Duration::from_millis(period_ms.clamp(20, 2000)), stop_flag, lock }
    }

    pub fn run(&self, mut on_tick: impl FnMut()) {
        while !self.stop_flag.load(Ordering::SeqCst) {
            std::thread::sleep(self.period);
            if self.stop_flag.load(Ordering::SeqCst) {
                break;
            }
            if let Some(_guard) = self.lock.try_enter() {
                on_tick();
            }
        }
    }
}
