//! Process-wide shutdown signal.
//!
//! A single atomic flag is the only cross-thread signal in the system
//! (design note "Global state → context"). `request_shutdown` is safe to
//! call from a signal handler: no allocation, no locking.

use std::sync::atomic::{AtomicBool, Ordering};

static EXIT_FLAG: AtomicBool = AtomicBool::new(false);

/// Request that every long-lived thread unwind. Idempotent.
pub fn request_shutdown() {
    EXIT_FLAG.store(true, Ordering::SeqCst);
}

/// Observe whether shutdown has been requested.
pub fn should_shutdown() -> bool {
    EXIT_FLAG.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test_helper::with_lock;

    mod serial_test_helper {
        use std::sync::Mutex;
        static LOCK: Mutex<()> = Mutex::new(());
        pub fn with_lock<F: FnOnce()>(f: F) {
            let _guard = LOCK.lock().unwrap();
            f();
        }
    }

    #[test]
    fn shutdown_is_idempotent_and_observable() {
        with_lock(|| {
            EXIT_FLAG.store(false, Ordering::SeqCst);
            assert!(!should_shutdown());
            request_shutdown();
            request_shutdown();
            assert!(should_shutdown());
            EXIT_FLAG.store(false, Ordering::SeqCst);
        });
    }
}
