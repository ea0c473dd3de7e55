//! Frame scheduler pumped by the harness.

use fieldview_env::FrameScheduler;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Records frame requests instead of acting on them.
///
/// The harness calls [`take_frame`](Self::take_frame) in a loop and delivers
/// a frame to the engine each time it returns true.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    active: AtomicBool,
    pending: AtomicBool,
    requested: AtomicU64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the pending request, if any.
    pub fn take_frame(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    /// Total requests accepted while active.
    pub fn requested(&self) -> u64 {
        self.requested.load(Ordering::SeqCst)
    }
}

impl FrameScheduler for ManualScheduler {
    fn start(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.pending.store(false, Ordering::SeqCst);
    }

    fn request_frame(&self) {
        if !self.is_active() {
            return;
        }
        self.pending.store(true, Ordering::SeqCst);
        self.requested.fetch_add(1, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_ignored_while_stopped() {
        let scheduler = ManualScheduler::new();
        scheduler.request_frame();
        assert!(!scheduler.take_frame());

        scheduler.start();
        scheduler.request_frame();
        scheduler.request_frame();
        assert!(scheduler.take_frame());
        // Requests do not pile up
        assert!(!scheduler.take_frame());
        assert_eq!(scheduler.requested(), 2);

        scheduler.request_frame();
        scheduler.stop();
        assert!(!scheduler.take_frame());
    }
}
