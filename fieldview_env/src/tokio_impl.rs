//! Production implementations backed by Tokio and OS entropy.

use crate::error::EnvError;
use crate::{FieldContext, FrameScheduler};
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::time::{Interval, MissedTickBehavior};

/// Production context backed by the system clock.
///
/// The master seed is drawn from the OS once at construction and reported
/// through `seed()`, so a surprising live layout can still be replayed in the
/// harness.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,

    /// Master seed for derived generators
    seed: u64,
}

impl TokioContext {
    /// Creates a new TokioContext with an OS-random master seed.
    pub fn new() -> Self {
        Self::with_seed(OsRng.next_u64())
    }

    /// Creates a TokioContext with a caller-chosen master seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            start: Instant::now(),
            seed,
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FieldContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

// =============================================================================
// FRAME SCHEDULER
// =============================================================================

#[derive(Debug, Default)]
struct FrameState {
    active: AtomicBool,
    pending: AtomicBool,
    wake: Notify,
}

/// Frame scheduler that paces callbacks with a tokio interval.
///
/// Clones share state: hand one clone to the simulation loop and keep another
/// to build the `FramePacer` the host awaits on.
#[derive(Debug, Clone)]
pub struct TokioFrameScheduler {
    state: Arc<FrameState>,
    period: Duration,
}

impl TokioFrameScheduler {
    /// Creates a scheduler delivering at most `fps` frames per second.
    pub fn new(fps: u32) -> Result<Self, EnvError> {
        if fps == 0 {
            return Err(EnvError::InvalidFrameRate(fps));
        }
        Ok(Self {
            state: Arc::new(FrameState::default()),
            period: Duration::from_secs(1) / fps,
        })
    }

    /// Returns the frame period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Creates the host-side pacer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn frame_pacer(&self) -> FramePacer {
        let mut interval = tokio::time::interval(self.period);
        // A late frame runs late; it never triggers a burst of catch-up frames.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        FramePacer {
            state: Arc::clone(&self.state),
            interval,
        }
    }
}

impl FrameScheduler for TokioFrameScheduler {
    fn start(&self) {
        self.state.active.store(true, Ordering::Release);
    }

    fn stop(&self) {
        self.state.active.store(false, Ordering::Release);
        self.state.pending.store(false, Ordering::Release);
    }

    fn request_frame(&self) {
        if !self.state.active.load(Ordering::Acquire) {
            return;
        }
        self.state.pending.store(true, Ordering::Release);
        self.state.wake.notify_one();
    }

    fn is_active(&self) -> bool {
        self.state.active.load(Ordering::Acquire)
    }
}

/// Host-side half of `TokioFrameScheduler`.
pub struct FramePacer {
    state: Arc<FrameState>,
    interval: Interval,
}

impl FramePacer {
    /// Waits until a frame has been requested and the next period boundary
    /// has passed.
    ///
    /// While the scheduler is stopped this simply keeps waiting; there is no
    /// busy polling.
    pub async fn next_frame(&mut self) {
        loop {
            if self.state.pending.swap(false, Ordering::AcqRel) {
                self.interval.tick().await;
                return;
            }
            self.state.wake.notified().await;
        }
    }
}
