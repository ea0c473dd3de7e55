//! Frame scheduling port.

/// Abstraction over the host's recurring frame callback.
///
/// The simulation loop never calls into a global animation facility. It asks
/// the injected scheduler to start delivering frames, requests the next frame
/// after each completed tick, and stops the scheduler when paused.
///
/// # Implementations
///
/// - **Production**: `TokioFrameScheduler` - paces frames with a tokio interval
/// - **Simulation**: `ManualScheduler` - frames are pumped by the harness
///
/// # Frame Flow
///
/// ```text
/// SimulationLoop             Scheduler                  Host
///   |-- start() ------------->|                          |
///   |-- request_frame() ----->|-- [frame period] ------->|
///   |<------------------------------------ on_frame() ---|
///   |-- request_frame() ----->|                          |
/// ```
///
/// Methods take `&self` so one scheduler can be shared between the loop and
/// the host driving it.
pub trait FrameScheduler: Send + Sync {
    /// Begins delivering frames. Called on the Idle -> Running transition.
    fn start(&self);

    /// Stops delivering frames. Pending requests are dropped.
    fn stop(&self);

    /// Requests one more frame callback.
    ///
    /// Ignored when the scheduler is stopped.
    fn request_frame(&self);

    /// Returns true between `start` and `stop`.
    fn is_active(&self) -> bool;
}
