//! FieldView Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" ports that let the FieldView engine run
//! unchanged inside a real host (tokio frame pacing, OS entropy) and inside the
//! deterministic simulation harness (virtual clock, fixed seed).
//!
//! # Core Concept: Injected Ports
//!
//! The engine never reaches for ambient facilities. Everything that would
//! introduce non-determinism or a dependency on a host is passed in:
//! - Time and seeds (`FieldContext`)
//! - Frame scheduling (`FrameScheduler`)
//! - Cross-context snapshot delivery (`handoff`)
//!
//! Deriving all entropy from a single 64-bit seed makes every layout run
//! reproducible from its seed number.
//!
//! # Example
//!
//! ```ignore
//! use fieldview_env::{FrameScheduler, TokioFrameScheduler};
//!
//! let scheduler = TokioFrameScheduler::new(60)?;
//! let mut pacer = scheduler.frame_pacer();
//! loop {
//!     pacer.next_frame().await;
//!     engine.on_frame();
//! }
//! ```

mod context;
mod error;
pub mod handoff;
mod scheduler;
mod tokio_impl;

pub use context::{mix_seed, FieldContext};
pub use error::EnvError;
pub use scheduler::FrameScheduler;
pub use tokio_impl::{FramePacer, TokioContext, TokioFrameScheduler};
