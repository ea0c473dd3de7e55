//! FieldView Deterministic Simulation Harness
//!
//! Runs the layout engine under a virtual clock and a manual frame
//! scheduler so every run is a pure function of its seed.
//!
//! # Core Principle
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: `SimContext` advances only when the harness says so
//! - **Frames**: `ManualScheduler` records frame requests; the harness
//!   delivers them one by one
//! - **Randomness**: scenario layout and force noise derive from one seed
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   ScenarioRunner                     │
//! │  ┌──────────────┐   frames   ┌──────────────────┐    │
//! │  │ManualScheduler├──────────►│   FieldEngine    │    │
//! │  └──────────────┘            │ store ▸ forces ▸ │    │
//! │  ┌──────────────┐   time     │ integrator ▸     │    │
//! │  │  SimContext  ├──────────►│ bounds ▸ publish │    │
//! │  └──────────────┘            └────────┬─────────┘    │
//! │                                       ▼              │
//! │                          LayoutMetrics / SimExport   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use fieldview_sim::{ScenarioId, ScenarioRunner};
//!
//! let result = ScenarioRunner::new(42, 600).run(ScenarioId::IdentityMesh);
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod exporter;
mod live;
mod runner;
mod scheduler;
pub mod scenarios;

pub use context::SimContext;
pub use error::HarnessError;
pub use exporter::{NodePosition, SimExport, SimFrame};
pub use live::{run_live, LiveOptions, LiveSummary};
#[cfg(feature = "dashboard")]
pub use live::run_dashboard;
pub use runner::{ScenarioResult, ScenarioRunner};
pub use scenarios::{Scenario, ScenarioId};
pub use scheduler::ManualScheduler;
