//! Scenario runner - plays scenarios through the engine and checks invariants.
//!
//! Every scenario is played twice from the same seed. Besides the per-tick
//! invariants (finite, in bounds), the two runs must end on bit-identical
//! snapshots.

use crate::context::SimContext;
use crate::error::HarnessError;
use crate::exporter::{SimExport, SimFrame};
use crate::scenarios::ScenarioId;
use crate::scheduler::ManualScheduler;

use fieldview_core::{
    Command, CommandOutcome, EngineConfig, FieldEngine, LayoutMetrics, Snapshot, TickOutcome,
};
use fieldview_env::FieldContext;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final virtual time in seconds
    pub final_time_secs: f64,

    /// Ticks thrown away for non-finite values
    pub discarded_ticks: u64,

    /// Both runs ended on identical snapshots
    pub reproducible: bool,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics of the final snapshot
    pub metrics: LayoutMetrics,
}

/// Everything one playthrough produced.
struct RunTrace {
    snapshot: Arc<Snapshot>,
    metrics: LayoutMetrics,
    discarded: u64,
    final_time_secs: f64,
    failure: Option<String>,
}

/// Runs layout scenarios.
pub struct ScenarioRunner {
    /// Master seed
    seed: u64,

    /// Frames to deliver per run
    ticks: u64,

    /// Virtual time per frame
    frame_period: Duration,

    /// Replaces the scenario's own configuration
    config_override: Option<EngineConfig>,

    /// Capture a frame every N ticks (0 = never)
    export_every: u64,
}

impl ScenarioRunner {
    pub fn new(seed: u64, ticks: u64) -> Self {
        Self {
            seed,
            ticks,
            frame_period: Duration::from_nanos(16_666_667),
            config_override: None,
            export_every: 0,
        }
    }

    /// Sets the virtual frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.frame_period = Duration::from_secs(1) / fps.max(1);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config_override = Some(config);
        self
    }

    pub fn with_export_every(mut self, ticks: u64) -> Self {
        self.export_every = ticks;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_with_export(scenario, None)
    }

    /// Runs a scenario, recording frames of the first playthrough into
    /// `export` when given.
    pub fn run_with_export(&self, scenario: ScenarioId, mut export: Option<&mut SimExport>) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let first = self.play(scenario, export.as_deref_mut());
        let second = self.play(scenario, None);

        let mut result = ScenarioResult {
            scenario,
            seed: self.seed,
            passed: false,
            total_ticks: 0,
            final_time_secs: 0.0,
            discarded_ticks: 0,
            reproducible: false,
            failure_reason: None,
            metrics: LayoutMetrics::default(),
        };

        let (first, second) = match (first, second) {
            (Ok(first), Ok(second)) => (first, second),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Scenario {} aborted: {}", scenario.name(), e);
                result.failure_reason = Some(e.to_string());
                return result;
            }
        };

        result.total_ticks = first.snapshot.tick;
        result.final_time_secs = first.final_time_secs;
        result.discarded_ticks = first.discarded;
        result.reproducible = first.snapshot == second.snapshot;
        result.metrics = first.metrics.clone();

        result.failure_reason = first.failure.or_else(|| {
            if !result.reproducible {
                Some("Runs from the same seed diverged".to_string())
            } else if result.discarded_ticks > 0 {
                Some(format!("{} ticks discarded", result.discarded_ticks))
            } else {
                None
            }
        });
        result.passed = result.failure_reason.is_none();

        if let Some(export) = export {
            export.finalize(result.passed, Some(result.metrics.kinetic_energy));
        }

        if result.passed {
            info!(
                "Scenario {} passed: {} ticks, KE {:.6}, max speed {:.6}",
                scenario.name(),
                result.total_ticks,
                result.metrics.kinetic_energy,
                result.metrics.max_speed
            );
        } else {
            warn!(
                "Scenario {} failed: {}",
                scenario.name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
        }
        result
    }

    fn play(&self, scenario: ScenarioId, mut export: Option<&mut SimExport>) -> Result<RunTrace, HarnessError> {
        let built = scenario.build(self.seed);
        let config = self.config_override.clone().unwrap_or(built.config);
        let bounds = config.bounds;

        let context = SimContext::shared(self.seed);
        let scheduler = Arc::new(ManualScheduler::new());
        let mut engine = FieldEngine::new(Arc::clone(&context), Arc::clone(&scheduler), config)?;

        for spec in built.nodes {
            engine.apply(Command::AddNode(spec))?;
        }
        for spec in built.edges {
            engine.apply(Command::AddEdge(spec))?;
        }
        engine.apply(Command::SetPlaying(true))?;

        let mut discarded = 0;
        let mut failure = None;
        for tick in 0..self.ticks {
            if !scheduler.take_frame() {
                return Err(HarnessError::Stalled(tick));
            }
            context.advance_time(self.frame_period);

            match engine.on_frame() {
                TickOutcome::Published(snapshot) => {
                    let metrics = LayoutMetrics::from_snapshot(&snapshot, &bounds);
                    if failure.is_none() && !metrics.is_healthy() {
                        failure = Some(format!(
                            "Tick {}: {} nodes out of bounds, {} non-finite",
                            snapshot.tick, metrics.bounds_violations, metrics.non_finite
                        ));
                    }

                    if let Some(export) = export.as_deref_mut() {
                        if self.export_every > 0 && snapshot.tick % self.export_every == 0 {
                            let time = context.now().as_secs_f64();
                            let render = engine.render_frame();
                            let events = engine.drain_events();
                            export.add_frame(SimFrame::capture(&snapshot, time, render, events));
                        }
                    }
                }
                TickOutcome::Discarded(discard) => {
                    debug!("Tick {} discarded at node {}", tick + 1, discard.node);
                    discarded += 1;
                }
                TickOutcome::Skipped => return Err(HarnessError::Stalled(tick)),
            }
        }

        engine.apply(Command::SetPlaying(false))?;
        if failure.is_none() {
            failure = check_pick(&mut engine)?;
        }

        let snapshot = engine.snapshot();
        Ok(RunTrace {
            metrics: LayoutMetrics::from_snapshot(&snapshot, &bounds),
            snapshot,
            discarded,
            final_time_secs: context.now().as_secs_f64(),
            failure,
        })
    }
}

/// Clicks on the projected center of the first node and expects a hit.
fn check_pick(engine: &mut FieldEngine<SimContext, ManualScheduler>) -> Result<Option<String>, HarnessError> {
    let snapshot = engine.snapshot();
    let Some(node) = snapshot.nodes.first() else {
        return Ok(None);
    };
    let Some(screen) = engine.projector().project(&node.position) else {
        return Ok(None);
    };

    match engine.apply(Command::PointerClick(screen))? {
        CommandOutcome::Picked(Some(_)) => Ok(None),
        _ => Ok(Some(format!("Click on {} hit nothing", node.id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldview_core::{Bounds, FieldParams};
    use nalgebra::Vector3;

    #[test]
    fn test_every_scenario_passes() {
        let runner = ScenarioRunner::new(42, 300);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(
                result.passed,
                "{} failed: {:?}",
                scenario,
                result.failure_reason
            );
            assert!(result.reproducible);
            assert_eq!(result.total_ticks, 300);
        }
    }

    #[test]
    fn test_identity_mesh_keeps_its_graph() {
        let result = ScenarioRunner::new(7, 60).run(ScenarioId::IdentityMesh);
        assert_eq!(result.metrics.node_count, 5);
        assert_eq!(result.metrics.edge_count, 4);
        assert!((result.final_time_secs - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_export_records_frames() {
        let runner = ScenarioRunner::new(1, 100).with_export_every(10);
        let mut export = SimExport::new("binary_pair", 1);
        let result = runner.run_with_export(ScenarioId::BinaryPair, Some(&mut export));

        assert!(result.passed);
        assert_eq!(export.frames.len(), 10);
        assert_eq!(export.frames[0].tick, 10);
        assert!(export.passed);
    }

    #[test]
    fn test_export_skips_discarded_ticks() {
        // The pair is flung apart until positions overflow, after which every tick is discarded.
        let config = EngineConfig {
            field: FieldParams {
                gravity: f64::MAX,
                electromagnetism: f64::MAX,
                ..FieldParams::inert()
            },
            bounds: Bounds {
                min: Vector3::repeat(-f64::MAX),
                max: Vector3::repeat(f64::MAX),
            },
            ..EngineConfig::default()
        };
        let runner = ScenarioRunner::new(1, 300).with_export_every(1).with_config(config);
        let mut export = SimExport::new("binary_pair", 1);
        let result = runner.run_with_export(ScenarioId::BinaryPair, Some(&mut export));

        assert!(result.discarded_ticks > 0);
        assert!(result.total_ticks > 0);
        assert_eq!(export.frames.len() as u64, result.total_ticks);
        assert!(export.frames.windows(2).all(|pair| pair[0].tick < pair[1].tick));
        assert!(!result.passed);
    }
}
