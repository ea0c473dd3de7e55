//! The simulation loop: playback state machine plus the per-frame tick.
//!
//! ```text
//!            play                     frame (Running)
//!   Idle ───────────► Running ─────────────────────────┐
//!    ▲                  │  ▲                           │
//!    └──── pause ───────┘  └─ request_frame ◄─ publish ┘
//! ```
//!
//! A tick reads the node records, computes every net force, integrates,
//! clamps and validates, then publishes a fresh snapshot and asks the
//! scheduler for the next frame. Frames delivered while Idle do nothing.
//! Late frames are not coalesced and missed frames are not caught up.

use crate::boundary::Bounds;
use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::events::{LoopState, TickDiscard};
use crate::field::Dimensionality;
use crate::forces::ForceModel;
use crate::integrator::Integrator;
use crate::model::Snapshot;
use crate::store::EntityStore;
use fieldview_env::handoff::{self, Publisher, Subscriber};
use fieldview_env::FrameScheduler;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one frame callback did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A new snapshot was published.
    Published(Arc<Snapshot>),
    /// The tick produced a non-finite value; the previous snapshot was
    /// republished unchanged.
    Discarded(TickDiscard),
    /// The loop is Idle.
    Skipped,
}

/// Drives ticks against an [`EntityStore`] and publishes snapshots.
pub struct SimulationLoop<S: FrameScheduler> {
    scheduler: Arc<S>,
    state: LoopState,

    forces: ForceModel,
    integrator: Integrator,
    bounds: Bounds,
    dimensionality: Dimensionality,

    /// Positional-noise generator, drawn in node order
    noise: ChaCha8Rng,

    current: Arc<Snapshot>,
    publisher: Publisher<Snapshot>,
}

impl<S: FrameScheduler> SimulationLoop<S> {
    pub fn new(
        scheduler: Arc<S>,
        config: &EngineConfig,
        noise: ChaCha8Rng,
        initial: Snapshot,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let current = Arc::new(initial);
        let (publisher, _) = handoff::channel(Arc::clone(&current));

        Ok(Self {
            scheduler,
            state: LoopState::Idle,
            forces: ForceModel::new(config.field.clone(), config.dimensionality),
            integrator: Integrator::new(config.damping)?,
            bounds: config.bounds,
            dimensionality: config.dimensionality,
            noise,
            current,
            publisher,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    pub fn scheduler(&self) -> &Arc<S> {
        &self.scheduler
    }

    /// Last published snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    /// Opens a reader on the snapshot hand-off.
    pub fn subscribe(&self) -> Subscriber<Snapshot> {
        self.publisher.subscribe()
    }

    // =========================================================================
    // PLAYBACK
    // =========================================================================

    /// Idle -> Running. Returns false (and does nothing) if already Running.
    pub fn play(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = LoopState::Running;
        self.scheduler.start();
        self.scheduler.request_frame();
        info!("Simulation running from tick {}", self.current.tick);
        true
    }

    /// Running -> Idle. Returns false (and does nothing) if already Idle.
    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = LoopState::Idle;
        self.scheduler.stop();
        info!("Simulation paused at tick {}", self.current.tick);
        true
    }

    /// Replaces the positional-noise generator.
    pub fn reseed(&mut self, seed: u64) {
        self.noise = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Publishes `snapshot` as the current state without ticking.
    pub fn publish(&mut self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.current = Arc::new(snapshot);
        self.publisher.publish(Arc::clone(&self.current));
        Arc::clone(&self.current)
    }

    // =========================================================================
    // TICK
    // =========================================================================

    /// Handles one frame callback.
    pub fn tick(&mut self, store: &mut EntityStore) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Skipped;
        }

        let outcome = self.advance(store);
        self.scheduler.request_frame();
        outcome
    }

    fn advance(&mut self, store: &mut EntityStore) -> TickOutcome {
        let nodes = store.nodes();
        let forces = self.forces.net_forces(nodes, &mut self.noise);

        let mut next = Vec::with_capacity(nodes.len());
        let mut wall_hits = 0usize;
        for (node, force) in nodes.iter().zip(&forces) {
            let integrated = self.integrator.step(node, force);
            // Checked before clamping: clamping would turn an infinity into
            // a wall contact.
            if let Some(field) = integrated.non_finite_field() {
                let discard = TickDiscard {
                    node: node.id.clone(),
                    field,
                };
                warn!(
                    "Discarding tick {}: node {} has a non-finite {:?}",
                    self.current.tick + 1,
                    discard.node,
                    discard.field
                );
                self.publisher.publish(Arc::clone(&self.current));
                return TickOutcome::Discarded(discard);
            }

            let (bounded, hit) = self.bounds.clamp(integrated);
            if hit {
                wall_hits += 1;
            }
            next.push(bounded);
        }

        store.commit_kinematics(&next);
        let tick = self.current.tick + 1;
        debug!(
            "Tick {}: {} nodes, {} wall contacts",
            tick,
            next.len(),
            wall_hits
        );
        TickOutcome::Published(self.publish(store.snapshot(tick)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::KinematicField;
    use crate::field::FieldParams;
    use crate::model::{NodeCategory, NodeId, NodeSpec};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingScheduler {
        active: AtomicBool,
        starts: AtomicUsize,
        stops: AtomicUsize,
        requests: AtomicUsize,
    }

    impl FrameScheduler for RecordingScheduler {
        fn start(&self) {
            self.active.store(true, Ordering::SeqCst);
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn stop(&self) {
            self.active.store(false, Ordering::SeqCst);
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn request_frame(&self) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }

        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }

    fn binary_store() -> EntityStore {
        let mut store = EntityStore::new();
        store
            .add_node(NodeSpec::new("a", NodeCategory::User, "A").with_charge(1.0).at(395.0, 300.0, 0.0))
            .unwrap();
        store
            .add_node(NodeSpec::new("b", NodeCategory::User, "B").with_charge(-1.0).at(405.0, 300.0, 0.0))
            .unwrap();
        store
    }

    fn sim(store: &EntityStore, config: &EngineConfig) -> SimulationLoop<RecordingScheduler> {
        SimulationLoop::new(
            Arc::new(RecordingScheduler::default()),
            config,
            ChaCha8Rng::seed_from_u64(42),
            store.snapshot(0),
        )
        .unwrap()
    }

    #[test]
    fn test_play_and_pause_are_idempotent() {
        let store = binary_store();
        let mut sim = sim(&store, &EngineConfig::default());

        assert!(sim.play());
        assert!(!sim.play());
        assert_eq!(sim.scheduler().starts.load(Ordering::SeqCst), 1);
        assert_eq!(sim.scheduler().requests.load(Ordering::SeqCst), 1);

        assert!(sim.pause());
        assert!(!sim.pause());
        assert_eq!(sim.scheduler().stops.load(Ordering::SeqCst), 1);
        assert_eq!(sim.state(), LoopState::Idle);
    }

    #[test]
    fn test_idle_frame_does_nothing() {
        let mut store = binary_store();
        let mut sim = sim(&store, &EngineConfig::default());
        let before = store.snapshot(0);

        assert_eq!(sim.tick(&mut store), TickOutcome::Skipped);
        assert_eq!(store.snapshot(0), before);
        assert_eq!(sim.scheduler().requests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_tick_publishes_and_requests_next_frame() {
        let mut store = binary_store();
        let mut sim = sim(&store, &EngineConfig::default());
        let reader = sim.subscribe();
        sim.play();

        let TickOutcome::Published(snapshot) = sim.tick(&mut store) else {
            panic!("expected a published snapshot");
        };
        assert_eq!(snapshot.tick, 1);
        assert_eq!(reader.latest(), snapshot);
        assert_eq!(sim.scheduler().requests.load(Ordering::SeqCst), 2);

        // Opposite charges and gravity pull the pair together
        let a = snapshot.node(&NodeId::from("a")).unwrap();
        assert!(a.velocity.x > 0.0);
        assert!(a.position.x > 395.0);
    }

    #[test]
    fn test_non_finite_tick_is_discarded() {
        let config = EngineConfig {
            field: FieldParams {
                gravity: f64::MAX,
                ..FieldParams::inert()
            },
            ..EngineConfig::default()
        };
        let mut store = EntityStore::new();
        store
            .add_node(NodeSpec::new("a", NodeCategory::User, "A").with_mass(1e300).at(100.0, 100.0, 0.0))
            .unwrap();
        store
            .add_node(NodeSpec::new("b", NodeCategory::User, "B").with_mass(1e300).at(110.0, 100.0, 0.0))
            .unwrap();
        let mut sim = sim(&store, &config);
        let before = sim.current();
        sim.play();

        let outcome = sim.tick(&mut store);
        assert_eq!(
            outcome,
            TickOutcome::Discarded(TickDiscard {
                node: NodeId::from("a"),
                field: KinematicField::Position,
            })
        );
        assert_eq!(sim.current(), before);
        assert_eq!(store.snapshot(0), *before);
        // The loop keeps going
        assert!(sim.is_running());
        assert_eq!(sim.scheduler().requests.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_nodes_stay_in_bounds() {
        let mut store = EntityStore::new();
        store
            .add_node(
                NodeSpec::new("runaway", NodeCategory::Device, "R")
                    .with_velocity(nalgebra::Vector3::new(500.0, -500.0, 0.0))
                    .at(700.0, 100.0, 0.0),
            )
            .unwrap();
        let config = EngineConfig::default();
        let mut sim = sim(&store, &config);
        sim.play();

        for _ in 0..50 {
            sim.tick(&mut store);
            for node in store.nodes() {
                assert!(config.bounds.contains(&node.position));
            }
        }
        let node = &store.nodes()[0];
        assert_eq!(node.position.x, 750.0);
        assert_eq!(node.position.y, 50.0);
        assert_eq!(node.velocity.x, 0.0);
    }
}
