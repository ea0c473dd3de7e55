//! The engine facade.
//!
//! `FieldEngine` is the only thing a host talks to. It owns the store, the
//! simulation loop, the camera and the selection state; it takes [`Command`]
//! values in, hands [`EventRecord`]s and render commands out, and is driven
//! by `on_frame` calls from whatever delivers the scheduler's frames.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{Command, CommandOutcome, EngineEvent, EventRecord, LoopState, ResetSource};
use crate::field::Dimensionality;
use crate::interaction::{InteractionResolver, SelectionState};
use crate::model::{NodeId, NodeSpec, Snapshot};
use crate::projector::Projector;
use crate::render::{build_frame, RenderCommand};
use crate::simulation::{SimulationLoop, TickOutcome};
use crate::store::EntityStore;
use fieldview_env::handoff::Subscriber;
use fieldview_env::{mix_seed, FieldContext, FrameScheduler};
use nalgebra::{Vector2, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// RNG stream for positional noise.
pub const NOISE_STREAM: u64 = 1;

/// RNG stream for position randomization.
pub const LAYOUT_STREAM: u64 = 2;

/// Events kept for a host that never drains. The oldest go first.
pub const MAX_QUEUED_EVENTS: usize = 1024;

pub struct FieldEngine<C: FieldContext, S: FrameScheduler> {
    context: Arc<C>,
    config: EngineConfig,
    store: EntityStore,
    sim: SimulationLoop<S>,
    projector: Projector,
    resolver: InteractionResolver,
    selection: SelectionState,
    events: VecDeque<EventRecord>,
}

impl<C: FieldContext, S: FrameScheduler> FieldEngine<C, S> {
    /// Creates an empty, Idle engine.
    pub fn new(context: Arc<C>, scheduler: Arc<S>, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let noise = context.derive_rng(NOISE_STREAM);
        let store = EntityStore::new();
        let sim = SimulationLoop::new(scheduler, &config, noise, store.snapshot(0))?;
        let projector = Projector::new(config.projector.clone(), config.dimensionality);
        let resolver = InteractionResolver::new(config.hit_radius)?;

        info!(
            "FieldEngine ready (seed {}, {:?})",
            context.seed(),
            config.dimensionality
        );
        Ok(Self {
            context,
            config,
            store,
            sim,
            projector,
            resolver,
            selection: SelectionState::default(),
            events: VecDeque::new(),
        })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<C> {
        &self.context
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn state(&self) -> LoopState {
        self.sim.state()
    }

    /// Last published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.sim.current()
    }

    /// Opens a reader on the snapshot hand-off.
    pub fn subscribe(&self) -> Subscriber<Snapshot> {
        self.sim.subscribe()
    }

    // =========================================================================
    // FRAMES
    // =========================================================================

    /// Frame callback. Runs one tick if Running.
    pub fn on_frame(&mut self) -> TickOutcome {
        let outcome = self.sim.tick(&mut self.store);
        if let TickOutcome::Discarded(discard) = &outcome {
            let tick = self.sim.current().tick + 1;
            self.emit(EngineEvent::TickDiscarded {
                tick,
                discard: discard.clone(),
            });
        }
        outcome
    }

    /// Draw list for the current snapshot and view.
    pub fn render_frame(&self) -> Vec<RenderCommand> {
        build_frame(&self.sim.current(), &self.projector, &self.selection)
    }

    /// Takes every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        self.events.drain(..).collect()
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, EngineError> {
        match command {
            Command::AddNode(spec) => {
                let spec = self.flatten_spec(spec);
                self.store.add_node(spec)?;
                self.republish();
            }
            Command::RemoveNode(id) => {
                self.store.remove_node(&id)?;
                self.forget(&id);
                self.republish();
            }
            Command::AddEdge(spec) => {
                self.store.add_edge(spec)?;
                self.republish();
            }
            Command::RemoveEdge(id) => {
                self.store.remove_edge(&id)?;
                self.republish();
            }
            Command::SetPlaying(playing) => self.set_playing(playing),
            Command::TogglePlaying => {
                let playing = !self.sim.is_running();
                self.set_playing(playing);
            }
            Command::Reset(source) => self.reset(source)?,
            Command::SetPanZoom { pan, zoom } => self.projector.set_pan_zoom(pan, zoom)?,
            Command::ZoomIn => self.projector.zoom_in(),
            Command::ZoomOut => self.projector.zoom_out(),
            Command::CenterView => self.projector.center(),
            Command::PointerClick(screen) => {
                let picked = self.pick(screen);
                if self.selection.select(picked.clone()) {
                    self.emit(EngineEvent::SelectionChanged {
                        selected: picked.clone(),
                    });
                }
                return Ok(CommandOutcome::Picked(picked));
            }
            Command::PointerMove(screen) => {
                let picked = self.pick(screen);
                if self.selection.hover(picked.clone()) {
                    self.emit(EngineEvent::HoverChanged {
                        hovered: picked.clone(),
                    });
                }
                return Ok(CommandOutcome::Picked(picked));
            }
            Command::RandomizePositions(seed) => {
                self.randomize_positions(seed);
                self.republish();
            }
        }
        Ok(CommandOutcome::Applied)
    }

    fn set_playing(&mut self, playing: bool) {
        let changed = if playing { self.sim.play() } else { self.sim.pause() };
        if changed {
            let state = self.sim.state();
            self.emit(EngineEvent::PlaybackChanged { state });
        }
    }

    /// Replaces the state without touching the playback state.
    fn reset(&mut self, source: ResetSource) -> Result<(), EngineError> {
        let tick = match source {
            ResetSource::Snapshot(mut snapshot) => {
                if self.config.dimensionality == Dimensionality::Planar {
                    for node in &mut snapshot.nodes {
                        node.position = flatten(node.position);
                        node.velocity = flatten(node.velocity);
                    }
                }
                self.store = EntityStore::from_snapshot(&snapshot)?;

                let vanished: Vec<NodeId> = [self.selection.selected(), self.selection.hovered()]
                    .into_iter()
                    .flatten()
                    .filter(|id| !self.store.contains_node(id))
                    .cloned()
                    .collect();
                for id in vanished {
                    self.forget(&id);
                }
                snapshot.tick
            }
            ResetSource::Seed(seed) => {
                self.randomize_positions(seed);
                self.sim.reseed(mix_seed(seed, NOISE_STREAM));
                0
            }
        };

        self.sim.publish(self.store.snapshot(tick));
        info!(
            "Reset to tick {} with {} nodes, {} edges",
            tick,
            self.store.node_count(),
            self.store.edge_count()
        );
        self.emit(EngineEvent::SnapshotReset { tick });
        Ok(())
    }

    /// Scatters every node uniformly inside the bounds and zeroes velocities.
    fn randomize_positions(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(mix_seed(seed, LAYOUT_STREAM));
        let bounds = *self.sim.bounds();
        let dimensionality = self.config.dimensionality;
        self.store
            .reposition(|_, _| bounds.sample(&mut rng, dimensionality));
    }

    fn pick(&self, screen: Vector2<f64>) -> Option<NodeId> {
        self.resolver.pick(&self.sim.current(), &self.projector, screen)
    }

    fn forget(&mut self, id: &NodeId) {
        let (selection_changed, hover_changed) = self.selection.forget(id);
        if selection_changed {
            self.emit(EngineEvent::SelectionChanged { selected: None });
        }
        if hover_changed {
            self.emit(EngineEvent::HoverChanged { hovered: None });
        }
    }

    /// Publishes the store at the current tick.
    fn republish(&mut self) {
        let tick = self.sim.current().tick;
        self.sim.publish(self.store.snapshot(tick));
    }

    fn flatten_spec(&self, mut spec: NodeSpec) -> NodeSpec {
        if self.config.dimensionality == Dimensionality::Planar {
            spec.position = flatten(spec.position);
            spec.velocity = flatten(spec.velocity);
        }
        spec
    }

    fn emit(&mut self, event: EngineEvent) {
        if self.events.len() == MAX_QUEUED_EVENTS {
            if let Some(dropped) = self.events.pop_front() {
                debug!("Event queue full, dropping {:?}", dropped.event);
            }
        }
        self.events.push_back(EventRecord {
            at: self.context.now(),
            tick: self.sim.current().tick,
            event,
        });
    }
}

fn flatten(mut v: Vector3<f64>) -> Vector3<f64> {
    v.z = 0.0;
    v
}
