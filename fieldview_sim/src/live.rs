//! Live mode: wall-clock frame pacing through the tokio scheduler.
//!
//! The engine ticks on the main task. Published snapshots go through the
//! hand-off to a monitor task that logs layout metrics, so the tick never
//! waits on logging.

use crate::error::HarnessError;
use crate::scenarios::ScenarioId;

use fieldview_core::{
    Bounds, Command, EngineConfig, EngineEvent, FieldEngine, LayoutMetrics, TickOutcome,
};
use fieldview_env::{FieldContext, TokioContext, TokioFrameScheduler};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Live run settings.
#[derive(Debug, Clone)]
pub struct LiveOptions {
    pub scenario: ScenarioId,
    pub seed: u64,
    pub fps: u32,
    /// Stop after delivering this many frames (`None` = until Ctrl-C)
    pub ticks: Option<u64>,
    pub config: Option<EngineConfig>,
}

/// How a live run ended.
#[derive(Debug, Clone)]
pub struct LiveSummary {
    pub ticks: u64,
    pub discarded: u64,
    pub metrics: LayoutMetrics,
}

type LiveEngine = FieldEngine<TokioContext, TokioFrameScheduler>;

fn build_engine(options: &LiveOptions) -> Result<(LiveEngine, TokioFrameScheduler), HarnessError> {
    let built = options.scenario.build(options.seed);
    let config = options.config.clone().unwrap_or(built.config);

    let scheduler = TokioFrameScheduler::new(options.fps)?;
    let context = Arc::new(TokioContext::with_seed(options.seed));
    let mut engine = FieldEngine::new(context, Arc::new(scheduler.clone()), config)?;

    for spec in built.nodes {
        engine.apply(Command::AddNode(spec))?;
    }
    for spec in built.edges {
        engine.apply(Command::AddEdge(spec))?;
    }
    Ok((engine, scheduler))
}

/// Drains the engine's event queue and logs each event.
///
/// Discards are already logged at warn level by the loop itself.
fn report_events(engine: &mut LiveEngine) -> Vec<EngineEvent> {
    engine
        .drain_events()
        .into_iter()
        .map(|record| {
            match &record.event {
                EngineEvent::TickDiscarded { tick, .. } => debug!("event: tick {} discarded", tick),
                event => info!("tick {:>6} | {:?}", record.tick, event),
            }
            record.event
        })
        .collect()
}

/// Logs metrics for every `every`-th published snapshot until the engine
/// goes away.
fn spawn_monitor(engine: &LiveEngine, every: u64) -> tokio::task::JoinHandle<()> {
    let mut snapshots = engine.subscribe();
    let bounds: Bounds = engine.config().bounds;
    tokio::spawn(async move {
        while let Ok(snapshot) = snapshots.changed().await {
            if snapshot.tick == 0 || snapshot.tick % every != 0 {
                continue;
            }
            let metrics = LayoutMetrics::from_snapshot(&snapshot, &bounds);
            info!(
                "tick {:>6} | KE {:>12.6} | max speed {:>9.4} | centroid ({:.1}, {:.1})",
                metrics.tick, metrics.kinetic_energy, metrics.max_speed, metrics.centroid.x, metrics.centroid.y
            );
        }
    })
}

/// Runs the scenario against the wall clock.
pub async fn run_live(options: LiveOptions) -> Result<LiveSummary, HarnessError> {
    let (mut engine, scheduler) = build_engine(&options)?;
    let mut pacer = scheduler.frame_pacer();
    let monitor = spawn_monitor(&engine, u64::from(options.fps));

    info!(
        "Live run: {} (seed={}, {} fps)",
        options.scenario.name(),
        engine.context().seed(),
        options.fps
    );
    engine.apply(Command::SetPlaying(true))?;

    report_events(&mut engine);

    let mut delivered = 0;
    let mut discarded = 0;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        if options.ticks.is_some_and(|limit| delivered >= limit) {
            break;
        }
        tokio::select! {
            _ = pacer.next_frame() => {
                delivered += 1;
                if let TickOutcome::Discarded(_) = engine.on_frame() {
                    discarded += 1;
                }
                report_events(&mut engine);
            }
            _ = &mut shutdown => {
                info!("Interrupted");
                break;
            }
        }
    }

    engine.apply(Command::SetPlaying(false))?;
    report_events(&mut engine);
    let snapshot = engine.snapshot();
    let metrics = LayoutMetrics::from_snapshot(&snapshot, &engine.config().bounds);
    drop(engine);
    if let Err(e) = monitor.await {
        warn!("Monitor task failed: {}", e);
    }

    Ok(LiveSummary {
        ticks: snapshot.tick,
        discarded,
        metrics,
    })
}

/// Runs the scenario with the terminal dashboard attached.
///
/// The dashboard owns the terminal on a blocking thread; frames flow to it
/// and commands flow back over crossbeam channels.
#[cfg(feature = "dashboard")]
pub async fn run_dashboard(options: LiveOptions) -> Result<LiveSummary, HarnessError> {
    use crossbeam::channel::{unbounded, TryRecvError};
    use fieldview_core::dashboard::{DashboardFrame, FieldDashboard};

    let (mut engine, scheduler) = build_engine(&options)?;
    let mut pacer = scheduler.frame_pacer();
    let bounds = engine.config().bounds;

    let (frame_tx, frame_rx) = unbounded::<DashboardFrame>();
    let (command_tx, command_rx) = unbounded::<Command>();
    let ui = tokio::task::spawn_blocking(move || FieldDashboard::new(frame_rx, command_tx).run());

    engine.apply(Command::SetPlaying(true))?;
    let mut discarded = 0;
    'frames: loop {
        loop {
            match command_rx.try_recv() {
                Ok(command) => {
                    if let Err(e) = engine.apply(command) {
                        warn!("Dashboard command rejected: {}", e);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'frames,
            }
        }

        let snapshot = engine.snapshot();
        let frame = DashboardFrame {
            tick: snapshot.tick,
            state: engine.state(),
            metrics: LayoutMetrics::from_snapshot(&snapshot, &bounds),
            pan: engine.projector().pan(),
            zoom: engine.projector().zoom(),
            commands: engine.render_frame(),
            events: engine.drain_events().into_iter().map(|record| record.event).collect(),
        };
        if frame_tx.send(frame).is_err() {
            break;
        }

        if engine.state() == fieldview_core::LoopState::Running {
            pacer.next_frame().await;
            if let TickOutcome::Discarded(_) = engine.on_frame() {
                discarded += 1;
            }
        } else {
            // Paused: keep serving commands at a relaxed rate
            tokio::time::sleep(scheduler.period() * 4).await;
        }
    }

    match ui.await {
        Ok(Err(e)) => return Err(HarnessError::Io(e)),
        Err(e) => warn!("Dashboard thread failed: {}", e),
        Ok(Ok(())) => {}
    }

    let snapshot = engine.snapshot();
    Ok(LiveSummary {
        ticks: snapshot.tick,
        discarded,
        metrics: LayoutMetrics::from_snapshot(&snapshot, &bounds),
    })
}
