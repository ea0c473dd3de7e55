//! FieldView TUI Dashboard Module
//! ==============================
//!
//! Terminal render adapter: draws the engine's render commands on a ratatui
//! canvas and turns key presses back into engine commands. Frames arrive and
//! commands leave over crossbeam channels, so the engine can tick on another
//! thread or task.
//!
//! Enable with the `dashboard` feature flag.
//!
//! Keys:
//! - `space` play/pause, `+`/`-` zoom, `c` center, `r` randomize
//! - arrows pan, `q`/`Esc` quit

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossbeam::channel::{Receiver, Sender};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use nalgebra::Vector2;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::canvas::{Canvas, Circle, Line as Segment},
    widgets::{Block, Borders, Paragraph, Sparkline},
    Frame, Terminal,
};

use crate::events::{Command, EngineEvent, LoopState};
use crate::metrics::LayoutMetrics;
use crate::model::{NodeCategory, NodeId, RelationKind};
use crate::render::RenderCommand;

/// Screen units moved per arrow key press.
const PAN_STEP: f64 = 20.0;

/// Energy samples kept for the sparkline.
const HISTORY_LEN: usize = 100;

// =============================================================================
// FRAME PACKET (Sent from Engine to Dashboard)
// =============================================================================

/// Everything the dashboard needs to draw one frame.
#[derive(Debug, Clone)]
pub struct DashboardFrame {
    pub tick: u64,
    pub state: LoopState,
    pub metrics: LayoutMetrics,
    pub pan: Vector2<f64>,
    pub zoom: f64,
    pub commands: Vec<RenderCommand>,
    /// Engine events raised since the previous frame
    pub events: Vec<EngineEvent>,
}

impl Default for DashboardFrame {
    fn default() -> Self {
        Self {
            tick: 0,
            state: LoopState::Idle,
            metrics: LayoutMetrics::default(),
            pan: Vector2::zeros(),
            zoom: 1.0,
            commands: Vec::new(),
            events: Vec::new(),
        }
    }
}

/// One-line status text for an engine event.
pub fn describe_event(event: &EngineEvent) -> String {
    let or_none = |id: &Option<NodeId>| id.as_ref().map_or_else(|| "none".to_string(), |id| id.to_string());
    match event {
        EngineEvent::SelectionChanged { selected } => format!("selected {}", or_none(selected)),
        EngineEvent::HoverChanged { hovered } => format!("hovering {}", or_none(hovered)),
        EngineEvent::PlaybackChanged { state } => format!("playback {:?}", state),
        EngineEvent::SnapshotReset { tick } => format!("reset to tick {}", tick),
        EngineEvent::TickDiscarded { tick, discard } => format!(
            "tick {} discarded: {} {:?} not finite",
            tick, discard.node, discard.field
        ),
    }
}

/// What a key press asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardInput {
    Engine(Command),
    Quit,
}

/// Maps a key to an input given the last frame's view.
pub fn key_input(code: KeyCode, frame: &DashboardFrame) -> Option<DashboardInput> {
    let pan_by = |dx: f64, dy: f64| {
        DashboardInput::Engine(Command::SetPanZoom {
            pan: frame.pan + Vector2::new(dx, dy),
            zoom: frame.zoom,
        })
    };
    let input = match code {
        KeyCode::Char('q') | KeyCode::Esc => DashboardInput::Quit,
        KeyCode::Char(' ') => DashboardInput::Engine(Command::TogglePlaying),
        KeyCode::Char('+') | KeyCode::Char('=') => DashboardInput::Engine(Command::ZoomIn),
        KeyCode::Char('-') => DashboardInput::Engine(Command::ZoomOut),
        KeyCode::Char('c') => DashboardInput::Engine(Command::CenterView),
        KeyCode::Char('r') => DashboardInput::Engine(Command::RandomizePositions(frame.tick)),
        KeyCode::Left => pan_by(PAN_STEP, 0.0),
        KeyCode::Right => pan_by(-PAN_STEP, 0.0),
        KeyCode::Up => pan_by(0.0, PAN_STEP),
        KeyCode::Down => pan_by(0.0, -PAN_STEP),
        _ => return None,
    };
    Some(input)
}

fn category_color(category: NodeCategory) -> Color {
    match category {
        NodeCategory::User => Color::Cyan,
        NodeCategory::Device => Color::Green,
        NodeCategory::Resource => Color::Yellow,
        NodeCategory::Policy => Color::Magenta,
        NodeCategory::Service => Color::Blue,
    }
}

fn relation_color(kind: RelationKind) -> Color {
    match kind {
        RelationKind::Identity => Color::Cyan,
        RelationKind::Network => Color::Blue,
        RelationKind::Data => Color::Yellow,
        RelationKind::Policy => Color::Magenta,
        RelationKind::Entanglement => Color::LightMagenta,
    }
}

// =============================================================================
// FIELD DASHBOARD
// =============================================================================

/// TUI dashboard driving a running engine.
pub struct FieldDashboard {
    rx: Receiver<DashboardFrame>,
    tx: Sender<Command>,
    /// Canvas extent in screen units
    viewport: (f64, f64),
    energy_history: VecDeque<u64>,
    latest: DashboardFrame,
    last_event: Option<String>,
}

impl FieldDashboard {
    pub fn new(rx: Receiver<DashboardFrame>, tx: Sender<Command>) -> Self {
        Self {
            rx,
            tx,
            viewport: (800.0, 600.0),
            energy_history: VecDeque::with_capacity(HISTORY_LEN),
            latest: DashboardFrame::default(),
            last_event: None,
        }
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = (width, height);
        self
    }

    /// Takes every pending frame, keeping the newest.
    fn drain_frames(&mut self) {
        while let Ok(frame) = self.rx.try_recv() {
            // Energy in milli-units so small residual motion still shows
            let energy = (frame.metrics.kinetic_energy * 1000.0).min(u64::MAX as f64) as u64;
            self.energy_history.push_back(energy);
            if self.energy_history.len() > HISTORY_LEN {
                self.energy_history.pop_front();
            }
            if let Some(event) = frame.events.last() {
                self.last_event = Some(describe_event(event));
            }
            self.latest = frame;
        }
    }

    /// Run the TUI main loop (blocks until 'q' pressed or the engine hangs up)
    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        loop {
            self.drain_frames();

            terminal.draw(|f| self.ui(f))?;

            if event::poll(Duration::from_millis(30))? {
                if let Event::Key(key) = event::read()? {
                    match key_input(key.code, &self.latest) {
                        Some(DashboardInput::Quit) => break,
                        Some(DashboardInput::Engine(command)) => {
                            if self.tx.send(command).is_err() {
                                break;
                            }
                        }
                        None => {}
                    }
                }
            }
        }

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    fn ui(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(10),   // Graph
                Constraint::Length(5), // Energy sparkline
                Constraint::Length(1), // Footer
            ])
            .split(f.area());

        // === HEADER ===
        let (state_text, state_color) = match self.latest.state {
            LoopState::Running => ("RUNNING", Color::Green),
            LoopState::Idle => ("PAUSED", Color::Yellow),
        };
        let health = if self.latest.metrics.is_healthy() {
            Span::styled("OK", Style::default().fg(Color::Green))
        } else {
            Span::styled("OUT OF BOUNDS", Style::default().fg(Color::Red))
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled("FieldView", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  |  "),
            Span::styled(state_text, Style::default().fg(state_color).add_modifier(Modifier::BOLD)),
            Span::raw("  |  "),
            Span::styled(format!("tick {}", self.latest.tick), Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                "  |  {} nodes, {} edges  |  zoom {:.2}  |  ",
                self.latest.metrics.node_count, self.latest.metrics.edge_count, self.latest.zoom
            )),
            health,
        ]))
        .block(Block::default().borders(Borders::BOTTOM));
        f.render_widget(header, chunks[0]);

        // === GRAPH ===
        let (width, height) = self.viewport;
        let commands = &self.latest.commands;
        let canvas = Canvas::default()
            .block(Block::default().title("Layout").borders(Borders::ALL))
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(move |ctx| {
                // Screen y grows downwards, canvas y upwards
                for command in commands {
                    match command {
                        RenderCommand::Edge(edge) => ctx.draw(&Segment {
                            x1: edge.from.x,
                            y1: height - edge.from.y,
                            x2: edge.to.x,
                            y2: height - edge.to.y,
                            color: relation_color(edge.kind),
                        }),
                        RenderCommand::Node(node) => {
                            let color = if node.selected {
                                Color::White
                            } else {
                                category_color(node.category)
                            };
                            ctx.draw(&Circle {
                                x: node.screen.x,
                                y: height - node.screen.y,
                                radius: 8.0 * node.scale,
                                color,
                            });
                            if node.selected || node.hovered {
                                ctx.print(node.screen.x, height - node.screen.y, node.label.clone());
                            }
                        }
                    }
                }
            });
        f.render_widget(canvas, chunks[1]);

        // === ENERGY SPARKLINE ===
        let energy: Vec<u64> = self.energy_history.iter().cloned().collect();
        let sparkline = Sparkline::default()
            .block(
                Block::default()
                    .title(format!(
                        "Kinetic energy {:.4} (last {} frames)",
                        self.latest.metrics.kinetic_energy, HISTORY_LEN
                    ))
                    .borders(Borders::ALL),
            )
            .data(&energy)
            .style(Style::default().fg(Color::Cyan));
        f.render_widget(sparkline, chunks[2]);

        // === FOOTER ===
        let keys = "space play/pause | +/- zoom | arrows pan | c center | r randomize | q quit";
        let footer = match &self.last_event {
            Some(event) => Paragraph::new(Line::from(vec![
                Span::styled(event.as_str(), Style::default().fg(Color::White)),
                Span::styled(format!("  |  {}", keys), Style::default().fg(Color::DarkGray)),
            ])),
            None => Paragraph::new(keys).style(Style::default().fg(Color::DarkGray)),
        };
        f.render_widget(footer, chunks[3]);
    }
}

// =============================================================================
// TESTS
// =============================================================================
