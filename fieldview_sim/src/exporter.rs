//! JSON exporter for recorded runs.
//!
//! Exports periodic frames (positions, render commands, events) so a run can
//! be replayed or plotted outside the harness.

use fieldview_core::{EventRecord, RenderCommand, Snapshot};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    pub tick: u64,

    /// Virtual time in seconds
    pub time_sec: f64,

    pub nodes: Vec<NodePosition>,

    /// Draw list under the current view
    pub render: Vec<RenderCommand>,

    /// Events raised since the previous frame
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventRecord>,
}

impl SimFrame {
    pub fn capture(snapshot: &Snapshot, time_sec: f64, render: Vec<RenderCommand>, events: Vec<EventRecord>) -> Self {
        Self {
            tick: snapshot.tick,
            time_sec,
            nodes: snapshot
                .nodes
                .iter()
                .map(|node| NodePosition::new(node.id.as_str(), node.position, node.velocity.norm()))
                .collect(),
            render,
            events,
        }
    }
}

/// Position of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub speed: f64,
}

impl NodePosition {
    pub fn new(id: &str, pos: Vector3<f64>, speed: f64) -> Self {
        Self {
            id: id.to_string(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            speed,
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    /// Kinetic energy of the final snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_kinetic_energy: Option<f64>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            final_kinetic_energy: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, kinetic_energy: Option<f64>) {
        self.passed = passed;
        self.final_kinetic_energy = kinetic_energy;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
