//! Layout scenarios for the harness.

use fieldview_core::{
    Dimensionality, EdgeSpec, EngineConfig, FieldParams, NodeCategory, NodeSpec, QuantumState,
    RelationKind,
};
use fieldview_env::mix_seed;
use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

/// RNG stream for scenario construction.
const SCENARIO_STREAM: u64 = 3;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// The five-entity identity graph (user, device, file, policy, service)
    IdentityMesh,

    /// Two opposite charges pulled together
    BinaryPair,

    /// Entangled ring with depth, exercising perspective
    EntangledCluster,

    /// Grid of alternating charges
    ChargedLattice,

    /// Crowd around the observer with heavy positional noise
    ObserverStorm,

    /// Seeded random graph in a volume
    RandomSwarm,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::IdentityMesh,
            ScenarioId::BinaryPair,
            ScenarioId::EntangledCluster,
            ScenarioId::ChargedLattice,
            ScenarioId::ObserverStorm,
            ScenarioId::RandomSwarm,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::IdentityMesh => "identity_mesh",
            ScenarioId::BinaryPair => "binary_pair",
            ScenarioId::EntangledCluster => "entangled_cluster",
            ScenarioId::ChargedLattice => "charged_lattice",
            ScenarioId::ObserverStorm => "observer_storm",
            ScenarioId::RandomSwarm => "random_swarm",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::IdentityMesh => "Alice, her MacBook, a report, an admin policy and NetBird, 4 connections",
            ScenarioId::BinaryPair => "q=+1 and q=-1 at 10 units, gravity + EM only",
            ScenarioId::EntangledCluster => "8 entangled nodes on a ring at alternating depth",
            ScenarioId::ChargedLattice => "5x4 lattice of alternating charges",
            ScenarioId::ObserverStorm => "30 nodes inside the observation radius, U = 5",
            ScenarioId::RandomSwarm => "40 random nodes and edges in a 3D volume",
        }
    }

    /// Builds the scenario's configuration and entities from a seed.
    pub fn build(&self, seed: u64) -> Scenario {
        let mut rng = ChaCha8Rng::seed_from_u64(mix_seed(seed, SCENARIO_STREAM));
        match self {
            ScenarioId::IdentityMesh => identity_mesh(),
            ScenarioId::BinaryPair => binary_pair(),
            ScenarioId::EntangledCluster => entangled_cluster(),
            ScenarioId::ChargedLattice => charged_lattice(),
            ScenarioId::ObserverStorm => observer_storm(&mut rng),
            ScenarioId::RandomSwarm => random_swarm(&mut rng),
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "identity_mesh" | "identity" | "default" => Ok(ScenarioId::IdentityMesh),
            "binary_pair" | "binary" => Ok(ScenarioId::BinaryPair),
            "entangled_cluster" | "entangled" => Ok(ScenarioId::EntangledCluster),
            "charged_lattice" | "lattice" => Ok(ScenarioId::ChargedLattice),
            "observer_storm" | "storm" => Ok(ScenarioId::ObserverStorm),
            "random_swarm" | "swarm" => Ok(ScenarioId::RandomSwarm),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

/// A ready-to-load scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub config: EngineConfig,
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
}

// =============================================================================
// BUILDERS
// =============================================================================

fn identity_mesh() -> Scenario {
    let nodes = vec![
        NodeSpec::new("user-1", NodeCategory::User, "Alice")
            .at(400.0, 300.0, 0.0)
            .with_charge(1.0)
            .entangled()
            .with_property("role", "admin")
            .with_property("mfa", "true"),
        NodeSpec::new("device-1", NodeCategory::Device, "MacBook Pro")
            .at(500.0, 250.0, 0.0)
            .with_mass(0.8)
            .with_charge(-0.5)
            .entangled()
            .with_neighbors(["user-1", "policy-1"])
            .with_property("os", "macOS")
            .with_property("trusted", "true"),
        // policy-2 does not exist; the store drops it
        NodeSpec::new("file-1", NodeCategory::Resource, "Q4_Report.pdf")
            .at(300.0, 350.0, 0.0)
            .with_mass(0.3)
            .with_charge(0.2)
            .with_neighbors(["user-1", "policy-2"])
            .with_property("size", "2.3MB")
            .with_property("shared", "true"),
        NodeSpec::new("policy-1", NodeCategory::Policy, "Admin Access")
            .at(450.0, 400.0, 0.0)
            .with_mass(0.5)
            .with_charge(0.8)
            .with_quantum(QuantumState {
                superposition: true,
                probability: 0.7,
                ..QuantumState::default()
            })
            .with_property("type", "network")
            .with_property("strength", "high"),
        NodeSpec::new("service-1", NodeCategory::Service, "NetBird")
            .at(550.0, 350.0, 0.0)
            .with_mass(2.0)
            .with_neighbors(["policy-1"])
            .with_quantum(QuantumState {
                collapsed: true,
                ..QuantumState::default()
            })
            .with_property("status", "healthy")
            .with_property("peers", "23"),
    ];
    let edges = vec![
        EdgeSpec::new("conn-1", "user-1", "device-1", RelationKind::Identity).entangled(),
        EdgeSpec::new("conn-2", "user-1", "file-1", RelationKind::Data)
            .with_strength(0.8)
            .with_phase(FRAC_PI_4),
        EdgeSpec::new("conn-3", "device-1", "policy-1", RelationKind::Policy)
            .with_strength(0.9)
            .with_phase(FRAC_PI_2),
        EdgeSpec::new("conn-4", "policy-1", "service-1", RelationKind::Network),
    ];
    Scenario {
        config: EngineConfig::default(),
        nodes,
        edges,
    }
}

fn binary_pair() -> Scenario {
    let config = EngineConfig {
        field: FieldParams {
            gravity: 0.1,
            electromagnetism: 0.05,
            ..FieldParams::inert()
        },
        ..EngineConfig::default()
    };
    let nodes = vec![
        NodeSpec::new("a", NodeCategory::User, "A").at(395.0, 300.0, 0.0).with_charge(1.0),
        NodeSpec::new("b", NodeCategory::Device, "B").at(405.0, 300.0, 0.0).with_charge(-1.0),
    ];
    Scenario {
        config,
        nodes,
        edges: Vec::new(),
    }
}

fn entangled_cluster() -> Scenario {
    const COUNT: usize = 8;
    let config = EngineConfig {
        dimensionality: Dimensionality::Spatial,
        ..EngineConfig::default()
    };
    let center = Vector3::new(400.0, 300.0, 0.0);

    let nodes = (0..COUNT)
        .map(|i| {
            let angle = TAU * i as f64 / COUNT as f64;
            let depth = if i % 2 == 0 { 50.0 } else { -50.0 };
            NodeSpec::new(format!("q-{}", i), NodeCategory::Service, format!("Qubit {}", i))
                .at(center.x + 150.0 * angle.cos(), center.y + 150.0 * angle.sin(), depth)
                .entangled()
        })
        .collect();
    let edges = (0..COUNT)
        .map(|i| {
            EdgeSpec::new(
                format!("ent-{}", i),
                format!("q-{}", i),
                format!("q-{}", (i + 1) % COUNT),
                RelationKind::Entanglement,
            )
            .with_phase(TAU * i as f64 / COUNT as f64)
            .entangled()
        })
        .collect();

    Scenario { config, nodes, edges }
}

fn charged_lattice() -> Scenario {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for row in 0..4 {
        for col in 0..5 {
            let charge = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
            nodes.push(
                NodeSpec::new(format!("n-{}-{}", row, col), NodeCategory::Device, format!("({}, {})", row, col))
                    .at(200.0 + 100.0 * col as f64, 150.0 + 100.0 * row as f64, 0.0)
                    .with_charge(charge),
            );
            if col > 0 {
                edges.push(EdgeSpec::new(
                    format!("h-{}-{}", row, col),
                    format!("n-{}-{}", row, col - 1),
                    format!("n-{}-{}", row, col),
                    RelationKind::Network,
                ));
            }
        }
    }
    Scenario {
        config: EngineConfig::default(),
        nodes,
        edges,
    }
}

fn observer_storm(rng: &mut ChaCha8Rng) -> Scenario {
    let config = EngineConfig {
        field: FieldParams {
            uncertainty: 5.0,
            ..FieldParams::default()
        },
        ..EngineConfig::default()
    };
    let observer = config.field.observer;
    let spread = 30.0;

    let nodes = (0..30)
        .map(|i| {
            let x = observer.x + spread * rng.sample::<f64, _>(StandardNormal);
            let y = observer.y + spread * rng.sample::<f64, _>(StandardNormal);
            NodeSpec::new(format!("user-{}", i), NodeCategory::User, format!("User {}", i))
                .at(x, y, 0.0)
                .with_mass(rng.gen_range(0.5..1.5))
        })
        .collect();

    Scenario {
        config,
        nodes,
        edges: Vec::new(),
    }
}

fn random_swarm(rng: &mut ChaCha8Rng) -> Scenario {
    const COUNT: usize = 40;
    const CATEGORIES: [NodeCategory; 5] = [
        NodeCategory::User,
        NodeCategory::Device,
        NodeCategory::Resource,
        NodeCategory::Policy,
        NodeCategory::Service,
    ];
    const RELATIONS: [RelationKind; 4] = [
        RelationKind::Identity,
        RelationKind::Network,
        RelationKind::Data,
        RelationKind::Policy,
    ];

    let config = EngineConfig {
        dimensionality: Dimensionality::Spatial,
        ..EngineConfig::default()
    };
    let bounds = config.bounds;

    let mut nodes = Vec::with_capacity(COUNT);
    let mut edges = Vec::new();
    for i in 0..COUNT {
        let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
        let mut spec = NodeSpec::new(format!("{}-{}", category, i), category, format!("{} {}", category, i))
            .at(
                rng.gen_range(bounds.min.x..=bounds.max.x),
                rng.gen_range(bounds.min.y..=bounds.max.y),
                rng.gen_range(-100.0..=100.0),
            )
            .with_mass(rng.gen_range(0.3..2.0))
            .with_charge(0.5 * rng.sample::<f64, _>(StandardNormal));
        if rng.gen_bool(0.1) {
            spec = spec.entangled();
        }

        if i > 0 {
            for _ in 0..rng.gen_range(1..=2) {
                let target: &NodeSpec = &nodes[rng.gen_range(0..i)];
                let kind = RELATIONS[rng.gen_range(0..RELATIONS.len())];
                edges.push(
                    EdgeSpec::new(format!("edge-{}", edges.len()), spec.id.as_str(), target.id.as_str(), kind)
                        .with_strength(rng.gen_range(0.1..1.0))
                        .with_phase(rng.gen_range(0.0..TAU)),
                );
            }
        }
        nodes.push(spec);
    }

    Scenario { config, nodes, edges }
}
