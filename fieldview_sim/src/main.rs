//! FieldView Simulator CLI
//!
//! Run deterministic layout scenarios, or drive one live against the wall clock.

use clap::Parser;
use fieldview_core::EngineConfig;
use fieldview_sim::{LiveOptions, ScenarioId, ScenarioResult, ScenarioRunner, SimExport};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Batch run length when --ticks is absent.
const DEFAULT_TICKS: u64 = 600;

/// FieldView deterministic simulation CLI
#[derive(Parser, Debug)]
#[command(name = "fieldview-sim")]
#[command(about = "Run deterministic layout scenarios for FieldView", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (identity_mesh, binary_pair, entangled_cluster,
    /// charged_lattice, observer_storm, random_swarm, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Frames to deliver per run (batch default 600, live default unbounded)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Frame rate (virtual in batch mode, wall clock in live mode)
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Engine configuration JSON replacing the scenario's own
    #[arg(long)]
    config: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export recorded frames to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Capture every N ticks when exporting
    #[arg(long, default_value = "10")]
    export_every: u64,

    /// Run a single scenario live until Ctrl-C or --ticks
    #[arg(long)]
    live: bool,

    /// Attach the terminal dashboard to a live run
    #[cfg(feature = "dashboard")]
    #[arg(long)]
    dashboard: bool,
}

fn load_config(path: &str) -> EngineConfig {
    let json = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error: cannot read {}: {}", path, e);
        std::process::exit(1);
    });
    EngineConfig::from_json(&json).unwrap_or_else(|e| {
        eprintln!("Error: {}: {}", path, e);
        std::process::exit(1);
    })
}

fn run_live_mode(args: &Args, scenario: ScenarioId, seed: u64, config: Option<EngineConfig>) {
    let options = LiveOptions {
        scenario,
        seed,
        fps: args.fps,
        ticks: args.ticks,
        config,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to start tokio runtime");

    #[cfg(feature = "dashboard")]
    let outcome = if args.dashboard {
        runtime.block_on(fieldview_sim::run_dashboard(options))
    } else {
        runtime.block_on(fieldview_sim::run_live(options))
    };
    #[cfg(not(feature = "dashboard"))]
    let outcome = runtime.block_on(fieldview_sim::run_live(options));

    match outcome {
        Ok(summary) => {
            info!(
                "Stopped at tick {} | {} discarded | KE {:.6} | max speed {:.4}",
                summary.ticks, summary.discarded, summary.metrics.kinetic_energy, summary.metrics.max_speed
            );
            if !summary.metrics.is_healthy() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Live run failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    if !args.json {
        info!("FieldView Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            let names: Vec<&str> = ScenarioId::all().iter().map(|s| s.name()).collect();
            eprintln!("Available scenarios: {}, all", names.join(", "));
            std::process::exit(1);
        })]
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let config = args.config.as_deref().map(load_config);

    if args.live {
        if scenarios.len() > 1 {
            eprintln!("Error: --live only supports a single scenario, not 'all'");
            std::process::exit(1);
        }
        run_live_mode(&args, scenarios[0], base_seed, config);
        return;
    }

    let ticks = args.ticks.unwrap_or(DEFAULT_TICKS);
    let mut runner = ScenarioRunner::new(base_seed, ticks).with_fps(args.fps);
    if let Some(config) = &config {
        runner = runner.with_config(config.clone());
    }

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }

        info!("Running with export to: {}", export_path);
        let scenario = scenarios[0];
        let mut export = SimExport::new(scenario.name(), base_seed);
        let result = runner
            .with_export_every(args.export_every.max(1))
            .run_with_export(scenario, Some(&mut export));

        if let Err(e) = export.write_to_file(export_path) {
            error!("Failed to write export: {:?}", e);
            std::process::exit(1);
        }
        info!("Exported {} frames to {}", export.frames.len(), export_path);

        if result.passed {
            info!("✓ {} (seed={}) PASSED", scenario.name(), base_seed);
        } else {
            error!(
                "✗ {} FAILED: {}",
                scenario.name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
            std::process::exit(1);
        }
        return;
    }

    // Run simulations
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let mut runner = ScenarioRunner::new(seed, ticks).with_fps(args.fps);
        if let Some(config) = &config {
            runner = runner.with_config(config.clone());
        }

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if !result.passed {
                failed_count += 1;
            }
            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "ticks": r.total_ticks,
                    "time_secs": r.final_time_secs,
                    "discarded_ticks": r.discarded_ticks,
                    "reproducible": r.reproducible,
                    "kinetic_energy": r.metrics.kinetic_energy,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
