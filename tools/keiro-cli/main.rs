use clap::Parser;
use keiro::engine::{Engine, EngineConfig, RoutingPolicy};
use keiro::prelude::*;
use std::fs;
use std::time::Duration;

/// A CLI tool to run a saved workflow snapshot through the simulation
/// engine and print the resulting status trail.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a workflow snapshot JSON file
    #[arg(short, long)]
    input: String,

    /// Chance in [0.0, 1.0] that a simulated unit of work fails
    #[arg(long, default_value_t = 0.1)]
    failure_probability: f64,

    /// Delay between steps, in milliseconds
    #[arg(long, default_value_t = 500)]
    step_delay_ms: u64,

    /// Use millisecond-scale work durations instead of the 1-3s default
    #[arg(long, default_value_t = false)]
    fast: bool,

    /// Restrict traversal to the taken branch of condition nodes
    #[arg(long, default_value_t = false)]
    strict_routing: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let raw = fs::read_to_string(&cli.input)?;
    let snapshot: WorkflowSnapshot = serde_json::from_str(&raw)?;
    println!(
        "Loaded '{}': {} nodes, {} edges",
        cli.input,
        snapshot.nodes.len(),
        snapshot.edges.len()
    );

    let document = Document::load(snapshot.nodes, snapshot.edges).into_shared();

    let mut config = if cli.fast {
        EngineConfig::fast()
    } else {
        EngineConfig::default()
    };
    config.failure_probability = cli.failure_probability;
    config.step_delay = Duration::from_millis(cli.step_delay_ms);
    config.routing = if cli.strict_routing {
        RoutingPolicy::Strict
    } else {
        RoutingPolicy::Decorative
    };

    let mut engine = Engine::builder(document.clone()).config(config).build();
    engine.start()?;
    engine.wait().await;

    for entry in engine.history() {
        println!(
            "  {:<24} {:>9} -> {}",
            entry.node_id,
            entry.from.as_str(),
            entry.to.as_str()
        );
    }
    println!(
        "Workflow finished with status '{}' ({} transitions, {:.0}% of tasks complete)",
        engine.status(),
        engine.history().len(),
        engine.progress()
    );

    Ok(())
}
