use clap::Parser;
use keiro::prelude::*;
use keiro::{NODE_HEIGHT, NODE_SPACING};
use rand::Rng;
use std::fs;

/// A CLI tool to generate a seeded chain workflow snapshot for the keiro
/// engine: start -> task_1..task_N -> end, with optional special nodes
/// sprinkled in.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_workflow.json")]
    output: String,

    /// How many task nodes the chain carries
    #[arg(long, default_value_t = 298)]
    tasks: usize,

    /// Chance in [0.0, 1.0] that a chain slot becomes a loop, timer,
    /// branch, or subprocess node instead of a plain task
    #[arg(long, default_value_t = 0.0)]
    special: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if !(0.0..=1.0).contains(&cli.special) {
        eprintln!("Error: --special ({}) must be within [0.0, 1.0]", cli.special);
        std::process::exit(1);
    }

    println!("Generating a chain workflow with {} task slots...", cli.tasks);

    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    let column_x = 450.0;
    let row = NODE_HEIGHT + NODE_SPACING;
    let mut y = 50.0;

    nodes.push(Node::new("start", NodeType::Start, "Flow start", Point::new(column_x, y)));
    let mut previous = "start".to_string();

    for index in 1..=cli.tasks {
        y += row;
        let id = format!("task_{index}");
        let node = if rng.random_bool(cli.special) {
            match rng.random_range(0..4) {
                0 => Node::new(id.clone(), NodeType::Loop, format!("Loop {index}"), Point::new(column_x, y)),
                1 => Node::new(id.clone(), NodeType::Timer, format!("Timer {index}"), Point::new(column_x, y)),
                2 => Node::new(id.clone(), NodeType::Branch, format!("Branch {index}"), Point::new(column_x, y)),
                _ => Node::new(
                    id.clone(),
                    NodeType::Subprocess,
                    format!("Subprocess {index}"),
                    Point::new(column_x, y),
                ),
            }
            .with_type_defaults()
        } else {
            Node::task(id.clone(), format!("Task {index}"), Point::new(column_x, y))
        };
        nodes.push(node);
        edges.push(
            Edge::new(format!("e{index}"), previous.clone(), id.clone())
                .with_label(format!("Step {index} done")),
        );
        previous = id;
    }

    y += row;
    nodes.push(Node::new("end", NodeType::End, "Flow end", Point::new(column_x, y)));
    edges.push(
        Edge::new(format!("e{}", cli.tasks + 1), previous, "end").with_label("Flow end"),
    );

    let snapshot = WorkflowSnapshot {
        nodes,
        edges,
        viewport_offset: Point::default(),
        zoom_level: 1.0,
    };

    let json_output = serde_json::to_string_pretty(&snapshot)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated {} nodes and {} edges into '{}'",
        snapshot.nodes.len(),
        snapshot.edges.len(),
        cli.output
    );

    Ok(())
}
