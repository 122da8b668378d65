/// Fabric scenario runner - Main entry point
use colored::*;
use fabric_core::{Config, Fabric, Scenario, StepOutcome};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    // Parse configuration
    let args: Vec<String> = env::args().collect();
    let config = Config::from_args(&args)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let scenario = match &config.scenario {
        Some(path) => {
            info!("Loading scenario from {}", path.display());
            Scenario::from_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))?
        }
        None => {
            info!("No scenario given, running built-in demo");
            Scenario::demo()
        }
    };

    let mut fabric = Fabric::new(&config);
    let outcomes = scenario
        .run(&mut fabric)
        .map_err(|e| anyhow::anyhow!("Scenario failed: {}", e))?;

    if config.json_output {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in &outcomes {
            print_outcome(outcome);
        }
    }

    let dead_letters = fabric.take_dead_letters();
    if config.json_output && config.capture_dead_letters {
        println!("{}", serde_json::to_string_pretty(&dead_letters)?);
    } else {
        for letter in &dead_letters {
            println!("{} {}", "dead letter:".red(), letter.message);
        }
    }

    let stats = fabric.stats();
    info!(
        "Done: {} sent, {} delivered, {} dropped ({} unlinked, {} no route)",
        stats.messages_sent,
        stats.delivered,
        stats.total_dropped(),
        stats.discarded_unlinked,
        stats.dropped_no_route
    );

    Ok(())
}

fn print_outcome(outcome: &StepOutcome) {
    let line = outcome.to_string();
    match outcome {
        StepOutcome::Receive { messages, .. } if !messages.is_empty() => {
            println!("{}", line.green())
        }
        StepOutcome::Dispatch { report, .. } if report.dropped > 0 => {
            println!("{}", line.yellow())
        }
        StepOutcome::Send { .. } | StepOutcome::Dispatch { .. } => println!("{}", line),
        _ => println!("{}", line.dimmed()),
    }
}
