//! Headless Battle Runner
//!
//! Loads a scenario, replays a JSON action script through the action
//! engine and prints the resulting summary, snapshot or event log.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use littoral_assault::battle::{Action, ActionEngine, Dice, GameState, Scenario};
use littoral_assault::core::error::Result;

/// Headless Battle Runner - replay an action script against a scenario
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Replay an action script against a scenario and print the outcome")]
struct Args {
    /// Scenario file (.toml or .json)
    scenario: PathBuf,

    /// JSON array of actions to submit in order
    #[arg(long)]
    actions: Option<PathBuf>,

    /// Dice seed; overrides the scenario's seed
    #[arg(long)]
    seed: Option<u64>,

    /// What to print when the script is done
    #[arg(long, value_enum, default_value_t = Output::Summary)]
    output: Output,

    /// Stop at the first rejected action
    #[arg(long)]
    strict: bool,

    /// Log every event as it happens
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Summary,
    Snapshot,
    Events,
    Text,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "littoral_assault=debug" } else { "littoral_assault=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let scenario = Scenario::from_file(&args.scenario)?;
    let seed = args.seed.or(scenario.seed).unwrap_or(0);
    let mut state = scenario.build(Dice::seeded(seed))?;
    tracing::info!(scenario = %scenario.name, seed, "running");

    let actions: Vec<Action> = match &args.actions {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let mut engine = ActionEngine::new();
    let mut rejected = 0usize;
    for (index, action) in actions.iter().enumerate() {
        if state.game_over {
            tracing::info!(remaining = actions.len() - index, "game over; skipping rest of script");
            break;
        }
        let result = engine.execute(&mut state, action)?;
        if !result.success {
            rejected += 1;
            eprintln!("action {} ({}) rejected: {}", index, action.action_type, result.message);
            if args.strict {
                break;
            }
        }
    }

    match args.output {
        Output::Summary => println!("{}", serde_json::to_string_pretty(&state.summary())?),
        Output::Snapshot => println!("{}", serde_json::to_string_pretty(&state.snapshot())?),
        Output::Events => println!("{}", serde_json::to_string_pretty(state.events())?),
        Output::Text => print_text(&state, actions.len(), rejected),
    }
    Ok(())
}

fn print_text(state: &GameState, submitted: usize, rejected: usize) {
    let summary = state.summary();
    println!("Battle Result");
    println!("=============");
    println!("Turn {} / {} phase", summary.turn, summary.phase);
    match summary.outcome {
        Some(outcome) => println!(
            "Winner: {} ({}) by {:?}",
            outcome.winner, outcome.side, outcome.condition
        ),
        None => println!("Winner: undecided"),
    }
    println!("Actions: {} submitted, {} rejected", submitted, rejected);
    println!();
    for player in &summary.players {
        println!(
            "{} [{}]: {}/{} units alive, {} CP, {} objectives",
            player.name,
            player.side,
            player.living_units,
            player.total_units,
            player.command_points,
            player.objectives_secured
        );
        if let Some(ship) = &player.ship {
            println!(
                "  ship hull {}/{}, ammo {}/{}",
                ship.hull, ship.max_hull, ship.ammo, ship.max_ammo
            );
        }
    }
}
